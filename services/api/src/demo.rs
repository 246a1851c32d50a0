use crate::infra::{ConsoleService, SeedData, SeedSheet};
use crate::server::build_service;
use accelerator_selection::config::SelectionConfig;
use accelerator_selection::error::AppError;
use accelerator_selection::workflows::selection::{
    AdditionalData, EntityKind, EventId, SelectionServiceError, SelectionStatus, StageBoard,
    StageFilter, StageTab, Submission, SubmissionId, TransitionOutcome, TransitionRequest,
    DEFAULT_DATE_FORMAT,
};
use chrono::{Duration, TimeZone, Utc};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

const DEMO_EVENT: &str = "demo-cohort";
const DEMO_SHEET: &str = "https://docs.google.com/spreadsheets/d/demo-cohort";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Load submissions from a seed file instead of the built-in cohort.
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Event whose submissions are walked through (defaults to the built-in cohort).
    #[arg(long)]
    pub(crate) event: Option<String>,
    /// strftime pattern used for dates in the printed board.
    #[arg(long)]
    pub(crate) date_format: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        seed,
        event,
        date_format,
    } = args;

    let seed = match seed {
        Some(path) => SeedData::from_path(&path)?,
        None => sample_seed(),
    };
    let selection = SelectionConfig {
        entity_kind: EntityKind::company().0,
        date_format: date_format.unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
    };
    let service = build_service(&selection, seed)?;
    let event_id = EventId(event.unwrap_or_else(|| DEMO_EVENT.to_string()));

    println!("Selection console demo for event {event_id}");
    render_board(&service.board(&event_id, &StageFilter::default())?);

    println!("\nSyncing applicant sheet");
    match service.sync_from_sheet(&event_id, DEMO_SHEET) {
        Ok(stats) => println!("- {}", stats.summary()),
        Err(err) => println!("- {err}"),
    }

    let screening = service.list(&event_id, Some(SelectionStatus::Screening))?;
    let mut candidates = screening.iter().map(|s| s.submission_id.clone());
    let Some(first) = candidates.next() else {
        println!("\nNo submissions in screening; nothing to walk through.");
        return Ok(());
    };

    println!("\nInviting {first} to interview");
    walk(
        &service,
        &first,
        TransitionRequest::new(SelectionStatus::Interview),
        "Rust services, React dashboard",
    )?;
    walk(
        &service,
        &first,
        TransitionRequest::new(SelectionStatus::Approved),
        "Strong founding team and early revenue",
    )?;

    if let Some(second) = candidates.next() {
        println!("\nParking {second} while the founders send financials");
        report(service.place_on_hold(&second, Some("Waiting on financials".to_string())));
        report(service.restore_from_hold(&second, None));

        println!("\nRejecting {second}, then reconsidering");
        walk(
            &service,
            &second,
            TransitionRequest::new(SelectionStatus::Rejected),
            "Outside the program thesis",
        )?;
        report(service.restore_from_rejection(&second));
    }

    println!("\nDetail for {first}");
    let detail = service.detail(&first)?;
    println!(
        "- {} | {} | submitted {}",
        detail.startup_name.as_deref().unwrap_or("-"),
        detail.stage.title(),
        detail.submitted_on
    );
    if let Some(tech) = &detail.tech_status {
        println!("  Technology: {tech}");
    }
    for note in &detail.decision_notes {
        println!("  {} note: {}", note.status, note.note);
    }
    for entry in &detail.attributes {
        println!("  {}: {}", entry.key, entry.value);
    }

    println!();
    render_board(&service.board(&event_id, &StageFilter::new(StageTab::Approved))?);
    Ok(())
}

/// Request a transition and, when prompted, answer with `note`.
fn walk(
    service: &ConsoleService,
    id: &SubmissionId,
    request: TransitionRequest,
    note: &str,
) -> Result<(), AppError> {
    match service.request_transition(id, request)? {
        TransitionOutcome::Applied(submission) => {
            println!("- moved to {}", submission.status);
        }
        TransitionOutcome::ReasonRequired(decision) => {
            println!("- {} (pre-filled: {:?})", decision.prompt_label(), decision.default_reason);
            println!("  [{}] {note}", decision.confirm_label());
            report(service.confirm(decision, note));
        }
    }
    Ok(())
}

fn report(result: Result<TransitionOutcome, SelectionServiceError>) {
    match result {
        Ok(TransitionOutcome::Applied(submission)) => {
            println!("- {} is now {}", submission.display_name(), submission.status);
        }
        Ok(TransitionOutcome::ReasonRequired(decision)) => {
            println!("- waiting on a note: {}", decision.prompt_label());
        }
        Err(err) => println!("- {err}"),
    }
}

fn render_board(board: &StageBoard) {
    let counts: Vec<String> = board
        .counts
        .iter()
        .map(|count| format!("{} {}", count.title, count.count))
        .collect();
    println!("{}", counts.join(" | "));
    println!("{} tab: {}", board.stage.title(), board.columns.join(" | "));
    for row in &board.rows {
        let targets: Vec<&str> = row.allowed_targets.iter().map(|t| t.label()).collect();
        println!("  {} -> [{}]", row.cells.join(" | "), targets.join(", "));
    }
}

fn sample_seed() -> SeedData {
    let submissions = vec![
        applicant("demo-1", "Nile Robotics", "Robotics", "Cairo", 0),
        applicant("demo-2", "Delta Pay", "Fintech", "Mansoura", 1),
        applicant("demo-3", "Sinai Solar", "Energy", "Sharm El Sheikh", 2),
    ];
    let sheet_rows = vec![
        applicant("demo-1", "Nile Robotics", "Robotics", "Cairo", 0),
        applicant("demo-2", "Delta Pay", "Fintech", "Mansoura", 1),
        applicant("demo-4", "Luxor Learn", "Edtech", "Luxor", 3),
    ];
    SeedData {
        submissions,
        sheets: vec![SeedSheet {
            url: DEMO_SHEET.to_string(),
            rows: sheet_rows,
        }],
    }
}

fn applicant(id: &str, name: &str, industry: &str, city: &str, offset: i64) -> Submission {
    let submitted_at = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        + Duration::days(offset);

    Submission {
        submission_id: SubmissionId(id.to_string()),
        event_id: EventId(DEMO_EVENT.to_string()),
        entity_kind: EntityKind::company(),
        status: SelectionStatus::Screening,
        startup_name: Some(name.to_string()),
        industry: Some(industry.to_string()),
        location: Some(city.to_string()),
        additional_data: AdditionalData::new()
            .with_attribute("Founded", json!(44927 + offset * 30))
            .with_attribute("Team Size", json!(3 + offset))
            .with_attribute("Website", format!("https://{id}.example")),
        submitted_at,
    }
}
