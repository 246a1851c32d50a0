use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::selection::domain::{EntityKind, SelectionStatus};
use crate::workflows::selection::repository::SyncStats;
use crate::workflows::selection::router::{
    detail_handler, hold_handler, transition_handler, ReasonBody,
};
use crate::workflows::selection::transitions::TransitionRequest;
use crate::workflows::selection::{selection_router, SelectionService};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

#[tokio::test]
async fn board_route_filters_by_stage_and_search() {
    let router = router_with(pipeline());

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/events/{EVENT}/submissions?stage=screening&search=pay"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage"], json!("screening"));
    assert_eq!(payload["rows"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["rows"][0]["submission_id"], json!("sub-2"));
    assert_eq!(
        payload["rows"][0]["allowed_targets"],
        json!(["interview", "holding", "rejected"])
    );
    assert_eq!(payload["counts"][0]["count"], json!(2));
}

#[tokio::test]
async fn transition_route_asks_for_reason_first() {
    let router = router_with(vec![screening("sub-1")]);

    let response = router
        .oneshot(post_json(
            "/api/v1/submissions/sub-1/transitions",
            json!({ "target": "interview" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], json!("reason_required"));
    assert_eq!(payload["current_status"], json!("screening"));
    assert_eq!(payload["prompt"], json!("Company Technology Status/Notes"));
    assert_eq!(payload["confirm_label"], json!("Proceed to Interview"));
}

#[tokio::test]
async fn transition_route_applies_answered_requests() {
    let router = router_with(vec![screening("sub-1")]);

    let response = router
        .oneshot(post_json(
            "/api/v1/submissions/sub-1/transitions",
            json!({ "target": "rejected", "reason": "Outside program scope" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["outcome"], json!("applied"));
    assert_eq!(payload["submission"]["status"], json!("rejected"));
    assert_eq!(
        payload["submission"]["additional_data"]["rejected_reason"],
        json!("Outside program scope")
    );
    assert_eq!(payload["allowed_targets"], json!(["screening"]));
}

#[tokio::test]
async fn transition_handler_rejects_illegal_moves() {
    let (service, _, _) = build_service(vec![screening("sub-1")]);

    let response = transition_handler::<MemoryStore, MemoryImports, MemoryNotifications>(
        State(Arc::new(service)),
        Path("sub-1".to_string()),
        axum::Json(TransitionRequest::new(SelectionStatus::Approved)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("cannot move submission from screening to approved")
    );
}

#[tokio::test]
async fn transition_route_rejects_forged_hold_origin() {
    let (service, store, _) = build_service(vec![screening("sub-1")]);
    let router = selection_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/v1/submissions/sub-1/transitions",
            json!({
                "target": "holding",
                "reason": "Parked",
                "additional_data": { "origin_stage": "displayed" }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("cannot record displayed as the hold origin of a screening submission moving to holding")
    );
    let stored = store.stored("sub-1");
    assert_eq!(stored.status, SelectionStatus::Screening);
    assert_eq!(stored.additional_data.origin_stage(), None);
}

#[tokio::test]
async fn transition_handler_returns_internal_error_on_store_failure() {
    let service = Arc::new(SelectionService::new(
        Arc::new(ReadOnlyStore::new(vec![screening("sub-1")])),
        Arc::new(MemoryImports::default()),
        Arc::new(MemoryNotifications::default()),
        EntityKind::company(),
    ));

    let response = transition_handler::<ReadOnlyStore, MemoryImports, MemoryNotifications>(
        State(service),
        Path("sub-1".to_string()),
        axum::Json(TransitionRequest::new(SelectionStatus::Holding).with_reason("Paused")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn detail_handler_returns_not_found() {
    let (service, _, _) = build_service(Vec::new());

    let response = detail_handler::<MemoryStore, MemoryImports, MemoryNotifications>(
        State(Arc::new(service)),
        Path("ghost".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hold_then_restore_round_trip() {
    let (service, store, _) = build_service(vec![screening("sub-1")]);
    let service = Arc::new(service);

    let held = hold_handler::<MemoryStore, MemoryImports, MemoryNotifications>(
        State(service.clone()),
        Path("sub-1".to_string()),
        axum::Json(ReasonBody {
            reason: Some("Founder unreachable".to_string()),
        }),
    )
    .await;
    assert_eq!(held.status(), StatusCode::OK);
    assert_eq!(store.stored("sub-1").status, SelectionStatus::Holding);
    assert_eq!(store.stored("sub-1").origin_stage(), SelectionStatus::Screening);

    let router = selection_router(service);
    let restored = router
        .oneshot(post_json("/api/v1/submissions/sub-1/restore", json!({})))
        .await
        .expect("route executes");
    assert_eq!(restored.status(), StatusCode::OK);
    let payload = read_json_body(restored).await;
    assert_eq!(payload["submission"]["status"], json!("screening"));
    assert_eq!(
        payload["submission"]["additional_data"]["holding_reason"],
        json!("Founder unreachable")
    );
}

#[tokio::test]
async fn restore_route_reconsiders_rejected_submissions() {
    let mut rejected = screening("sub-1");
    rejected.status = SelectionStatus::Rejected;
    let router = router_with(vec![rejected]);

    let response = router
        .oneshot(post_json("/api/v1/submissions/sub-1/restore", json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["submission"]["status"], json!("screening"));
}

#[tokio::test]
async fn sync_route_reports_stats_and_validates_url() {
    let url = "https://docs.google.com/spreadsheets/d/cohort-7";
    let service = Arc::new(SelectionService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryImports::default().with_sheet(
            url,
            SyncStats {
                inserted: 2,
                deleted: 0,
            },
        )),
        Arc::new(MemoryNotifications::default()),
        EntityKind::company(),
    ));
    let router = selection_router(service);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/events/{EVENT}/sync"),
            json!({ "sheet_url": url }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["inserted"], json!(2));
    assert_eq!(payload["message"], json!("Sync complete: Added 2, Removed 0"));

    let missing = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/events/{EVENT}/sync"),
            json!({ "sheet_url": "" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let unknown = router
        .oneshot(post_json(
            &format!("/api/v1/events/{EVENT}/sync"),
            json!({ "sheet_url": "https://example.com/private" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(unknown.status(), StatusCode::BAD_GATEWAY);
}
