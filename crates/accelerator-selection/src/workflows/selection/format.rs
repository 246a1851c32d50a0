use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt::Write;

/// Shown for missing or blank values.
pub const EMPTY_PLACEHOLDER: &str = "-";
/// Month/day/year without zero padding.
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

// Serial numbers in this open range are treated as spreadsheet dates.
const SERIAL_DATE_MIN: f64 = 40_000.0;
const SERIAL_DATE_MAX: f64 = 60_000.0;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Renders submission values for display. Swap the implementation to change how dates are
/// detected without touching the views.
pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: &Value) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a usable date format")]
pub struct InvalidDateFormat(pub String);

/// Best-effort formatter for values that came out of a spreadsheet.
///
/// Numbers in the serial-date range and date-looking strings are rendered as dates. The
/// detection is a heuristic and will occasionally misread plain numbers or codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetFormatter {
    date_format: String,
}

impl SpreadsheetFormatter {
    pub fn new(date_format: impl Into<String>) -> Result<Self, InvalidDateFormat> {
        let date_format = date_format.into();
        if !is_valid_date_format(&date_format) {
            return Err(InvalidDateFormat(date_format));
        }
        Ok(Self { date_format })
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Falls back to [`DEFAULT_DATE_FORMAT`] when the pattern cannot render a bare date.
    pub fn format_date(&self, date: NaiveDate) -> String {
        render_date(date, &self.date_format)
            .or_else(|| render_date(date, DEFAULT_DATE_FORMAT))
            .unwrap_or_else(|| date.to_string())
    }

    fn format_text(&self, text: &str) -> String {
        if text.is_empty() {
            return EMPTY_PLACEHOLDER.to_string();
        }
        let looks_like_date = text.contains(['-', '/', ':']);
        match parse_date_text(text).filter(|_| looks_like_date) {
            Some(date) => self.format_date(date),
            None => text.to_string(),
        }
    }
}

impl Default for SpreadsheetFormatter {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ValueFormatter for SpreadsheetFormatter {
    fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => EMPTY_PLACEHOLDER.to_string(),
            Value::String(text) => self.format_text(text),
            Value::Number(number) => match number.as_f64().and_then(serial_date) {
                Some(date) => self.format_date(date),
                None => number.to_string(),
            },
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => value.to_string(),
        }
    }
}

/// Format with the default spreadsheet heuristics.
pub fn format_value(value: &Value) -> String {
    SpreadsheetFormatter::default().format(value)
}

/// Interpret `value` as a spreadsheet serial date (days since 1899-12-30).
pub fn serial_date(value: f64) -> Option<NaiveDate> {
    if !(value > SERIAL_DATE_MIN && value < SERIAL_DATE_MAX) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(value.floor() as i64))
}

/// A pattern is usable when it parses and renders a calendar date. Time and offset fields
/// such as `%H` or `%z` parse fine but have nothing to render for a `NaiveDate`.
pub fn is_valid_date_format(pattern: &str) -> bool {
    if pattern.trim().is_empty()
        || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
    {
        return false;
    }
    NaiveDate::from_ymd_opt(2000, 1, 1).is_some_and(|date| render_date(date, pattern).is_some())
}

fn render_date(date: NaiveDate, pattern: &str) -> Option<String> {
    let mut rendered = String::new();
    write!(
        rendered,
        "{}",
        date.format_with_items(StrftimeItems::new(pattern))
    )
    .ok()?;
    Some(rendered)
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for pattern in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(trimmed, pattern).ok())
}
