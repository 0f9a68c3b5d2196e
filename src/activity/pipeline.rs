// Activity pipeline.
// Filters, sorts, and truncates a raw event list, in that order.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{ActivityError, Result};
use crate::github::{EventKind, EventRecord};

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Most recent first.
    Date,
    /// Ascending by event type tag.
    Type,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "type" => Ok(SortKey::Type),
            other => Err(format!("unknown sort key {:?} (expected date or type)", other)),
        }
    }
}

/// Options for [`process`]. Every field is optional; the default passes
/// events through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOptions {
    /// Keep only events of this exact type.
    pub filter_kind: Option<EventKind>,
    /// Keep only events created at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Keep only events created at or before this instant.
    pub to: Option<DateTime<Utc>>,
    pub sort: Option<SortKey>,
    /// Keep at most this many events after filtering and sorting.
    pub limit: Option<usize>,
}

impl ProcessOptions {
    fn has_date_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    fn matches(&self, event: &EventRecord) -> bool {
        if self.filter_kind.as_ref().is_some_and(|kind| event.kind != *kind) {
            return false;
        }

        if !self.has_date_range() {
            return true;
        }

        // Undated events cannot be placed inside a range.
        let Some(created_at) = event.created_at() else {
            return false;
        };
        self.from.is_none_or(|from| created_at >= from) && self.to.is_none_or(|to| created_at <= to)
    }
}

/// Run the pipeline over `events`, returning a new sequence.
pub fn process(events: &[EventRecord], options: &ProcessOptions) -> Vec<EventRecord> {
    let mut selected: Vec<EventRecord> = events
        .iter()
        .filter(|event| options.matches(event))
        .cloned()
        .collect();

    match options.sort {
        Some(SortKey::Date) => {
            selected.sort_by_key(|event| std::cmp::Reverse(sort_instant(event)))
        }
        Some(SortKey::Type) => selected.sort_by(|a, b| a.kind.as_str().cmp(b.kind.as_str())),
        None => {}
    }

    if let Some(limit) = options.limit {
        selected.truncate(limit);
    }

    selected
}

/// Missing or unparsable timestamps sort as the oldest possible instant.
fn sort_instant(event: &EventRecord) -> DateTime<Utc> {
    event.created_at().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse a lower date bound: `YYYY-MM-DD` (start of day, UTC) or RFC 3339.
pub fn parse_from_date(raw: &str) -> Result<DateTime<Utc>> {
    parse_date_bound(raw, NaiveTime::MIN)
}

/// Parse an upper date bound: `YYYY-MM-DD` (end of day, UTC) or RFC 3339.
pub fn parse_to_date(raw: &str) -> Result<DateTime<Utc>> {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    parse_date_bound(raw, end_of_day)
}

fn parse_date_bound(raw: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| ActivityError::InvalidDate(raw.to_string()))
}
