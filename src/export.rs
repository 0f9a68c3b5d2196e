// Export of processed activity lists.
// Renders events as JSON, CSV, or Markdown and writes them next to the caller.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::display::format::{describe, event_age};
use crate::error::{ActivityError, Result};
use crate::github::EventRecord;

const CSV_HEADER: &str = "Event Type, Repository, Details, Timestamp";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    /// File extension, also the name used on the command line.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }

    /// Artifact file name, e.g. `activities.csv`.
    pub fn file_name(&self) -> String {
        format!("activities.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(ActivityError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Render `events` in `format`. Relative times are computed against `now`.
///
/// CSV fields are joined with ", " and never quoted, so values containing
/// commas are not escaped.
pub fn render(
    events: &[EventRecord],
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<String> {
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(events)?,
        ExportFormat::Csv => {
            let mut lines = Vec::with_capacity(events.len() + 1);
            lines.push(CSV_HEADER.to_string());
            lines.extend(events.iter().map(|event| {
                format!(
                    "{}, {}, {}, {}",
                    event.kind,
                    event.repository_name(),
                    describe(event),
                    event_age(event, now)
                )
            }));
            lines.join("\n")
        }
        ExportFormat::Markdown => events
            .iter()
            .map(|event| {
                format!(
                    "- **{}**: {} in `{}` ({})",
                    event.kind,
                    describe(event),
                    event.repository_name(),
                    event_age(event, now)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(content)
}

/// Write `events` to `<dir>/activities.<ext>`, replacing any previous export.
pub fn export_to_dir(
    events: &[EventRecord],
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let content = render(events, format, Utc::now())?;

    fs::create_dir_all(dir)?;
    let path = dir.join(format.file_name());
    fs::write(&path, content)?;

    info!(path = %path.display(), count = events.len(), %format, "exported activities");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-03T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn events() -> Vec<EventRecord> {
        vec![
            EventRecord::new("PushEvent", "octocat/hello", "2024-05-03T11:00:00Z")
                .with_payload(json!({"commits": [{"message": "x"}]})),
            EventRecord::new("WatchEvent", "octocat/world", "2024-05-01T12:00:00Z"),
        ]
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ActivityError::UnsupportedFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_render_csv() {
        let csv = render(&events(), ExportFormat::Csv, now()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Event Type, Repository, Details, Timestamp");
        assert_eq!(
            lines[1],
            "PushEvent, octocat/hello, 🚀 Pushed 1 commits, 1 hours ago"
        );
        assert_eq!(lines[2], "WatchEvent, octocat/world, ⭐ Starred, 2 days ago");
    }

    #[test]
    fn test_render_markdown() {
        let md = render(&events(), ExportFormat::Markdown, now()).unwrap();
        assert_eq!(
            md.lines().next().unwrap(),
            "- **PushEvent**: 🚀 Pushed 1 commits in `octocat/hello` (1 hours ago)"
        );
        assert_eq!(md.lines().count(), 2);
    }

    #[test]
    fn test_render_json_is_lossless_and_stable() {
        let events = events();
        let first = render(&events, ExportFormat::Json, now()).unwrap();
        let second = render(&events, ExportFormat::Json, Utc::now()).unwrap();
        assert_eq!(first, second);

        let parsed: Vec<EventRecord> = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, events);
    }

    #[test]
    fn test_render_json_keeps_sparse_records_verbatim() {
        let raw = json!([
            {"type": "WatchEvent", "repo": {"name": "a/b"}, "created_at": null},
            {"type": "ForkEvent", "repo": {"name": "a/c"}},
            {"type": "PushEvent", "repo": {"name": "a/d"}, "payload": null, "id": "9"}
        ]);
        let events: Vec<EventRecord> = serde_json::from_value(raw.clone()).unwrap();

        let json = render(&events, ExportFormat::Json, now()).unwrap();
        let exported: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(exported, raw);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], ExportFormat::Json, now()).unwrap(), "[]");
        assert_eq!(
            render(&[], ExportFormat::Csv, now()).unwrap(),
            "Event Type, Repository, Details, Timestamp"
        );
        assert_eq!(render(&[], ExportFormat::Markdown, now()).unwrap(), "");
    }

    #[test]
    fn test_export_to_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = export_to_dir(&events(), ExportFormat::Json, temp_dir.path()).unwrap();

        assert_eq!(path, temp_dir.path().join("activities.json"));
        let written = fs::read_to_string(&path).unwrap();
        let again = export_to_dir(&events(), ExportFormat::Json, temp_dir.path()).unwrap();
        assert_eq!(fs::read_to_string(again).unwrap(), written);
    }
}
