// Event text formatting.
// One-line descriptions per event kind and relative "time ago" strings.

use chrono::{DateTime, Utc};

use crate::github::{EventKind, EventRecord};

/// Short human description of an event, with an emoji prefix.
pub fn describe(event: &EventRecord) -> String {
    match &event.kind {
        EventKind::Push => format!("🚀 Pushed {} commits", event.commit_count()),
        EventKind::Issues => "🐛 Opened an issue".to_string(),
        EventKind::IssueComment => "💬 Commented on an issue".to_string(),
        EventKind::Watch => "⭐ Starred".to_string(),
        EventKind::PullRequest => "🔀 Created a pull request".to_string(),
        EventKind::PullRequestReview => "📝 Reviewed a pull request".to_string(),
        EventKind::PullRequestReviewComment => {
            "📝 Commented on a pull request review".to_string()
        }
        EventKind::Fork => "🍴 Forked".to_string(),
        EventKind::Create => "✨ Created".to_string(),
        EventKind::Delete => "🗑️ Deleted".to_string(),
        EventKind::Release => "📦 Published a release".to_string(),
        EventKind::Public => "🌍 Made public".to_string(),
        EventKind::Member => "👥 Added a collaborator".to_string(),
        EventKind::Gollum => "📖 Edited the wiki".to_string(),
        EventKind::CommitComment => "💬 Commented on a commit".to_string(),
        EventKind::Unknown(tag) => format!("📌 Performed {}", tag),
    }
}

/// Relative age of `timestamp` as of `now`, e.g. "3 hours ago".
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds().max(0);

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else {
        format!("{} days ago", seconds / 86400)
    }
}

/// Relative age of an event, or "unknown time" when undated.
pub fn event_age(event: &EventRecord, now: DateTime<Utc>) -> String {
    event
        .created_at()
        .map(|created_at| time_ago(created_at, now))
        .unwrap_or_else(|| "unknown time".to_string())
}
