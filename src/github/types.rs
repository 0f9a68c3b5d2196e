// GitHub API response types.
// Defines the event records and user profile returned by the public events API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type tag. Unrecognized tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Push,
    Issues,
    IssueComment,
    Watch,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Fork,
    Create,
    Delete,
    Release,
    Public,
    Member,
    Gollum,
    CommitComment,
    Unknown(String),
}

impl EventKind {
    /// The tag string as sent by the API.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Push => "PushEvent",
            EventKind::Issues => "IssuesEvent",
            EventKind::IssueComment => "IssueCommentEvent",
            EventKind::Watch => "WatchEvent",
            EventKind::PullRequest => "PullRequestEvent",
            EventKind::PullRequestReview => "PullRequestReviewEvent",
            EventKind::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            EventKind::Fork => "ForkEvent",
            EventKind::Create => "CreateEvent",
            EventKind::Delete => "DeleteEvent",
            EventKind::Release => "ReleaseEvent",
            EventKind::Public => "PublicEvent",
            EventKind::Member => "MemberEvent",
            EventKind::Gollum => "GollumEvent",
            EventKind::CommitComment => "CommitCommentEvent",
            EventKind::Unknown(tag) => tag,
        }
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "PushEvent" => EventKind::Push,
            "IssuesEvent" => EventKind::Issues,
            "IssueCommentEvent" => EventKind::IssueComment,
            "WatchEvent" => EventKind::Watch,
            "PullRequestEvent" => EventKind::PullRequest,
            "PullRequestReviewEvent" => EventKind::PullRequestReview,
            "PullRequestReviewCommentEvent" => EventKind::PullRequestReviewComment,
            "ForkEvent" => EventKind::Fork,
            "CreateEvent" => EventKind::Create,
            "DeleteEvent" => EventKind::Delete,
            "ReleaseEvent" => EventKind::Release,
            "PublicEvent" => EventKind::Public,
            "MemberEvent" => EventKind::Member,
            "GollumEvent" => EventKind::Gollum,
            "CommitCommentEvent" => EventKind::CommitComment,
            _ => EventKind::Unknown(tag),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        EventKind::from(tag.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository an event happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRef {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A public event record. Only the tag and repository are typed; every
/// other field, `created_at` and `payload` included, stays in `extra`
/// exactly as received so records serialize back to the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub repo: RepoRef,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    pub fn new(kind: impl Into<EventKind>, repo: &str, created_at: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("created_at".to_string(), Value::from(created_at));
        Self {
            kind: kind.into(),
            repo: RepoRef {
                name: repo.to_string(),
                extra: Map::new(),
            },
            extra,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.extra.insert("payload".to_string(), payload);
        self
    }

    pub fn repository_name(&self) -> &str {
        &self.repo.name
    }

    /// Raw `created_at` string; `None` if missing, null, or not a string.
    pub fn created_at_raw(&self) -> Option<&str> {
        self.extra.get("created_at").and_then(Value::as_str)
    }

    /// Parsed `created_at`, or `None` if missing or unparsable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn payload(&self) -> Option<&Value> {
        self.extra.get("payload")
    }

    /// Number of commits in a push, from the payload.
    pub fn commit_count(&self) -> u64 {
        let Some(payload) = self.payload() else {
            return 0;
        };
        if let Some(commits) = payload.get("commits").and_then(Value::as_array) {
            return commits.len() as u64;
        }
        payload.get("size").and_then(Value::as_u64).unwrap_or(0)
    }
}

/// Public profile of a GitHub user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub login: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
}

/// One page of a user's public events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub identity: String,
    pub page: u32,
    pub page_size: u32,
}

impl FetchRequest {
    pub fn new(identity: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            identity: identity.into(),
            page,
            page_size,
        }
    }

    /// The request for the following page.
    pub fn next_page(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            page: self.page + 1,
            page_size: self.page_size,
        }
    }
}
