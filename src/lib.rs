//! ghactivity - browse a GitHub user's public activity from the terminal.
//!
//! Results from the GitHub API are cached in a local JSON index, rate-limited
//! requests are retried at a fixed interval, and the event list can be
//! filtered, sorted, truncated, and exported as JSON, CSV, or Markdown.

pub mod activity;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod github;

pub use activity::{ActivityService, ProcessOptions, SortKey, process};
pub use cache::{CacheStore, Lookup};
pub use error::{ActivityError, Result};
pub use export::ExportFormat;
pub use github::{EventKind, EventRecord, GitHubClient, RetryPolicy, UserProfile};
