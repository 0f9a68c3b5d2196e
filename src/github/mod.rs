// GitHub API module.
// Provides the client, retry policy, and types for the public events API.

pub mod client;
pub mod endpoints;
pub mod retry;
pub mod types;

pub use client::{GitHubClient, HttpTransport, RawResponse, ReqwestTransport};
pub use endpoints::{MAX_EVENT_PAGES, MAX_PAGE_SIZE};
pub use retry::{RetryPolicy, RetryState};
pub use types::*;
