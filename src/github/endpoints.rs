// GitHub API endpoint functions.
// Typed fetches for a user's profile and single pages of their public events.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ActivityError, Result};

use super::client::{GitHubClient, HttpTransport};
use super::types::{EventRecord, FetchRequest, UserProfile};

/// Ceiling the public events API places on pagination.
pub const MAX_EVENT_PAGES: u32 = 10;

/// Largest `per_page` the API honors; bigger values are silently capped.
pub const MAX_PAGE_SIZE: u32 = 100;

impl<T: HttpTransport> GitHubClient<T> {
    /// Get a user's public profile.
    pub async fn fetch_user(&self, identity: &str) -> Result<UserProfile> {
        let identity = checked_identity(identity)?;
        let body = self
            .get(&format!("/users/{}", identity))
            .await
            .map_err(|e| not_found_as_unknown(e, identity))?;
        parse_body(&body)
    }

    /// Get one page of a user's public events.
    ///
    /// Exactly one retry-governed request is made per call. Aggregating
    /// pages is left to the caller.
    pub async fn fetch_events_page(&self, request: &FetchRequest) -> Result<Vec<EventRecord>> {
        let identity = checked_identity(&request.identity)?;
        let endpoint = format!(
            "/users/{}/events/public?page={}&per_page={}",
            identity, request.page, request.page_size
        );
        let body = self
            .get(&endpoint)
            .await
            .map_err(|e| not_found_as_unknown(e, &request.identity))?;

        let events: Vec<EventRecord> = parse_body(&body)?;
        debug!(
            identity = %request.identity,
            page = request.page,
            count = events.len(),
            "fetched events page"
        );
        Ok(events)
    }
}

/// Logins are ASCII letters, digits, and hyphens. Anything else would
/// change the request path, so it is rejected before a request is made.
fn checked_identity(identity: &str) -> Result<&str> {
    let valid = !identity.is_empty()
        && identity
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(identity)
    } else {
        Err(ActivityError::InvalidIdentity(identity.to_string()))
    }
}

fn parse_body<D: DeserializeOwned>(body: &str) -> Result<D> {
    Ok(serde_json::from_str(body)?)
}

fn not_found_as_unknown(err: ActivityError, identity: &str) -> ActivityError {
    match err {
        ActivityError::RequestFailed { status: 404 } => {
            ActivityError::UnknownIdentity(identity.to_string())
        }
        other => other,
    }
}
