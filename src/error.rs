// Error types for ghactivity.
// Covers transport failures, non-success statuses, parse errors, and export errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status code {status}")]
    RequestFailed { status: u16 },

    #[error("JSON parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown GitHub user: {0}")]
    UnknownIdentity(String),

    #[error("Invalid GitHub username {0:?}: only letters, digits, and hyphens are allowed")]
    InvalidIdentity(String),

    /// Only raised inside the cache store, which recovers from it.
    #[error("Cache index is corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActivityError {
    /// Status code of the failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ActivityError::RequestFailed { status } => Some(*status),
            ActivityError::UnknownIdentity(_) => Some(404),
            _ => None,
        }
    }

    /// Whether retries were exhausted against the rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ActivityError::RequestFailed { status: 403 })
    }

    /// Human-readable line shown to the user for a failed lookup.
    pub fn user_message(&self, identity: &str) -> String {
        match self {
            ActivityError::UnknownIdentity(_) => {
                format!("The username \"{}\" does not exist on GitHub.", identity)
            }
            ActivityError::Network(_) => {
                "Unable to connect to GitHub. Please check your internet connection.".to_string()
            }
            err if err.is_rate_limited() => {
                "GitHub rate limit exceeded. Please wait a few minutes and try again.".to_string()
            }
            err => err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ActivityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_unknown_identity() {
        let err = ActivityError::UnknownIdentity("ghost".to_string());
        assert_eq!(
            err.user_message("ghost"),
            "The username \"ghost\" does not exist on GitHub."
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_user_message_for_network_error() {
        let err = ActivityError::Network("dns failure".to_string());
        assert!(err.user_message("octocat").contains("internet connection"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_rate_limit_classification() {
        let err = ActivityError::RequestFailed { status: 403 };
        assert!(err.is_rate_limited());
        assert!(err.user_message("octocat").contains("rate limit"));

        let err = ActivityError::RequestFailed { status: 500 };
        assert!(!err.is_rate_limited());
        assert_eq!(
            err.user_message("octocat"),
            "Request failed with status code 500"
        );
    }

    #[test]
    fn test_user_message_for_invalid_identity() {
        let err = ActivityError::InvalidIdentity("a/b".to_string());
        assert!(err.user_message("a/b").starts_with("Invalid GitHub username \"a/b\""));
        assert_eq!(err.status(), None);
    }
}
