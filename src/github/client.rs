// GitHub API HTTP client.
// Wraps an HTTP transport with the fixed request headers and the retry policy.

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{ActivityError, Result};

use super::retry::RetryPolicy;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = "github-activity-cli";

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues a single GET request. Transport failures map to
/// `ActivityError::Network`; any HTTP status is a successful exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

/// Transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ActivityError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ActivityError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ActivityError::Network(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

/// GitHub API client with a pluggable transport and retry policy.
pub struct GitHubClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    base_url: String,
    retry: RetryPolicy,
}

impl GitHubClient<ReqwestTransport> {
    /// Create a client for the public GitHub API.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> GitHubClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            base_url: GITHUB_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Point the client at another API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build an absolute URL for an API path.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// GET an endpoint under the retry policy, returning the body.
    pub async fn get(&self, endpoint: &str) -> Result<String> {
        let url = self.url(endpoint);
        self.retry.fetch(&self.transport, &url).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;

    #[test]
    fn test_url_building() {
        let client = GitHubClient::with_transport(ScriptedTransport::new())
            .with_base_url("http://localhost:8080/");
        assert_eq!(client.url("/users/octocat"), "http://localhost:8080/users/octocat");

        let client = GitHubClient::with_transport(ScriptedTransport::new());
        assert_eq!(client.url("/users/octocat"), "https://api.github.com/users/octocat");
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let client =
            GitHubClient::with_transport(ScriptedTransport::new().respond(200, "{\"ok\":true}"));
        let body = client.get("/users/octocat").await.unwrap();
        assert_eq!(body, "{\"ok\":true}");
        assert_eq!(
            client.transport().requests(),
            vec!["https://api.github.com/users/octocat".to_string()]
        );
    }
}
