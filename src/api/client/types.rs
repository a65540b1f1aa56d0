//! Types used by the GraphQL client.

use serde::Deserialize;
use std::time::Duration;

/// A GraphQL document.
#[derive(Debug, Clone)]
pub struct Query(String);

impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A GitHub API token. Empty means anonymous.
#[derive(Clone, Default)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_empty() { "Token(<none>)" } else { "Token(<redacted>)" })
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A GitHub GraphQL API endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// `GITHUB_GRAPHQL_URL` when set and non-empty, else the public endpoint.
    #[must_use]
    pub fn from_env() -> Self {
        crate::environment::var("GITHUB_GRAPHQL_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(Self)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for Endpoint {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self(GITHUB_GRAPHQL_URL.to_string())
    }
}

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Per-client transport settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout applied to each HTTP call.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphQLResponse<T> {
    pub(super) data: Option<T>,
    pub(super) errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphQLError {
    pub(super) message: String,
    #[serde(default, rename = "type")]
    pub(super) kind: Option<String>,
}
