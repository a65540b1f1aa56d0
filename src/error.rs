//! Error type shared by the library and the `lens` binary.
//!
//! Payload strings are stored as `Box<str>` so the enum stays small enough
//! to move through `Result` cheaply; [`BoxedStr`] keeps the conversions terse.

use std::borrow::Cow;

use thiserror::Error;

/// Errors raised while talking to GitHub or maintaining client-side state.
#[derive(Error, Debug)]
pub enum LensError {
    /// The requested root entity does not exist. Terminal; never retried.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: Box<str> },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request failed when running {context}: {source}")]
    RequestContext {
        context: Box<str>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid reference: {0}")]
    InvalidRef(Box<str>),
    #[error("bad response: {0}")]
    BadResponse(Box<str>),
    #[error("malformed response (status {status}): {message} | snippet: {snippet}")]
    BadResponseSerde {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error("empty response for {operation} (status {status}): {snippet}")]
    EmptyResponse {
        status: u16,
        operation: Box<str>,
        snippet: Box<str>,
    },
    #[error("API errors: {0}")]
    ApiErrors(Box<str>),
    #[error("no root selected; reset the connection before loading pages")]
    NoRoot,
    #[error("connection for {0} already holds its first page")]
    AlreadyInitialized(Box<str>),
    #[error("unknown optimistic update #{0}")]
    UnknownOptimisticUpdate(u64),
    #[error("cache record {key} is unusable: {message}")]
    CacheRecord { key: Box<str>, message: Box<str> },
    #[error("io error: {0}")]
    Io(#[from] Box<std::io::Error>),
    #[error("configuration error: {0}")]
    Config(#[from] ortho_config::OrthoError),
    #[error("configuration error: {0}")]
    ConfigFile(#[from] Box<figment::Error>),
}

impl LensError {
    /// Build a [`LensError::NotFound`] for an entity of `kind`.
    pub fn not_found(kind: &'static str, key: impl BoxedStr) -> Self {
        Self::NotFound {
            kind,
            key: key.boxed(),
        }
    }

    /// Whether this error is a transient transport failure.
    ///
    /// These are surfaced to the caller, who may retry by re-invoking the
    /// operation; nothing in the library retries on its own.
    #[must_use]
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::RequestContext { .. } | Self::EmptyResponse { .. }
        )
    }
}

impl From<std::io::Error> for LensError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Box::new(err))
    }
}

/// Extension trait to convert string-like values into `Box<str>`.
pub trait BoxedStr {
    fn boxed(self) -> Box<str>;
}

impl BoxedStr for String {
    fn boxed(self) -> Box<str> {
        self.into_boxed_str()
    }
}

impl BoxedStr for &str {
    fn boxed(self) -> Box<str> {
        self.into()
    }
}

impl BoxedStr for &String {
    fn boxed(self) -> Box<str> {
        self.as_str().into()
    }
}

impl BoxedStr for Cow<'_, str> {
    fn boxed(self) -> Box<str> {
        match self {
            Cow::Borrowed(s) => s.into(),
            Cow::Owned(s) => s.into_boxed_str(),
        }
    }
}
