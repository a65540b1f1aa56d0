//! GraphQL client implementation and request orchestration.

mod helpers;
mod http;
mod transcript;
mod types;

use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Mutex;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{BoxedStr, LensError};

use self::helpers::{
    BODY_SNIPPET_LEN, VALUE_SNIPPET_LEN, build_headers, handle_graphql_errors, only_not_found,
    operation_name, payload_snippet, snippet,
};
use self::http::HttpResponse;
use self::types::GraphQLResponse;

pub use self::types::{ClientConfig, Endpoint, Query, Token};

/// Client for the GitHub GraphQL API.
///
/// Holds the authentication headers, the target endpoint and an optional
/// transcript that records every exchange for troubleshooting.
pub struct GraphQLClient {
    client: reqwest::Client,
    headers: HeaderMap,
    endpoint: Endpoint,
    transcript: Option<Mutex<BufWriter<File>>>,
    config: ClientConfig,
}

impl GraphQLClient {
    /// Create a client for `GITHUB_GRAPHQL_URL`, or the public endpoint when
    /// that variable is unset.
    ///
    /// # Errors
    ///
    /// Returns a [`LensError`] if the transcript file cannot be created or the
    /// authorization header cannot be built.
    pub fn new(token: impl Into<Token>, transcript: Option<PathBuf>) -> Result<Self, LensError> {
        Self::with_config(token, Endpoint::from_env(), transcript, ClientConfig::default())
    }

    /// Create a client targeting `endpoint`, typically a local test server.
    ///
    /// # Errors
    ///
    /// See [`GraphQLClient::new`].
    pub fn with_endpoint(
        token: impl Into<Token>,
        endpoint: impl Into<Endpoint>,
        transcript: Option<PathBuf>,
    ) -> Result<Self, LensError> {
        Self::with_config(token, endpoint, transcript, ClientConfig::default())
    }

    /// Create a client with explicit transport settings.
    ///
    /// # Errors
    ///
    /// See [`GraphQLClient::new`].
    pub fn with_config(
        token: impl Into<Token>,
        endpoint: impl Into<Endpoint>,
        transcript: Option<PathBuf>,
        config: ClientConfig,
    ) -> Result<Self, LensError> {
        let token = token.into();
        let transcript = transcript
            .map(|p| File::create(p).map(|file| Mutex::new(BufWriter::new(file))))
            .transpose()?;
        let headers = build_headers(&token)?;
        Ok(Self {
            client: reqwest::Client::new(),
            headers,
            endpoint: endpoint.into(),
            transcript,
            config,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Post `payload` and capture the status and body.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::RequestContext`] when the request cannot be sent,
    /// the body cannot be read, or the status is not 2xx.
    async fn execute_single_request(
        &self,
        payload: &Value,
        operation: &str,
    ) -> Result<HttpResponse, LensError> {
        let snip = payload_snippet(payload);
        let make_ctx = |status: Option<u16>| {
            let base = format!("operation {operation}; {snip}");
            match status {
                Some(s) => format!("{base}; status {s}"),
                None => base,
            }
            .boxed()
        };

        let response = self
            .client
            .post(self.endpoint.as_str())
            .headers(self.headers.clone())
            .json(payload)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| LensError::RequestContext {
                context: make_ctx(None),
                source: e.into(),
            })?;
        let status = response.status().as_u16();
        let status_err = response.error_for_status_ref().err();
        let body = response
            .text()
            .await
            .map_err(|e| LensError::RequestContext {
                context: make_ctx(Some(status)),
                source: e.into(),
            })?;
        let resp = HttpResponse { status, body };
        self.log_transcript(payload, operation, &resp);
        if !(200..300).contains(&status) {
            let source: Box<dyn std::error::Error + Send + Sync> = match status_err {
                Some(e) => Box::new(e),
                None => Box::new(std::io::Error::other(format!("unexpected status {status}"))),
            };
            return Err(LensError::RequestContext {
                context: format!(
                    "HTTP status {status} | body snippet: {}",
                    snippet(&resp.body, BODY_SNIPPET_LEN)
                )
                .boxed(),
                source,
            });
        }
        Ok(resp)
    }

    /// Decode a GraphQL envelope and project `data` onto `T`.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::BadResponseSerde`] for undecodable bodies,
    /// [`LensError::ApiErrors`] for GraphQL errors and
    /// [`LensError::EmptyResponse`] when `data` is absent.
    fn process_graphql_response<T>(resp: &HttpResponse, operation: &str) -> Result<T, LensError>
    where
        T: DeserializeOwned,
    {
        let HttpResponse { status, body } = resp;
        let status = *status;
        let envelope: GraphQLResponse<Value> =
            serde_json::from_str(body).map_err(|e| LensError::BadResponseSerde {
                status,
                message: e.to_string().boxed(),
                snippet: snippet(body, BODY_SNIPPET_LEN).boxed(),
            })?;
        if let Some(errs) = envelope.errors {
            if envelope.data.is_none() || !only_not_found(&errs) {
                return Err(handle_graphql_errors(errs));
            }
            debug!(operation, "NOT_FOUND errors left to the caller");
        }
        let Some(value) = envelope.data else {
            return Err(LensError::EmptyResponse {
                status,
                operation: operation.boxed(),
                snippet: snippet(body, BODY_SNIPPET_LEN).boxed(),
            });
        };
        serde_path_to_error::deserialize::<_, T>(&value).map_err(|e| {
            let snip = match serde_json::to_string_pretty(&value) {
                Ok(json) => snippet(&json, VALUE_SNIPPET_LEN),
                Err(e) => {
                    warn!("failed to serialise error snippet: {e}");
                    "<failed to serialise error snippet>".to_string()
                }
            };
            let path = e.path().to_string();
            LensError::BadResponseSerde {
                status,
                message: format!("{} at {path}", e.into_inner()).boxed(),
                snippet: snip.boxed(),
            }
        })
    }

    /// Execute a GraphQL query or mutation.
    ///
    /// # Errors
    ///
    /// Returns a [`LensError`] if the request fails or the response cannot be
    /// decoded into `T`.
    pub async fn run_query<V, T>(&self, query: impl Into<Query>, variables: V) -> Result<T, LensError>
    where
        V: serde::Serialize,
        T: DeserializeOwned,
    {
        let query = query.into();
        let op_name = operation_name(query.as_str());
        let operation = op_name.map_or_else(|| snippet(query.as_str(), 64), str::to_string);
        let mut payload = json!({ "query": query.as_str(), "variables": &variables });
        if let (Some(_), Some(obj)) = (op_name, payload.as_object_mut()) {
            obj.insert("operationName".into(), json!(operation));
        }
        debug!(%operation, "sending GraphQL request");
        let resp = self.execute_single_request(&payload, &operation).await?;
        Self::process_graphql_response(&resp, &operation)
    }

    /// Execute a paginated query, merging `cursor` into `variables`.
    ///
    /// An existing `cursor` key in `variables` is overwritten; with no cursor
    /// the key is left untouched, so queries declare `$cursor` as nullable.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::BadResponse`] when `variables` is not a JSON
    /// object, or propagates any error from [`run_query`](Self::run_query).
    ///
    /// # Examples
    /// ```no_run
    /// use serde_json::{Value, json};
    /// use lens::api::GraphQLClient;
    /// # async fn run(client: GraphQLClient) -> Result<(), lens::LensError> {
    /// let data: Value = client
    ///     .fetch_page("query Q($cursor: String) { x }", Some("abc".into()), json!({}))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_page<T, V>(
        &self,
        query: impl Into<Query>,
        cursor: Option<Cow<'_, str>>,
        variables: V,
    ) -> Result<T, LensError>
    where
        V: serde::Serialize,
        T: DeserializeOwned,
    {
        let mut variables = serde_json::to_value(variables).map_err(|e| {
            LensError::BadResponse(format!("serialising fetch_page variables: {e}").boxed())
        })?;
        let obj = variables.as_object_mut().ok_or_else(|| {
            LensError::BadResponse("variables for fetch_page must be a JSON object".boxed())
        })?;
        if let Some(c) = cursor {
            obj.insert("cursor".into(), Value::String(c.into_owned()));
        }
        self.run_query(query, variables).await
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("endpoint", &self.endpoint)
            .field("transcript", &self.transcript.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
