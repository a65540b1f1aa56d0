//! Helper utilities for GraphQL request handling.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use super::types::{GraphQLError, Token};
use crate::error::{BoxedStr, LensError};

/// Maximum number of characters of a response body kept in errors and
/// transcripts.
pub(super) const BODY_SNIPPET_LEN: usize = 500;
/// Maximum number of characters of a redacted request payload kept in error
/// context.
pub(super) const REQUEST_SNIPPET_LEN: usize = 1024;
/// Maximum number of characters of a decoded value kept in errors.
pub(super) const VALUE_SNIPPET_LEN: usize = 200;

/// Trim `text` to `max` characters, appending `...` when truncated.
pub(super) fn snippet(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out = text.chars().take(max).collect::<String>();
        out.push_str("...");
        out
    }
}

fn is_sensitive(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "token"
            | "authorization"
            | "password"
            | "secret"
            | "access_token"
            | "api_key"
            | "bearer"
            | "auth"
            | "credentials"
    )
}

/// Replace the values of secret-looking keys, at any depth.
pub(super) fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if is_sensitive(k) {
                    *v = Value::String("<redacted>".into());
                } else {
                    redact_sensitive(v);
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}

/// Snippet of the redacted payload for error context.
pub(super) fn payload_snippet(payload: &Value) -> String {
    let mut redacted = payload.clone();
    redact_sensitive(&mut redacted);
    let json = match serde_json::to_string(&redacted) {
        Ok(s) => s,
        Err(e) => {
            warn!("failed to serialise redacted payload: {e}");
            "<failed to serialise payload>".into()
        }
    };
    snippet(&json, REQUEST_SNIPPET_LEN)
}

/// Name of the operation declared by `query`, if any.
pub(super) fn operation_name(query: &str) -> Option<&str> {
    let trimmed = query.trim_start();
    for prefix in ["query", "mutation"] {
        let Some(rest) = trimmed.strip_prefix(prefix) else {
            continue;
        };
        // "queryX" is not an operation keyword.
        if !rest.starts_with(|c: char| c == '{' || c == '(' || c.is_whitespace()) {
            continue;
        }
        return rest
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == '{')
            .next()
            .filter(|s| !s.is_empty());
    }
    None
}

/// Whether every error only reports a missing object.
///
/// GitHub pairs `null` fields in `data` with `NOT_FOUND` errors; those are
/// left for the caller to turn into [`LensError::NotFound`].
pub(super) fn only_not_found(errors: &[GraphQLError]) -> bool {
    !errors.is_empty()
        && errors
            .iter()
            .all(|e| e.kind.as_deref() == Some("NOT_FOUND"))
}

/// Fold GraphQL errors into one [`LensError::ApiErrors`].
pub(super) fn handle_graphql_errors(errors: Vec<GraphQLError>) -> LensError {
    let msg = errors
        .into_iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join(", ");
    LensError::ApiErrors(msg.boxed())
}

/// Standard headers, with a bearer token when one is configured.
pub(super) fn build_headers(token: &Token) -> Result<HeaderMap, LensError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("lens"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    if token.is_empty() {
        warn!("no GitHub token configured; requests are anonymous");
    } else {
        let mut value: HeaderValue = format!("Bearer {}", token.as_str())
            .parse()
            .map_err(|e| LensError::RequestContext {
                context: "parse Authorization header".boxed(),
                source: Box::new(e),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
