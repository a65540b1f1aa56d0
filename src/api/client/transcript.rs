//! Transcript logging for GraphQL requests.

use std::io::Write as _;

use serde_json::json;
use tracing::warn;

use super::GraphQLClient;
use super::helpers::{BODY_SNIPPET_LEN, redact_sensitive, snippet};
use super::http::HttpResponse;

impl GraphQLClient {
    /// Append one JSON line describing the exchange, when a transcript is open.
    pub(super) fn log_transcript(
        &self,
        payload: &serde_json::Value,
        operation: &str,
        resp: &HttpResponse,
    ) {
        let Some(t) = &self.transcript else {
            return;
        };
        let mut request = payload.clone();
        redact_sensitive(&mut request);
        let line = json!({
            "operation": operation,
            "status": resp.status,
            "request": request,
            "response": snippet(&resp.body, BODY_SNIPPET_LEN)
        });
        let mut f = match t.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!("failed to lock transcript for op={operation}: {e}");
                return;
            }
        };
        if let Err(e) = writeln!(f, "{line}") {
            warn!("failed to write transcript for op={operation}: {e}");
            return;
        }
        if let Err(e) = f.flush() {
            warn!("failed to flush transcript for op={operation}: {e}");
        }
    }
}
