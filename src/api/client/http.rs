//! Raw HTTP response captured before GraphQL decoding.

#[derive(Debug)]
pub(super) struct HttpResponse {
    pub(super) status: u16,
    pub(super) body: String,
}
