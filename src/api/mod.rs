//! GraphQL transport for the GitHub API.
//!
//! [`GraphQLClient`] posts queries, maps transport and GraphQL failures onto
//! [`LensError`](crate::LensError) and decodes `data` into caller-chosen
//! types. Requests are never retried here; callers decide whether to try
//! again.

mod client;

pub use client::{ClientConfig, Endpoint, GraphQLClient, Query, Token};
