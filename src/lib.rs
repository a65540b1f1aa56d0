//! Browse GitHub repositories and issues through the GraphQL API.
//!
//! The library keeps two pieces of client-side state:
//!
//! - [`Paginator`] accumulates the pages of one cursor-based connection,
//!   deduplicating nodes and discarding fetches that finish after a reset.
//! - [`SharedCache`] holds one record per entity and layers optimistic
//!   updates over it, so [`toggle_star`] can show the new count before
//!   GitHub confirms it and roll back exactly when it does not.
//!
//! [`GraphQLClient`] is the transport; [`github`] adapts it to the
//! [`PageSource`] and [`StarMutator`] seams.
//!
//! ```no_run
//! use lens::{GraphQLClient, IssuesSource, Paginator, RepoRef};
//! # async fn run() -> Result<(), lens::LensError> {
//! let client = GraphQLClient::new("token", None)?;
//! let issues = Paginator::new(IssuesSource::new(&client), 10);
//! issues.start(RepoRef::new("rust-lang", "rust")).await?;
//! while issues.has_more() && issues.len() < 30 {
//!     issues.load_next().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod bool_predicates;
pub mod cache;
pub mod cli_args;
pub mod commands;
pub mod config;
pub mod connection;
pub mod environment;
pub mod error;
pub mod github;
pub mod listeners;
pub mod markup;
pub mod models;
pub mod pagination;
pub mod printer;
pub mod queries;
pub mod repo_ref;
pub mod star;
pub mod test_utils;

pub use api::{ClientConfig, GraphQLClient};
pub use cache::{CacheEntity, CacheEvent, EntityCache, EntityKey, OptimisticToken, SharedCache};
pub use cli_args::{GlobalArgs, IssueArgs, IssuesArgs, RepoArgs, StarArgs};
pub use connection::{Connection, Edge, Keyed, PageInfo};
pub use error::LensError;
pub use github::{CommentsSource, IssuesSource, fetch_issue, fetch_repository};
pub use pagination::{LoadOutcome, PageSource, Paginator, PaginatorEvent, Phase, SkipReason};
pub use repo_ref::{IssueRef, RepoRef, parse_issue, parse_repo};
pub use star::{StarMutator, StarOperation, toggle_star};
