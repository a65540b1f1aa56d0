//! Relay-style connection types shared by every paginated query.
//!
//! GitHub exposes paginated relationships as
//! `{ edges { cursor node { .. } } pageInfo { hasNextPage endCursor } }`.
//! These types mirror that shape so responses deserialise straight into them.

use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{BoxedStr, LensError};

/// Stable identity of an entity within a connection.
///
/// Two nodes with the same key describe the same logical entity, whichever
/// page they arrived on.
pub trait Keyed {
    type Key: Eq + Hash + Clone + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

/// Pagination metadata returned alongside each page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// The cursor to request the following page with, if any.
    ///
    /// `endCursor` only matters while `hasNextPage` is set, so a stray cursor
    /// on the last page is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::BadResponse`] when the server claims another page
    /// exists but provides no cursor to reach it.
    pub fn next_cursor(&self) -> Result<Option<&str>, LensError> {
        match (self.has_next_page, self.end_cursor.as_deref()) {
            (false, _) => Ok(None),
            (true, Some(cursor)) => Ok(Some(cursor)),
            (true, None) => Err(LensError::BadResponse(
                "pageInfo reported hasNextPage=true without an endCursor".boxed(),
            )),
        }
    }

    /// Page info for a connection with nothing left to fetch.
    #[must_use]
    pub fn exhausted() -> Self {
        Self::default()
    }
}

/// One node together with its position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Edge<N> {
    pub cursor: String,
    pub node: N,
}

impl<N> Edge<N> {
    pub fn new(cursor: impl Into<String>, node: N) -> Self {
        Self {
            cursor: cursor.into(),
            node,
        }
    }
}

/// A single page of a paginated relationship.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<N>>,
    pub page_info: PageInfo,
}

impl<N> Connection<N> {
    pub fn new(edges: Vec<Edge<N>>, page_info: PageInfo) -> Self {
        Self { edges, page_info }
    }

    /// Iterate over the nodes of this page in server order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges.iter().map(|edge| &edge.node)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<N> Default for Connection<N> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::exhausted(),
        }
    }
}
