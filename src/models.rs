//! Data structures for GraphQL responses.
//!
//! Field names follow the GraphQL schema (camelCase) in both directions, so
//! a model serialised into the entity cache reads back with the same shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntity, EntityKey, Record, record_from};
use crate::connection::{Connection, Keyed};
use crate::error::LensError;

/// A GraphQL `nodes` list. GitHub may return `null` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> NodeList<T> {
    /// Non-null entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub target: Option<CommitTarget>,
}

/// `... on Commit`; other target types decode with no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTarget {
    #[serde(default)]
    pub history: Option<TotalCount>,
}

/// A mentionable user shown as a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub login: String,
    pub avatar_url: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Six hex digits without the leading `#`.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stargazer_count: u64,
    pub viewer_has_starred: bool,
    pub fork_count: u64,
    #[serde(default)]
    pub refs: Option<TotalCount>,
    #[serde(default)]
    pub default_branch_ref: Option<BranchRef>,
    #[serde(default)]
    pub mentionable_users: NodeList<User>,
}

impl Repository {
    #[must_use]
    pub fn branch_count(&self) -> u64 {
        self.refs.map_or(0, |r| r.total_count)
    }

    /// Commits on the default branch; `0` for empty repositories.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.default_branch_ref
            .as_ref()
            .and_then(|b| b.target.as_ref())
            .and_then(|t| t.history)
            .map_or(0, |h| h.total_count)
    }

    pub fn contributors(&self) -> impl Iterator<Item = &User> {
        self.mentionable_users.iter()
    }

    /// The star fields of this repository as they currently stand.
    #[must_use]
    pub fn star_state(&self) -> StarState {
        StarState {
            id: self.id.clone(),
            stargazer_count: self.stargazer_count,
            viewer_has_starred: self.viewer_has_starred,
        }
    }
}

impl CacheEntity for Repository {
    fn entity_key(&self) -> EntityKey {
        EntityKey::node(&self.id)
    }
}

/// The subset of a starrable that a star mutation changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarState {
    pub id: String,
    pub stargazer_count: u64,
    pub viewer_has_starred: bool,
}

impl CacheEntity for StarState {
    fn entity_key(&self) -> EntityKey {
        EntityKey::node(&self.id)
    }
}

/// One row of the issue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: NodeList<Label>,
}

impl Keyed for IssueSummary {
    type Key = u64;

    fn key(&self) -> u64 {
        self.number
    }
}

impl CacheEntity for IssueSummary {
    fn entity_key(&self) -> EntityKey {
        EntityKey::node(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    /// `None` for deleted ("ghost") accounts.
    #[serde(default)]
    pub author: Option<Author>,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

impl Keyed for Comment {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl CacheEntity for Comment {
    fn entity_key(&self) -> EntityKey {
        EntityKey::node(&self.id)
    }
}

/// A single issue with its first page of comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    pub id: String,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: NodeList<Label>,
    #[serde(default)]
    pub comments: Connection<Comment>,
}

impl CacheEntity for IssueDetail {
    fn entity_key(&self) -> EntityKey {
        EntityKey::node(&self.id)
    }

    /// Comments are cached as entities of their own.
    fn to_record(&self) -> Result<Record, LensError> {
        let mut record = record_from(&self.entity_key(), self)?;
        record.remove("comments");
        Ok(record)
    }
}

#[derive(Debug, Deserialize)]
pub struct RepoInfoData {
    pub repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesListData {
    pub repository: Option<IssuesRepository>,
}

#[derive(Debug, Deserialize)]
pub struct IssuesRepository {
    pub issues: Connection<IssueSummary>,
}

#[derive(Debug, Deserialize)]
pub struct IssueData<T> {
    pub repository: Option<IssueRepository<T>>,
}

#[derive(Debug, Deserialize)]
pub struct IssueRepository<T> {
    pub issue: Option<T>,
}

impl<T> IssueData<T> {
    /// The issue, if both it and its repository exist.
    pub fn into_issue(self) -> Option<T> {
        self.repository.and_then(|r| r.issue)
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueComments {
    pub comments: Connection<Comment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarMutationData {
    #[serde(default)]
    pub add_star: Option<StarPayload>,
    #[serde(default)]
    pub remove_star: Option<StarPayload>,
}

impl StarMutationData {
    pub fn into_starrable(self) -> Option<StarState> {
        self.add_star.or(self.remove_star).and_then(|p| p.starrable)
    }
}

#[derive(Debug, Deserialize)]
pub struct StarPayload {
    pub starrable: Option<StarState>,
}
