//! GitHub-backed page sources, fetches and mutations.
//!
//! These adapt [`GraphQLClient`] to the [`PageSource`] and [`StarMutator`]
//! seams and translate `null` roots into [`LensError::NotFound`].

use std::borrow::Cow;

use serde_json::json;

use crate::api::GraphQLClient;
use crate::connection::Connection;
use crate::error::{BoxedStr, LensError};
use crate::models::{
    Comment, IssueComments, IssueData, IssueDetail, IssueSummary, IssuesListData, RepoInfoData,
    Repository, StarMutationData, StarState,
};
use crate::pagination::PageSource;
use crate::queries::{
    ADD_STAR_MUTATION, ISSUE_COMMENTS_QUERY, ISSUE_DETAIL_QUERY, ISSUES_LIST_QUERY,
    REMOVE_STAR_MUTATION, REPO_INFO_QUERY,
};
use crate::repo_ref::{IssueRef, RepoRef};
use crate::star::{StarMutator, StarOperation};

/// Issues shown per page unless configured otherwise.
pub const DEFAULT_ISSUES_PAGE_SIZE: u32 = 10;
/// Comments shown per page unless configured otherwise.
pub const DEFAULT_COMMENTS_PAGE_SIZE: u32 = 5;

/// Fetch repository metadata.
///
/// # Errors
///
/// Returns [`LensError::NotFound`] when the repository does not exist or is
/// not visible, and propagates transport errors.
pub async fn fetch_repository(
    client: &GraphQLClient,
    repo: &RepoRef,
) -> Result<Repository, LensError> {
    let data: RepoInfoData = client
        .run_query(
            REPO_INFO_QUERY,
            json!({ "owner": repo.owner, "name": repo.name }),
        )
        .await?;
    data.repository
        .ok_or_else(|| LensError::not_found("repository", repo.to_string()))
}

/// Fetch an issue together with its first `comment_page_size` comments.
///
/// # Errors
///
/// Returns [`LensError::NotFound`] when the repository or issue does not
/// exist, and propagates transport errors.
pub async fn fetch_issue(
    client: &GraphQLClient,
    issue: &IssueRef,
    comment_page_size: u32,
) -> Result<IssueDetail, LensError> {
    let data: IssueData<IssueDetail> = client
        .fetch_page(
            ISSUE_DETAIL_QUERY,
            None,
            json!({
                "owner": issue.repo.owner,
                "name": issue.repo.name,
                "number": issue.number,
                "count": comment_page_size,
            }),
        )
        .await?;
    data.into_issue()
        .ok_or_else(|| LensError::not_found("issue", issue.to_string()))
}

/// Issues of a repository, newest first.
#[derive(Debug, Clone, Copy)]
pub struct IssuesSource<'a> {
    client: &'a GraphQLClient,
}

impl<'a> IssuesSource<'a> {
    #[must_use]
    pub fn new(client: &'a GraphQLClient) -> Self {
        Self { client }
    }
}

impl PageSource for IssuesSource<'_> {
    type Root = RepoRef;
    type Node = IssueSummary;

    async fn fetch_page(
        &self,
        root: &RepoRef,
        after: Option<&str>,
        page_size: u32,
    ) -> Result<Connection<IssueSummary>, LensError> {
        let data: IssuesListData = self
            .client
            .fetch_page(
                ISSUES_LIST_QUERY,
                after.map(Cow::Borrowed),
                json!({ "owner": root.owner, "name": root.name, "count": page_size }),
            )
            .await?;
        data.repository
            .map(|r| r.issues)
            .ok_or_else(|| LensError::not_found("repository", root.to_string()))
    }
}

/// Comments of an issue, most recently updated first.
#[derive(Debug, Clone, Copy)]
pub struct CommentsSource<'a> {
    client: &'a GraphQLClient,
}

impl<'a> CommentsSource<'a> {
    #[must_use]
    pub fn new(client: &'a GraphQLClient) -> Self {
        Self { client }
    }
}

impl PageSource for CommentsSource<'_> {
    type Root = IssueRef;
    type Node = Comment;

    async fn fetch_page(
        &self,
        root: &IssueRef,
        after: Option<&str>,
        page_size: u32,
    ) -> Result<Connection<Comment>, LensError> {
        let data: IssueData<IssueComments> = self
            .client
            .fetch_page(
                ISSUE_COMMENTS_QUERY,
                after.map(Cow::Borrowed),
                json!({
                    "owner": root.repo.owner,
                    "name": root.repo.name,
                    "number": root.number,
                    "count": page_size,
                }),
            )
            .await?;
        data.into_issue()
            .map(|i| i.comments)
            .ok_or_else(|| LensError::not_found("issue", root.to_string()))
    }
}

fn star_document(op: StarOperation) -> &'static str {
    match op {
        StarOperation::AddStar => ADD_STAR_MUTATION,
        StarOperation::RemoveStar => REMOVE_STAR_MUTATION,
    }
}

impl StarMutator for GraphQLClient {
    async fn mutate(&self, op: StarOperation, starrable_id: &str) -> Result<StarState, LensError> {
        let data: StarMutationData = self
            .run_query(
                star_document(op),
                json!({ "input": { "starrableId": starrable_id } }),
            )
            .await?;
        data.into_starrable()
            .ok_or_else(|| LensError::BadResponse(format!("{op} returned no starrable").boxed()))
    }
}
