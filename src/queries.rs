//! GraphQL documents sent to the GitHub API.
//!
//! Paginated documents take a nullable `$cursor` and a `$count` page size so
//! [`GraphQLClient::fetch_page`](crate::api::GraphQLClient::fetch_page) can
//! drive them.

pub const REPO_INFO_QUERY: &str = r#"
    query RepoInfoQuery($owner: String!, $name: String!) {
      repository(owner: $owner, name: $name) {
        id
        name
        description
        stargazerCount
        viewerHasStarred
        forkCount
        refs(refPrefix: "refs/heads/", first: 0) { totalCount }
        defaultBranchRef {
          target {
            ... on Commit {
              history { totalCount }
            }
          }
        }
        mentionableUsers(first: 10) {
          nodes { login avatarUrl url }
        }
      }
    }
"#;

pub const ISSUES_LIST_QUERY: &str = r"
    query IssuesListQuery($owner: String!, $name: String!, $count: Int!, $cursor: String) {
      repository(owner: $owner, name: $name) {
        issues(first: $count, after: $cursor, orderBy: { field: CREATED_AT, direction: DESC }) {
          edges {
            cursor
            node {
              id
              number
              title
              createdAt
              labels(first: 5) { nodes { name color } }
            }
          }
          pageInfo { hasNextPage endCursor }
        }
      }
    }
";

pub const ISSUE_DETAIL_QUERY: &str = r"
    query IssueDetailQuery($owner: String!, $name: String!, $number: Int!, $count: Int!, $cursor: String) {
      repository(owner: $owner, name: $name) {
        issue(number: $number) {
          id
          number
          title
          body
          createdAt
          labels(first: 10) { nodes { name color } }
          comments(first: $count, after: $cursor, orderBy: { field: UPDATED_AT, direction: DESC }) {
            edges {
              cursor
              node {
                id
                author { login avatarUrl }
                createdAt
                body
              }
            }
            pageInfo { hasNextPage endCursor }
          }
        }
      }
    }
";

/// Follow-up comment pages; selects only the comment connection.
pub const ISSUE_COMMENTS_QUERY: &str = r"
    query IssueCommentsQuery($owner: String!, $name: String!, $number: Int!, $count: Int!, $cursor: String) {
      repository(owner: $owner, name: $name) {
        issue(number: $number) {
          comments(first: $count, after: $cursor, orderBy: { field: UPDATED_AT, direction: DESC }) {
            edges {
              cursor
              node {
                id
                author { login avatarUrl }
                createdAt
                body
              }
            }
            pageInfo { hasNextPage endCursor }
          }
        }
      }
    }
";

pub const ADD_STAR_MUTATION: &str = r"
    mutation AddStar($input: AddStarInput!) {
      addStar(input: $input) {
        clientMutationId
        starrable { id stargazerCount viewerHasStarred }
      }
    }
";

pub const REMOVE_STAR_MUTATION: &str = r"
    mutation RemoveStar($input: RemoveStarInput!) {
      removeStar(input: $input) {
        clientMutationId
        starrable { id stargazerCount viewerHasStarred }
      }
    }
";
