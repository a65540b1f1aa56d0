//! Parse repository and issue references.
//!
//! Repositories may be written as `owner/name`, `owner/name.git`, or as any
//! GitHub URL form (`https://github.com/owner/name`,
//! `git@github.com:owner/name.git`). Issues may additionally be written as
//! an issue URL or as `owner/name#number`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{BoxedStr, LensError};

static REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:https?|ssh)://(?:git@)?(?:www\.)?github\.com/|git@github\.com:)?(?P<owner>[A-Za-z0-9_.-]+)/(?P<name>[A-Za-z0-9_.-]+?)(?:\.git)?/?$",
    )
    .expect("valid regex")
});

/// A repository on github.com.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_repo(s)
    }
}

/// One issue of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRef {
    pub repo: RepoRef,
    pub number: u64,
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Parse a repository reference.
///
/// # Errors
///
/// Returns [`LensError::InvalidRef`] when `input` names no repository.
///
/// # Examples
///
/// ```
/// use lens::repo_ref::parse_repo;
/// let repo = parse_repo("git@github.com:rust-lang/rust.git").expect("valid reference");
/// assert_eq!(repo.to_string(), "rust-lang/rust");
/// ```
pub fn parse_repo(input: &str) -> Result<RepoRef, LensError> {
    let input = input.trim();
    let caps = REPO_RE
        .captures(input)
        .ok_or_else(|| LensError::InvalidRef(input.boxed()))?;
    match (caps.name("owner"), caps.name("name")) {
        (Some(owner), Some(name)) if !is_dots(owner.as_str()) && !is_dots(name.as_str()) => {
            Ok(RepoRef::new(owner.as_str(), name.as_str()))
        }
        _ => Err(LensError::InvalidRef(input.boxed())),
    }
}

fn is_dots(segment: &str) -> bool {
    segment.chars().all(|c| c == '.')
}

/// Parse an issue reference.
///
/// `input` is an issue URL, `owner/name#number`, or a repository reference
/// completed by `number`. An explicit `number` wins over one embedded in
/// `input`.
///
/// # Errors
///
/// Returns [`LensError::InvalidRef`] when no repository or no issue number
/// can be determined.
pub fn parse_issue(input: &str, number: Option<u64>) -> Result<IssueRef, LensError> {
    let input = input.trim();
    let (repo, embedded) = if let Some(parsed) = parse_issue_url(input) {
        parsed?
    } else if let Some((repo, num)) = input.rsplit_once('#') {
        let num = num
            .parse()
            .map_err(|_| LensError::InvalidRef(input.boxed()))?;
        (parse_repo(repo)?, Some(num))
    } else {
        (parse_repo(input)?, None)
    };
    let number = number
        .or(embedded)
        .ok_or_else(|| LensError::InvalidRef(format!("{input}: missing issue number").boxed()))?;
    Ok(IssueRef { repo, number })
}

/// `Some` when `input` is a github.com URL with an `issues` segment.
fn parse_issue_url(input: &str) -> Option<Result<(RepoRef, Option<u64>), LensError>> {
    let url = Url::parse(input).ok()?;
    let host = url.host_str()?;
    if host != "github.com" && host != "www.github.com" {
        return None;
    }
    let parts: Vec<_> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match parts.as_slice() {
        [owner, name, "issues", number, ..] => Some(
            number
                .parse()
                .map(|n| (RepoRef::new(*owner, *name), Some(n)))
                .map_err(|_| LensError::InvalidRef(input.boxed())),
        ),
        _ => None,
    }
}
