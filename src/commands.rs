//! Command execution helpers for `lens`.
//!
//! Each `run_*` function resolves its reference, fetches through one
//! [`GraphQLClient`] and one [`SharedCache`], and renders to stdout. Output
//! stops quietly when stdout is closed (for example when piped into `head`).

use std::io::{ErrorKind, Write};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{error, info, warn};

use crate::api::{ClientConfig, Endpoint, GraphQLClient};
use crate::cache::SharedCache;
use crate::cli_args::{GlobalArgs, IssueArgs, IssuesArgs, PageBudget, RepoArgs, StarArgs};
use crate::environment;
use crate::error::{BoxedStr, LensError};
use crate::github::{
    CommentsSource, DEFAULT_COMMENTS_PAGE_SIZE, DEFAULT_ISSUES_PAGE_SIZE, IssuesSource,
    fetch_issue, fetch_repository,
};
use crate::pagination::{LoadOutcome, PageSource, Paginator};
use crate::printer::{
    Theme, star_badge, write_comment, write_comment_list_end, write_issue_detail,
    write_issue_list_end, write_issue_row, write_repository,
};
use crate::repo_ref::{parse_issue, parse_repo};
use crate::star::toggle_star;

static UTF8_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bUTF-?8\b").expect("valid regex"));

/// Client, cache and theme shared by one command invocation.
struct Session {
    client: GraphQLClient,
    cache: SharedCache,
    theme: Theme,
}

impl Session {
    fn open(global: &GlobalArgs) -> Result<Self, LensError> {
        let token = global.token();
        warn_on_missing_token_and_locale(&token);
        Ok(Self {
            client: build_graphql_client(&token, global)?,
            cache: SharedCache::new(),
            theme: Theme::detect(),
        })
    }
}

/// Create a [`GraphQLClient`], falling back to no transcript on failure.
///
/// If the transcript file cannot be created a warning is logged and the
/// client is built without one.
fn build_graphql_client(token: &str, global: &GlobalArgs) -> Result<GraphQLClient, LensError> {
    let config = global
        .http_timeout
        .map_or_else(ClientConfig::default, |secs| ClientConfig {
            request_timeout: Duration::from_secs(secs),
        });
    match GraphQLClient::with_config(token, Endpoint::from_env(), global.transcript.clone(), config)
    {
        Ok(c) => Ok(c),
        Err(e) => {
            warn!("failed to create transcript: {e}");
            GraphQLClient::with_config(token, Endpoint::from_env(), None, config)
        }
    }
}

fn warn_on_missing_token_and_locale(token: &str) {
    if token.is_empty() {
        warn!("GitHub token not set, using anonymous API access");
    }
    if !locale_is_utf8() {
        warn!("terminal locale is not UTF-8; emojis may not render correctly");
    }
}

fn locale_is_utf8() -> bool {
    environment::var("LC_ALL")
        .or_else(|_| environment::var("LC_CTYPE"))
        .or_else(|_| environment::var("LANG"))
        .map(|v| UTF8_RE.is_match(&v))
        .unwrap_or(false)
}

fn caused_by_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|c| {
        c.downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == ErrorKind::BrokenPipe)
    })
}

/// Log a rendering failure. Returns `true` when stdout has gone away and
/// nothing more should be written.
fn output_closed(result: anyhow::Result<()>, what: &str) -> bool {
    match result {
        Ok(()) => false,
        Err(e) if caused_by_broken_pipe(&e) => true,
        Err(e) => {
            error!("error printing {what}: {e}");
            false
        }
    }
}

fn reference(value: Option<&str>) -> Result<&str, LensError> {
    value.ok_or_else(|| LensError::InvalidRef("no reference given".boxed()))
}

/// Print every node not yet shown, then keep loading pages while `budget`
/// allows and the connection has more.
///
/// The first page must already be held. Returns `false` if stdout closed.
async fn page_through<S, W, F>(
    paginator: &Paginator<S>,
    budget: PageBudget,
    out: &mut W,
    mut write: F,
) -> Result<bool, LensError>
where
    S: PageSource,
    W: Write,
    F: FnMut(&mut W, &S::Node) -> anyhow::Result<()>,
{
    let mut shown = 0;
    let mut pages = 1;
    loop {
        let closed = paginator.with_items(|items| {
            items
                .iter()
                .skip(shown)
                .any(|node| output_closed(write(&mut *out, node), "entry"))
        });
        if closed {
            return Ok(false);
        }
        shown = paginator.len();
        if !paginator.has_more() || !budget.allows(pages) {
            return Ok(true);
        }
        match paginator.load_next().await? {
            LoadOutcome::Merged { .. } => pages += 1,
            LoadOutcome::Skipped(_) | LoadOutcome::Stale => return Ok(true),
        }
    }
}

/// Show repository metadata.
///
/// # Errors
///
/// Returns [`LensError::InvalidRef`] for an unparsable reference and
/// propagates fetch failures, including [`LensError::NotFound`].
pub async fn run_repo(args: RepoArgs, global: &GlobalArgs) -> Result<(), LensError> {
    let repo_ref = parse_repo(reference(args.reference.as_deref())?)?;
    let session = Session::open(global)?;
    let repo = fetch_repository(&session.client, &repo_ref).await?;
    session.cache.upsert_entity(&repo)?;
    if output_closed(
        write_repository(std::io::stdout().lock(), &session.theme, &repo),
        "repository",
    ) {
        return Ok(());
    }
    Ok(())
}

/// Toggle the viewer's star on a repository and print the confirmed count.
///
/// # Errors
///
/// Propagates fetch and mutation failures. A failed mutation leaves the
/// cached repository exactly as fetched.
pub async fn run_star(args: StarArgs, global: &GlobalArgs) -> Result<(), LensError> {
    let repo_ref = parse_repo(reference(args.reference.as_deref())?)?;
    let session = Session::open(global)?;
    let repo = fetch_repository(&session.client, &repo_ref).await?;
    let key = session.cache.upsert_entity(&repo)?;
    let confirmed = toggle_star(&session.cache, &session.client, &key).await?;
    let verb = if confirmed.viewer_has_starred {
        "Starred"
    } else {
        "Unstarred"
    };
    info!(repo = %repo_ref, count = confirmed.stargazer_count, "{verb}");
    let mut out = std::io::stdout().lock();
    if output_closed(
        writeln!(out, "{verb} {repo_ref}  {}", star_badge(&confirmed)).map_err(Into::into),
        "star",
    ) {
        return Ok(());
    }
    Ok(())
}

/// List issues, newest first, one page or more.
///
/// # Errors
///
/// Propagates fetch failures. A failure after the first page is returned
/// once the pages already loaded have been printed.
pub async fn run_issues(args: IssuesArgs, global: &GlobalArgs) -> Result<(), LensError> {
    let repo_ref = parse_repo(reference(args.reference.as_deref())?)?;
    let session = Session::open(global)?;
    let issues = Paginator::new(
        IssuesSource::new(&session.client),
        args.page_size.unwrap_or(DEFAULT_ISSUES_PAGE_SIZE),
    )
    .with_cache(session.cache.clone());
    issues.start(repo_ref).await?;

    let budget = PageBudget::from_flags(args.pages, args.all);
    let mut out = std::io::stdout().lock();
    let theme = &session.theme;
    let open = page_through(&issues, budget, &mut out, |w, issue| {
        write_issue_row(w, theme, issue)
    })
    .await?;
    if !open {
        return Ok(());
    }
    if output_closed(
        write_issue_list_end(&mut out, issues.has_more()).map_err(Into::into),
        "footer",
    ) {
        return Ok(());
    }
    Ok(())
}

/// Show one issue with its most recently updated comments.
///
/// # Errors
///
/// Returns [`LensError::InvalidRef`] for an unparsable reference and
/// propagates fetch failures, including [`LensError::NotFound`].
pub async fn run_issue(args: IssueArgs, global: &GlobalArgs) -> Result<(), LensError> {
    let issue_ref = parse_issue(reference(args.reference.as_deref())?, args.number)?;
    let session = Session::open(global)?;
    let page_size = args.page_size.unwrap_or(DEFAULT_COMMENTS_PAGE_SIZE);
    let issue = fetch_issue(&session.client, &issue_ref, page_size).await?;
    session.cache.upsert_entity(&issue)?;

    let mut out = std::io::stdout().lock();
    let theme = &session.theme;
    if output_closed(write_issue_detail(&mut out, theme, &issue), "issue") {
        return Ok(());
    }

    let comments = Paginator::new(CommentsSource::new(&session.client), page_size)
        .with_cache(session.cache.clone());
    comments.reset(issue_ref);
    comments.initialize(issue.comments)?;
    let budget = PageBudget::from_flags(args.comment_pages, args.all_comments);
    let open = page_through(&comments, budget, &mut out, |w, comment| {
        write_comment(w, theme, comment)
    })
    .await?;
    if !open {
        return Ok(());
    }
    if output_closed(
        write_comment_list_end(&mut out, comments.has_more()).map_err(Into::into),
        "footer",
    ) {
        return Ok(());
    }
    Ok(())
}
