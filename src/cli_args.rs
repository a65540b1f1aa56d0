//! Command-line argument structures.
//!
//! Each sub-command's arguments derive both `clap` and `OrthoConfig`, so the
//! same struct can be filled from flags, `LENSCMDS_*` environment variables
//! and the `[cmds.<name>]` table of `.lens.toml`.

use clap::Parser;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::environment;

/// Global options that apply to every sub-command.
#[derive(Parser, Deserialize, Serialize, Default, Debug, OrthoConfig, Clone)]
#[ortho_config(prefix = "LENS")]
pub struct GlobalArgs {
    /// GitHub token for authenticated API requests
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,
    /// Write HTTP transcript to this file for debugging
    #[arg(long)]
    pub transcript: Option<std::path::PathBuf>,
    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub http_timeout: Option<u64>,
}

impl GlobalArgs {
    /// Merge another instance into `self`, overwriting only fields that are
    /// currently `None`.
    ///
    /// CLI flags have higher priority than configuration sources.
    pub fn merge(&mut self, other: Self) {
        self.github_token = other.github_token.or_else(|| self.github_token.take());
        self.transcript = other.transcript.or_else(|| self.transcript.take());
        self.http_timeout = other.http_timeout.or_else(|| self.http_timeout.take());
    }

    /// The configured token, then `LENS_GITHUB_TOKEN`, then `GITHUB_TOKEN`.
    ///
    /// Empty values are skipped; an empty string means anonymous access.
    #[must_use]
    pub fn token(&self) -> String {
        self.github_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_owned)
            .or_else(environment::github_token)
            .unwrap_or_default()
    }
}

/// Parameters accepted by the `repo` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "repo")]
#[ortho_config(prefix = "LENS")]
pub struct RepoArgs {
    /// Repository as `owner/name` or a GitHub URL
    #[arg(required = true)]
    // Clap marks the argument as required so parsing yields `Some(value)`. The
    // `Option` allows defaults and config merging to leave it unset.
    pub reference: Option<String>,
}

/// Parameters accepted by the `star` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "star")]
#[ortho_config(prefix = "LENS")]
pub struct StarArgs {
    /// Repository as `owner/name` or a GitHub URL
    #[arg(required = true)]
    pub reference: Option<String>,
}

/// Parameters accepted by the `issues` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "issues")]
#[ortho_config(prefix = "LENS")]
pub struct IssuesArgs {
    /// Repository as `owner/name` or a GitHub URL
    #[arg(required = true)]
    pub reference: Option<String>,
    /// Number of pages to show
    #[arg(long, value_name = "N")]
    pub pages: Option<u32>,
    /// Keep loading until every issue is shown
    #[arg(long)]
    // `crate::bool_predicates::not` ensures false CLI defaults cannot override env or config precedence.
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub all: bool,
    /// Issues per page (1 to 100)
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,
}

/// Parameters accepted by the `issue` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "issue")]
#[ortho_config(prefix = "LENS")]
pub struct IssueArgs {
    /// Issue URL, `owner/name#number`, or a repository followed by a number
    #[arg(required = true)]
    pub reference: Option<String>,
    /// Issue number when the reference names only a repository
    #[arg(value_name = "NUMBER")]
    pub number: Option<u64>,
    /// Number of comment pages to show
    #[arg(long, value_name = "N")]
    pub comment_pages: Option<u32>,
    /// Keep loading until every comment is shown
    #[arg(long)]
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub all_comments: bool,
    /// Comments per page (1 to 100)
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,
}

/// How many pages a command should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBudget {
    Pages(u32),
    All,
}

impl PageBudget {
    /// `all` wins over a page count; no count means one page.
    #[must_use]
    pub fn from_flags(pages: Option<u32>, all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::Pages(pages.unwrap_or(1).max(1))
        }
    }

    /// Whether another page may be loaded after `loaded` pages.
    #[must_use]
    pub fn allows(self, loaded: u32) -> bool {
        match self {
            Self::All => true,
            Self::Pages(n) => loaded < n,
        }
    }
}
