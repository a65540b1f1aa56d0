//! Terminal rendering for repositories, issues and comments.
//!
//! Every writer takes an `impl Write` so output can be captured in tests.
//! Markdown bodies go through [`tidy_body`] and are rendered with
//! `termimad`.

use std::io::Write;

use chrono::{DateTime, Utc};
use termimad::MadSkin;

use crate::environment;
use crate::markup::tidy_body;
use crate::models::{Comment, IssueDetail, IssueSummary, Label, Repository, StarState};

#[cfg(test)]
mod tests;

/// Rendering settings shared by every writer.
pub struct Theme {
    pub skin: MadSkin,
    /// Whether ANSI colour sequences may be emitted.
    pub colour: bool,
}

impl Theme {
    /// Colour unless `NO_COLOR` is set.
    #[must_use]
    pub fn detect() -> Self {
        if environment::var("NO_COLOR").is_ok_and(|v| !v.is_empty()) {
            Self::plain()
        } else {
            Self {
                skin: MadSkin::default(),
                colour: true,
            }
        }
    }

    /// No styling at all.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            skin: MadSkin::no_style(),
            colour: false,
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.colour {
            format!("\x1b[1m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// `YYYY-MM-DD`.
#[must_use]
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn parse_hex(colour: &str) -> Option<(u8, u8, u8)> {
    let hex = colour.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// `[name]` on the label's colour, with black or white text for contrast.
///
/// Labels with a malformed colour, or any label under a plain theme, print
/// without escapes.
#[must_use]
pub fn label_tag(theme: &Theme, label: &Label) -> String {
    match parse_hex(&label.color) {
        Some((r, g, b)) if theme.colour => {
            let luma = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
            let fg = if luma > 128_000 { "30" } else { "97" };
            format!("\x1b[48;2;{r};{g};{b}m\x1b[{fg}m[{}]\x1b[0m", label.name)
        }
        _ => format!("[{}]", label.name),
    }
}

fn label_line<'a>(theme: &Theme, labels: impl Iterator<Item = &'a Label>) -> String {
    labels
        .map(|l| label_tag(theme, l))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_markdown<W: Write>(out: &mut W, theme: &Theme, body: &str) -> anyhow::Result<()> {
    let body = tidy_body(body);
    if !body.is_empty() {
        theme.skin.write_text_on(out, &body)?;
    }
    Ok(())
}

/// The star glyph and count, e.g. `⭐ 42` or `☆ 41`.
#[must_use]
pub fn star_badge(state: &StarState) -> String {
    let glyph = if state.viewer_has_starred { "⭐" } else { "☆" };
    format!("{glyph} {}", state.stargazer_count)
}

/// Repository header, counters and contributors.
pub fn write_repository<W: Write>(
    mut out: W,
    theme: &Theme,
    repo: &Repository,
) -> anyhow::Result<()> {
    writeln!(out, "{}", theme.bold(&repo.name))?;
    if let Some(desc) = repo.description.as_deref().filter(|d| !d.trim().is_empty()) {
        writeln!(out, "{desc}")?;
    }
    writeln!(
        out,
        "{}   🍴 {}   🌿 Branches: {}   ⏳ Commits: {}",
        star_badge(&repo.star_state()),
        repo.fork_count,
        repo.branch_count(),
        repo.commit_count()
    )?;
    let contributors: Vec<_> = repo.contributors().map(|u| u.login.as_str()).collect();
    if !contributors.is_empty() {
        writeln!(out, "Contributors: {}", contributors.join(", "))?;
    }
    Ok(())
}

/// One line per issue plus a dated, labelled second line.
pub fn write_issue_row<W: Write>(
    mut out: W,
    theme: &Theme,
    issue: &IssueSummary,
) -> anyhow::Result<()> {
    writeln!(out, "{} {}", theme.bold(&format!("#{}", issue.number)), issue.title)?;
    let labels = label_line(theme, issue.labels.iter());
    let opened = format_date(&issue.created_at);
    if labels.is_empty() {
        writeln!(out, "    opened {opened}")?;
    } else {
        writeln!(out, "    opened {opened}  {labels}")?;
    }
    Ok(())
}

/// Footer for a paginated issue list.
pub fn write_issue_list_end<W: Write>(mut out: W, has_more: bool) -> std::io::Result<()> {
    if has_more {
        writeln!(out, "More issues available; use --pages or --all to load them.")
    } else {
        writeln!(out, "No more issues.")
    }
}

/// Title, metadata and rendered body of an issue, without comments.
pub fn write_issue_detail<W: Write>(
    mut out: W,
    theme: &Theme,
    issue: &IssueDetail,
) -> anyhow::Result<()> {
    writeln!(out, "{} #{}", theme.bold(&issue.title), issue.number)?;
    let labels = label_line(theme, issue.labels.iter());
    let opened = format_date(&issue.created_at);
    if labels.is_empty() {
        writeln!(out, "opened {opened}")?;
    } else {
        writeln!(out, "opened {opened}  {labels}")?;
    }
    writeln!(out)?;
    write_markdown(&mut out, theme, &issue.body)?;
    Ok(())
}

/// Comment banner followed by its rendered body.
pub fn write_comment<W: Write>(mut out: W, theme: &Theme, comment: &Comment) -> anyhow::Result<()> {
    let login = comment
        .author
        .as_ref()
        .map_or("(unknown)", |a| a.login.as_str());
    writeln!(
        out,
        "💬  {} wrote on {}:",
        theme.bold(login),
        format_date(&comment.created_at)
    )?;
    write_markdown(&mut out, theme, &comment.body)?;
    writeln!(out)?;
    Ok(())
}

/// Footer for a paginated comment list.
pub fn write_comment_list_end<W: Write>(mut out: W, has_more: bool) -> std::io::Result<()> {
    if has_more {
        writeln!(out, "More comments available; use --comment-pages or --all-comments.")
    } else {
        Ok(())
    }
}
