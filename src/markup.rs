//! Clean up issue and comment bodies before rendering.

use std::sync::LazyLock;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink as _;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("valid regex"));

/// Prepare a markdown body for the terminal.
///
/// Root-level `<details>` blocks are collapsed and runs of blank lines are
/// squeezed. Bodies without a `<details>` tag skip HTML parsing so markdown
/// containing `<` or entities passes through untouched.
#[must_use]
pub fn tidy_body(body: &str) -> String {
    let body = body.replace("\r\n", "\n");
    let body = if body.to_ascii_lowercase().contains("<details") {
        collapse_details(&body)
    } else {
        body
    };
    squeeze_blank_lines(body.trim_end()).into_owned()
}

/// Collapse runs of three or more newlines to a single blank line.
///
/// # Examples
///
/// ```
/// use lens::markup::squeeze_blank_lines;
/// assert_eq!(squeeze_blank_lines("a\n\n\n\nb"), "a\n\nb");
/// ```
#[must_use]
pub fn squeeze_blank_lines(text: &str) -> std::borrow::Cow<'_, str> {
    BLANK_RUN_RE.replace_all(text, "\n\n")
}

/// Collapse root `<details>` blocks.
///
/// Each root-level `<details>` becomes the text of its `<summary>` prefixed
/// with `▶`. Everything inside it, nested `<details>` included, is dropped.
///
/// # Examples
///
/// ```
/// use lens::markup::collapse_details;
/// let input = "<details><summary>Logs</summary><pre>noise</pre></details>";
/// assert_eq!(collapse_details(input), "\u{25B6} Logs\n");
/// ```
#[must_use]
pub fn collapse_details(input: &str) -> String {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(input);
    let mut out = String::new();
    for child in dom.document.children.borrow().iter() {
        collapse_node(child, &mut out);
    }
    out
}

fn collapse_node(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Element { name, .. } if name.local.eq_str_ignore_ascii_case("details") => {
            let summary = find_summary_text(node).unwrap_or_else(|| "Details".to_string());
            out.push('\u{25B6}');
            out.push(' ');
            out.push_str(summary.trim());
            out.push('\n');
        }
        NodeData::Element { .. } | NodeData::Document => {
            for child in node.children.borrow().iter() {
                collapse_node(child, out);
            }
        }
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {}
    }
}

fn find_summary_text(node: &Handle) -> Option<String> {
    node.children.borrow().iter().find_map(|child| match &child.data {
        NodeData::Element { name, .. } if name.local.eq_str_ignore_ascii_case("summary") => {
            Some(collect_text(child))
        }
        _ => None,
    })
}

fn collect_text(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            _ => text.push_str(&collect_text(child)),
        }
    }
    text
}
