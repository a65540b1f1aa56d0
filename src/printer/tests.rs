//! Unit tests for printer helpers.

use super::*;

use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::json;

use crate::test_utils::strip_ansi_codes;

fn render<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
{
    let mut buf = Vec::new();
    f(&mut buf).expect("render");
    String::from_utf8(buf).expect("utf8")
}

#[fixture]
fn repo() -> Repository {
    serde_json::from_value(json!({
        "id": "R_1",
        "name": "lens",
        "description": "GitHub in the terminal",
        "stargazerCount": 41,
        "viewerHasStarred": true,
        "forkCount": 3,
        "refs": {"totalCount": 4},
        "defaultBranchRef": null,
        "mentionableUsers": {"nodes": [
            {"login": "alice", "avatarUrl": "a", "url": "u"},
            {"login": "bob", "avatarUrl": "b", "url": "v"}
        ]}
    }))
    .expect("repository")
}

fn label(name: &str, color: &str) -> Label {
    Label {
        name: name.into(),
        color: color.into(),
    }
}

#[rstest]
fn repository_shows_counters_and_contributors(repo: Repository) {
    let out = render(|buf| write_repository(buf, &Theme::plain(), &repo));
    assert!(out.starts_with("lens\nGitHub in the terminal\n"));
    assert!(out.contains("⭐ 41"));
    assert!(out.contains("🍴 3"));
    assert!(out.contains("Branches: 4"));
    assert!(out.contains("Commits: 0"));
    assert!(out.contains("Contributors: alice, bob"));
}

#[rstest]
#[case(true, 10, "⭐ 10")]
#[case(false, 0, "☆ 0")]
fn star_badge_reflects_viewer(#[case] starred: bool, #[case] count: u64, #[case] expected: &str) {
    let state = StarState {
        id: "R".into(),
        stargazer_count: count,
        viewer_has_starred: starred,
    };
    assert_eq!(star_badge(&state), expected);
}

#[rstest]
#[case("d73a4a", "\x1b[48;2;215;58;74m\x1b[97m[bug]\x1b[0m")]
#[case("#ffffff", "\x1b[48;2;255;255;255m\x1b[30m[bug]\x1b[0m")]
#[case("zzz", "[bug]")]
#[case("", "[bug]")]
fn label_tags_use_truecolour_background(#[case] colour: &str, #[case] expected: &str) {
    let theme = Theme {
        skin: MadSkin::no_style(),
        colour: true,
    };
    assert_eq!(label_tag(&theme, &label("bug", colour)), expected);
}

#[test]
fn plain_theme_prints_bare_labels() {
    assert_eq!(label_tag(&Theme::plain(), &label("ui", "00ff00")), "[ui]");
}

#[test]
fn issue_row_has_number_date_and_labels() {
    let issue = IssueSummary {
        id: "I_1".into(),
        number: 12,
        title: "Crash on start".into(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).single().expect("date"),
        labels: crate::models::NodeList {
            nodes: vec![Some(label("bug", "d73a4a")), None, Some(label("p1", "000000"))],
        },
    };
    let out = render(|buf| write_issue_row(buf, &Theme::plain(), &issue));
    assert_eq!(out, "#12 Crash on start\n    opened 2024-03-01  [bug] [p1]\n");
}

#[rstest]
#[case(false, "No more issues.\n")]
#[case(true, "More issues available; use --pages or --all to load them.\n")]
fn issue_list_footer(#[case] has_more: bool, #[case] expected: &str) {
    let mut buf = Vec::new();
    write_issue_list_end(&mut buf, has_more).expect("footer");
    assert_eq!(String::from_utf8(buf).expect("utf8"), expected);
}

fn comment(login: Option<&str>, body: &str) -> Comment {
    Comment {
        id: "C_1".into(),
        author: login.map(|l| crate::models::Author {
            login: l.into(),
            avatar_url: None,
        }),
        created_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).single().expect("date"),
        body: body.into(),
    }
}

#[rstest]
#[case(Some("carol"), "carol")]
#[case(None, "(unknown)")]
fn comment_banner_names_author(#[case] login: Option<&str>, #[case] expected: &str) {
    let c = comment(login, "Hi");
    let out = render(|buf| write_comment(buf, &Theme::detect(), &c));
    let plain = strip_ansi_codes(&out);
    assert!(plain.contains(&format!("\u{1f4ac}  {expected} wrote on 2024-05-06:")));
    assert!(plain.contains("Hi"));
}

#[test]
fn comment_body_collapses_details_and_blank_runs() {
    let c = comment(
        Some("dave"),
        "Intro\n\n\n\n<details><summary>Trace</summary>hidden</details>",
    );
    let out = render(|buf| write_comment(buf, &Theme::plain(), &c));
    assert!(out.contains("▶ Trace"));
    assert!(!out.contains("hidden"));
    assert!(!out.contains("\n\n\n"));
}

#[test]
fn issue_detail_shows_title_and_body() {
    let issue: IssueDetail = serde_json::from_value(json!({
        "id": "I_1",
        "number": 7,
        "title": "Crash",
        "body": "It **breaks**",
        "createdAt": "2024-03-01T10:00:00Z",
        "labels": {"nodes": [{"name": "bug", "color": "d73a4a"}]}
    }))
    .expect("issue");
    let out = render(|buf| write_issue_detail(buf, &Theme::plain(), &issue));
    assert!(out.starts_with("Crash #7\nopened 2024-03-01  [bug]\n"));
    assert!(out.contains("breaks"));
}
