//! End-to-end tests of the `lens` binary against a fake GraphQL endpoint.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use serde_json::{Value, json};

mod utils;
use utils::{json_response, lens_cmd, set_sequential_responder, start_mitm};

fn issue_node(number: u64) -> Value {
    json!({
        "id": format!("I_{number}"),
        "number": number,
        "title": format!("Issue number {number}"),
        "createdAt": "2024-02-03T04:05:06Z",
        "labels": {"nodes": [{"name": "triage", "color": "ededed"}]}
    })
}

fn issues_page(numbers: &[u64], end: &str, has_next: bool) -> String {
    let edges: Vec<Value> = numbers
        .iter()
        .map(|n| json!({"cursor": format!("c{n}"), "node": issue_node(*n)}))
        .collect();
    json!({"data": {"repository": {"issues": {
        "edges": edges,
        "pageInfo": {"hasNextPage": has_next, "endCursor": end}
    }}}})
    .to_string()
}

fn comment(id: &str, login: &str, body: &str) -> Value {
    json!({
        "cursor": id,
        "node": {
            "id": id,
            "author": {"login": login, "avatarUrl": "https://example.com/a.png"},
            "createdAt": "2024-02-04T00:00:00Z",
            "body": body
        }
    })
}

#[tokio::test]
async fn repo_prints_metadata() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let body = json!({"data": {"repository": {
        "id": "R_1",
        "name": "lens",
        "description": "GitHub in the terminal",
        "stargazerCount": 7,
        "viewerHasStarred": false,
        "forkCount": 1,
        "refs": {"totalCount": 2},
        "defaultBranchRef": {"target": {"history": {"totalCount": 33}}},
        "mentionableUsers": {"nodes": [
            {"login": "alice", "avatarUrl": "a", "url": "u"},
            {"login": "bob", "avatarUrl": "b", "url": "v"}
        ]}
    }}})
    .to_string();
    *handler.lock().expect("lock handler") = Box::new(move |_req| json_response(body.clone()));

    let output = tokio::task::spawn_blocking(move || {
        lens_cmd(addr)
            .args(["repo", "octo/lens"])
            .output()
            .expect("run lens")
    })
    .await
    .expect("spawn blocking");

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("lens\nGitHub in the terminal\n"))
        .stdout(predicate::str::contains("☆ 7"))
        .stdout(predicate::str::contains("Commits: 33"))
        .stdout(predicate::str::contains("Contributors: alice, bob"));
    shutdown.shutdown().await;
}

#[rstest]
#[case(&["--all"], 6, "No more issues.")]
#[case(&["--pages", "2"], 4, "More issues available")]
#[case(&[], 2, "More issues available")]
#[tokio::test]
async fn issues_pages_through_the_list(
    #[case] flags: &'static [&'static str],
    #[case] shown_count: usize,
    #[case] footer: &'static str,
) {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    set_sequential_responder(
        &handler,
        vec![
            issues_page(&[6, 5], "c5", true),
            issues_page(&[5, 4, 3], "c3", true),
            issues_page(&[2, 1], "c1", false),
        ],
    );

    let output = tokio::task::spawn_blocking(move || {
        lens_cmd(addr)
            .args(["issues", "octo/lens", "--page-size", "2"])
            .args(flags)
            .output()
            .expect("run lens")
    })
    .await
    .expect("spawn blocking");

    let stdout = output.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(stdout).expect("utf8");
    let shown: Vec<&str> = stdout.lines().filter(|l| l.starts_with('#')).collect();
    let expected = [6, 5, 4, 3, 2, 1]
        .into_iter()
        .take(shown_count)
        .map(|n| format!("#{n} Issue number {n}"))
        .collect::<Vec<_>>();
    assert_eq!(shown, expected);
    assert!(stdout.contains(footer), "{stdout}");
    assert!(stdout.contains("opened 2024-02-03"));
    shutdown.shutdown().await;
}

#[tokio::test]
async fn issue_prints_body_and_comments() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let detail = json!({"data": {"repository": {"issue": {
        "id": "I_12",
        "number": 12,
        "title": "Crash on start",
        "body": "It **crashes**.\r\n\r\n\r\n\r\n<details><summary>Log</summary>secret trace</details>",
        "createdAt": "2024-02-03T04:05:06Z",
        "labels": {"nodes": [{"name": "bug", "color": "d73a4a"}]},
        "comments": {
            "edges": [comment("C_1", "carol", "Same here")],
            "pageInfo": {"hasNextPage": true, "endCursor": "C_1"}
        }
    }}}})
    .to_string();
    let more = json!({"data": {"repository": {"issue": {"comments": {
        "edges": [comment("C_1", "carol", "Same here"), comment("C_2", "dave", "Fixed")],
        "pageInfo": {"hasNextPage": false, "endCursor": "C_2"}
    }}}}})
    .to_string();
    set_sequential_responder(&handler, vec![detail, more]);

    let output = tokio::task::spawn_blocking(move || {
        lens_cmd(addr)
            .args(["issue", "octo/lens", "12", "--all-comments"])
            .output()
            .expect("run lens")
    })
    .await
    .expect("spawn blocking");

    let stdout = output.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(stdout).expect("utf8");
    assert!(stdout.starts_with("Crash on start #12\nopened 2024-02-03  [bug]\n"));
    assert!(stdout.contains("▶ Log"));
    assert!(!stdout.contains("secret trace"));
    assert_eq!(stdout.matches("carol wrote on 2024-02-04:").count(), 1);
    assert!(stdout.contains("dave wrote on 2024-02-04:"));
    assert!(!stdout.contains("More comments available"));
    shutdown.shutdown().await;
}

#[tokio::test]
async fn missing_issue_reports_not_found() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let body = json!({
        "data": {"repository": {"issue": null}},
        "errors": [{"type": "NOT_FOUND", "message": "Could not resolve to an Issue"}]
    })
    .to_string();
    *handler.lock().expect("lock handler") = Box::new(move |_req| json_response(body.clone()));

    let output = tokio::task::spawn_blocking(move || {
        lens_cmd(addr)
            .args(["issue", "https://github.com/octo/lens/issues/404"])
            .output()
            .expect("run lens")
    })
    .await
    .expect("spawn blocking");

    output
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue not found: octo/lens#404"));
    shutdown.shutdown().await;
}

#[test]
fn invalid_reference_is_rejected_before_any_request() {
    lens_cmd("127.0.0.1:9".parse().expect("addr"))
        .args(["repo", "not a repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference"));
}
