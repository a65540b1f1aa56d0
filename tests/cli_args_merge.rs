//! Behavioural coverage for sub-command configuration merging.
//!
//! Precedence is defaults < `.lens.toml` < `LENSCMDS_*` environment < CLI.

#[path = "support/env.rs"]
mod support;

use lens::cli_args::{IssueArgs, IssuesArgs, RepoArgs};
use lens::config::load_with_reference_fallback;
use lens::test_utils::set_var;
use ortho_config::SubcmdConfigMerge;
use rstest::rstest;
use serial_test::serial;
use support::{EnvGuard, apply_env, setup_env_and_config};

const ISSUES_KEYS: &[&str] = &[
    "LENS_CONFIG_PATH",
    "LENSCMDS_ISSUES_REFERENCE",
    "LENSCMDS_ISSUES_PAGES",
    "LENSCMDS_ISSUES_PAGE_SIZE",
];

const ISSUES_CONFIG: &str = r#"[cmds.issues]
reference = "file/repo"
pages = 2
page_size = 20
"#;

#[rstest]
#[serial]
fn cli_values_win_over_environment_and_file() {
    let _guard = EnvGuard::new(ISSUES_KEYS);
    let (_dir, _path) = setup_env_and_config(ISSUES_CONFIG);
    set_var("LENSCMDS_ISSUES_REFERENCE", "env/repo");
    set_var("LENSCMDS_ISSUES_PAGE_SIZE", "30");

    let cli = IssuesArgs {
        reference: Some("cli/repo".into()),
        page_size: Some(40),
        ..IssuesArgs::default()
    };
    let merged = cli.load_and_merge().expect("merge issues args");

    assert_eq!(merged.reference.as_deref(), Some("cli/repo"));
    assert_eq!(merged.page_size, Some(40));
    assert_eq!(merged.pages, Some(2));
}

#[rstest]
#[case::environment(
    &[("LENSCMDS_ISSUES_REFERENCE", Some("env/repo")), ("LENSCMDS_ISSUES_PAGE_SIZE", Some("30"))],
    "env/repo",
    Some(30)
)]
#[case::file(&[], "file/repo", Some(20))]
#[serial]
fn unset_cli_values_fall_back(
    #[case] env: &[(&str, Option<&str>)],
    #[case] reference: &str,
    #[case] page_size: Option<u32>,
) {
    let _guard = EnvGuard::new(ISSUES_KEYS);
    let (_dir, _path) = setup_env_and_config(ISSUES_CONFIG);
    apply_env(env);

    let merged = IssuesArgs::default()
        .load_and_merge()
        .expect("merge issues args");

    assert_eq!(merged.reference.as_deref(), Some(reference));
    assert_eq!(merged.page_size, page_size);
    assert_eq!(merged.pages, Some(2));
}

#[rstest]
#[serial]
fn issue_number_can_come_from_config() {
    let _guard = EnvGuard::new(&["LENS_CONFIG_PATH", "LENSCMDS_ISSUE_NUMBER"]);
    let (_dir, _path) = setup_env_and_config("[cmds.issue]\nnumber = 12\n");

    let cli = IssueArgs {
        reference: Some("octo/lens".into()),
        ..IssueArgs::default()
    };
    let merged = cli.load_and_merge().expect("merge issue args");

    assert_eq!(merged.reference.as_deref(), Some("octo/lens"));
    assert_eq!(merged.number, Some(12));
}

#[rstest]
#[serial]
fn missing_reference_keeps_cli_arguments() {
    let _guard = EnvGuard::new(&["LENS_CONFIG_PATH", "LENSCMDS_REPO_REFERENCE"]);
    let (_dir, _path) = setup_env_and_config("");

    let cli = RepoArgs {
        reference: Some("octo/lens".into()),
    };
    let merged = load_with_reference_fallback(cli).expect("load repo args");

    assert_eq!(merged.reference.as_deref(), Some("octo/lens"));
}
