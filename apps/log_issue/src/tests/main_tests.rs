use super::*;
use shared::{
    catalog::Catalog,
    domain::{IdPolicy, KeyEvent},
    selection::{Outcome, SelectionMachine},
};

fn settings_for(dir: &tempfile::TempDir) -> Settings {
    Settings {
        direct_log_path: dir.path().join("DirectIssueLog.csv"),
        ..Settings::default()
    }
}

#[test]
fn zero_arguments_is_a_usage_error_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Cli::try_parse_from(["log_issue"]).expect_err("should fail");
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    assert_ne!(err.exit_code(), 0);
    assert!(err.render().to_string().contains("Usage"));
    assert_eq!(fs_entries(&dir), 0);
}

#[test]
fn one_argument_is_a_usage_error() {
    let err = Cli::try_parse_from(["log_issue", "Cards"]).expect_err("should fail");
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn extra_arguments_are_ignored() {
    let cli = Cli::try_parse_from(["log_issue", "Cards", "Swipe Issue", "extra", "--urgent"])
        .expect("parse");
    assert_eq!(cli.category, "Cards");
    assert_eq!(cli.issue_type, "Swipe Issue");
    assert_eq!(cli.extra, ["extra", "--urgent"]);
}

#[test]
fn appends_to_configured_direct_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(&dir);
    let cli = Cli::try_parse_from(["log_issue", "Cards", "Swipe Issue"]).expect("parse");

    let first = log_issue(&cli, &settings).expect("first");
    let second = log_issue(&cli, &settings).expect("second");
    assert_eq!((first.id, second.id), (1, 2));

    let store = LogStore::new(&settings.direct_log_path, IdPolicy::Sequential);
    let records = store.records().expect("records");
    assert_eq!(records, [first, second]);
}

#[test]
fn log_path_flag_overrides_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(&dir);
    let override_path = dir.path().join("other").join("log.csv");
    let cli = Cli::try_parse_from([
        "log_issue",
        "--log-path",
        override_path.to_str().expect("utf8 path"),
        "Duo",
        "Duo MFA Device Change",
    ])
    .expect("parse");

    log_issue(&cli, &settings).expect("append");
    assert!(override_path.exists());
    assert!(!settings.direct_log_path.exists());
}

#[test]
fn direct_row_matches_live_row_shape() {
    let direct_dir = tempfile::tempdir().expect("tempdir");
    let cli = Cli::try_parse_from(["log_issue", "Cards", "Swipe Issue"]).expect("parse");
    let direct = log_issue(&cli, &settings_for(&direct_dir)).expect("direct append");

    let live_dir = tempfile::tempdir().expect("tempdir");
    let mut live_store = LogStore::new(live_dir.path().join("IssueLog.csv"), IdPolicy::Sequential);
    live_store.ensure_initialized().expect("init");
    let mut machine = SelectionMachine::new(Catalog::builtin());
    machine.process(KeyEvent::pressed(0), &mut live_store);
    let Outcome::Logged(live) = machine.process(KeyEvent::pressed(3), &mut live_store) else {
        panic!("live selection should log");
    };

    assert_eq!(
        (direct.id, direct.category.as_str(), direct.issue.as_str()),
        (live.id, live.category.as_str(), live.issue.as_str())
    );

    let direct_file =
        std::fs::read_to_string(direct_dir.path().join("DirectIssueLog.csv")).expect("read");
    let live_file = std::fs::read_to_string(live_store.path()).expect("read");
    let strip_time = |contents: &str| -> Vec<Vec<String>> {
        contents
            .lines()
            .map(|line| {
                line.split(',')
                    .enumerate()
                    .filter(|(column, _)| *column != 1)
                    .map(|(_, field)| field.to_string())
                    .collect()
            })
            .collect()
    };
    assert_eq!(strip_time(&direct_file), strip_time(&live_file));
}

fn fs_entries(dir: &tempfile::TempDir) -> usize {
    std::fs::read_dir(dir.path()).expect("read dir").count()
}
