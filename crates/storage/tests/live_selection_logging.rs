use shared::{
    catalog::Catalog,
    domain::{IdPolicy, KeyEvent},
    selection::{Outcome, SelectionMachine, SelectionState},
};
use storage::LogStore;

#[test]
fn button_presses_become_log_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = LogStore::new(dir.path().join("IssueLog.csv"), IdPolicy::Sequential);
    store.ensure_initialized().expect("init");
    let mut machine = SelectionMachine::new(Catalog::builtin());

    let presses = [
        KeyEvent::pressed(1),
        KeyEvent::released(1),
        KeyEvent::pressed(3),
        KeyEvent::released(3),
        KeyEvent::pressed(0),
        KeyEvent::pressed(0),
        KeyEvent::pressed(12),
        KeyEvent::pressed(0),
        KeyEvent::pressed(12),
        KeyEvent::pressed(3),
    ];
    let mut logged = 0;
    for event in presses {
        if let Outcome::Logged(_) = machine.process(event, &mut store) {
            logged += 1;
        }
    }

    assert_eq!(logged, 2);
    assert_eq!(machine.state(), &SelectionState::Idle);

    let records = store.records().expect("records");
    let rows: Vec<(u64, &str, &str)> = records
        .iter()
        .map(|r| (r.id, r.category.as_str(), r.issue.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            (1, "Network", "Residence WiFi Issue"),
            (2, "Cards", "Swipe Issue"),
        ]
    );
}

#[test]
fn failed_append_does_not_block_later_presses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = LogStore::new(dir.path().join("IssueLog.csv"), IdPolicy::Sequential);
    let mut machine = SelectionMachine::new(Catalog::builtin());

    machine.process(KeyEvent::pressed(2), &mut store);
    let outcome = machine.process(KeyEvent::pressed(2), &mut store);
    assert!(matches!(outcome, Outcome::LogFailed { .. }));
    assert_eq!(machine.state(), &SelectionState::Idle);

    store.ensure_initialized().expect("init");
    machine.process(KeyEvent::pressed(2), &mut store);
    let outcome = machine.process(KeyEvent::pressed(2), &mut store);
    let Outcome::Logged(record) = outcome else {
        panic!("expected the retry press to log");
    };
    assert_eq!(record.id, 1);
    assert_eq!(record.issue, "Password Reset Issue");
}
