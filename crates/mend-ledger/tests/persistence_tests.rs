use mend_ledger::{FixContext, Ledger, LedgerError};
use mend_patterns::PatternId;

fn ctx(duration_ms: u64, desc: &str) -> FixContext {
    FixContext {
        duration_ms,
        message: "connect ECONNREFUSED 127.0.0.1:5432".to_owned(),
        fix_description: desc.to_owned(),
    }
}

#[test]
fn reload_reproduces_success_rates_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let db = PatternId::new("db-connection-refused");
    let build = PatternId::new("build-compile-failed");
    {
        let ledger = Ledger::open(&path).unwrap();
        for i in 0..7 {
            ledger.record_fix(&db, i % 3 == 0, ctx(40 + i, "reconnect")).unwrap();
        }
        for i in 0..4 {
            ledger.record_fix(&build, i % 2 == 0, ctx(900, "rebuild")).unwrap();
        }
        assert_eq!(ledger.success_rate(&db), 3.0 / 7.0);
        assert_eq!(ledger.success_rate(&build), 0.5);
    }

    let reloaded = Ledger::open(&path).unwrap();
    assert_eq!(reloaded.success_rate(&db), 3.0 / 7.0);
    assert_eq!(reloaded.success_rate(&build), 0.5);

    let summary = reloaded.aggregate();
    assert_eq!(summary.patterns, 2);
    assert_eq!(summary.total_attempts, 11);
    assert_eq!(summary.total_successes + summary.total_failures, 11);
}

#[test]
fn reload_preserves_history_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let p = PatternId::new("test-timeout");
    {
        let ledger = Ledger::open(&path).unwrap();
        ledger.record_fix(&p, false, ctx(1, "first")).unwrap();
        ledger.record_fix(&p, true, ctx(2, "second")).unwrap();
    }

    let reloaded = Ledger::open(&path).unwrap();
    let recent = reloaded.recent_history(10);
    assert_eq!(recent.len(), 2);
    // Newest first.
    assert_eq!(recent[0].fix_applied, "second");
    assert!(recent[0].success);
    assert_eq!(recent[1].fix_applied, "first");
    assert!(!recent[1].success);
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(dir.path().join("does-not-exist.json")).unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn corrupt_file_is_an_error_not_a_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(&path, b"{ not json").unwrap();
    match Ledger::open(&path) {
        Err(LedgerError::Corrupt { .. }) => {}
        other => panic!("expected Corrupt, got {other:?}"),
    }
}

#[test]
fn no_temp_file_left_behind_after_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let ledger = Ledger::open(&path).unwrap();
    ledger
        .record_fix(&PatternId::new("p"), true, ctx(3, "fix"))
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["ledger.json".to_owned()]);
}
