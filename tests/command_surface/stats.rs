//! INFO, RESETSTAT, and counter accounting.

use crate::common::{db, seed_inputs, seed_mul_model};
use tensordb::{Backend, Reply, RunType, StatsSnapshot};

fn info(db: &tensordb::TensorDb, key: &str) -> StatsSnapshot {
    match db.run_tokens(&["AI.INFO", key]).unwrap() {
        Reply::Info(report) => report.stats,
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn model_counters_accumulate() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();

    let snap = info(&db, "m");
    assert_eq!(snap.calls, 2);
    assert_eq!(snap.errors, 0);
    // SAMPLES accumulates the leading dimension of the first input.
    assert_eq!(snap.samples, 4);
}

#[test]
fn duration_is_monotone() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    let first = info(&db, "m").duration_us;
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    assert!(info(&db, "m").duration_us >= first);
}

#[test]
fn failed_binding_counts_structural_does_not() {
    let db = db();
    seed_mul_model(&db);

    // Input resolution failure is a counted call.
    let _ = db
        .run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "missing", "OUTPUTS", "c"])
        .unwrap_err();
    let snap = info(&db, "m");
    assert_eq!((snap.calls, snap.errors), (1, 1));

    // A structural mismatch fails before dispatch and stays out of stats.
    let _ = db
        .run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c", "d"])
        .unwrap_err();
    let snap = info(&db, "m");
    assert_eq!((snap.calls, snap.errors), (1, 1));
}

#[test]
fn script_output_arity_failure_is_counted() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", "def bar add"]).unwrap();
    seed_inputs(&db);
    // The entry produces one tensor; two declared outputs fail at run time.
    let _ = db
        .run_tokens(&["AI.SCRIPTRUN", "s", "bar", "INPUTS", "a", "b", "OUTPUTS", "c", "d"])
        .unwrap_err();
    let snap = info(&db, "s");
    assert_eq!((snap.calls, snap.errors), (1, 1));
    assert_eq!(snap.samples, -1);
}

#[test]
fn resetstat_zeroes_and_preserves_content() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    assert_eq!(db.run_tokens(&["AI.INFO", "m", "RESETSTAT"]).unwrap(), Reply::Ok);

    let snap = info(&db, "m");
    assert_eq!(snap, StatsSnapshot { duration_us: 0, samples: 0, calls: 0, errors: 0 });
    // The model still runs after the reset.
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    assert_eq!(info(&db, "m").calls, 1);
}

#[test]
fn info_identity_fields() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "GPU:1", "TAG", "v3", "def bar add"]).unwrap();
    match db.run_tokens(&["AI.INFO", "s"]).unwrap() {
        Reply::Info(report) => {
            assert_eq!(report.key, "s");
            assert_eq!(report.run_type, RunType::Script);
            assert_eq!(report.backend, Backend::Torch);
            assert_eq!(report.device.to_string(), "GPU:1");
            assert_eq!(report.tag, "v3");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn info_absent_key_message() {
    let db = db();
    let err = db.run_tokens(&["AI.INFO", "nope"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot find run info for key");
    db.run_tokens(&["AI.TENSORSET", "t", "FLOAT", "1", "VALUES", "1"]).unwrap();
    let err = db.run_tokens(&["AI.INFO", "t"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot find run info for key");
}

#[test]
fn list_entries_by_run_type() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", "TAG", "v1", "def bar add"]).unwrap();
    assert_eq!(db.list_entries(RunType::Model), vec![("m".to_string(), String::new())]);
    assert_eq!(db.list_entries(RunType::Script), vec![("s".to_string(), "v1".to_string())]);
}
