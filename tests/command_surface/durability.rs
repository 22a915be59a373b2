//! Snapshot persistence and replication.

use crate::common::{db, mul_graph_blob, seed_mul_model, values_of};
use std::sync::Arc;
use tensordb::{Database, Reply, TensorDb};

#[test]
fn snapshot_reload_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.snap");

    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", "TAG", "v1", "def bar add"]).unwrap();
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    db.save_snapshot(&path).unwrap();

    let restored = TensorDb::with_workers(1);
    restored.load_snapshot(&path).unwrap();

    for key in ["a", "b", "c"] {
        match (
            restored.run_tokens(&["AI.TENSORGET", key, "BLOB"]).unwrap(),
            db.run_tokens(&["AI.TENSORGET", key, "BLOB"]).unwrap(),
        ) {
            (Reply::TensorBlob { data: restored, .. }, Reply::TensorBlob { data: original, .. }) => {
                assert_eq!(restored, original, "key {}", key)
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
    match restored.run_tokens(&["AI.MODELGET", "m"]).unwrap() {
        Reply::ModelMeta { blob, .. } => assert_eq!(blob, mul_graph_blob()),
        other => panic!("unexpected: {:?}", other),
    }
    match restored.run_tokens(&["AI.SCRIPTGET", "s"]).unwrap() {
        Reply::ScriptMeta { source, tag, .. } => {
            assert_eq!(source, "def bar add");
            assert_eq!(tag, "v1");
        }
        other => panic!("unexpected: {:?}", other),
    }

    // Stats are operational state and start fresh after reload.
    assert_eq!(restored.info("m").unwrap().stats.calls, 0);
    // The reloaded model is runnable.
    restored.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c2"]).unwrap();
    let values = values_of(restored.run_tokens(&["AI.TENSORGET", "c2", "VALUES"]).unwrap());
    assert_eq!(values, vec![4.0, 9.0, 4.0, 9.0]);
}

#[test]
fn corrupt_snapshot_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.snap");

    let db = db();
    seed_mul_model(&db);
    db.save_snapshot(&path).unwrap();
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    let other = crate::common::db();
    other.run_tokens(&["AI.TENSORSET", "keep", "FLOAT", "1", "VALUES", "5"]).unwrap();
    assert!(other.load_snapshot(&path).is_err());
    // Prior state survives a failed load.
    assert!(other.run_tokens(&["AI.TENSORGET", "keep", "META"]).is_ok());
}

#[test]
fn replica_converges_without_reexecution() {
    let primary = db();
    seed_mul_model(&primary);

    let replica = Arc::new(Database::with_workers(1));
    primary.attach_replica(replica.clone());

    // Catch-up replay covers pre-attach state byte for byte.
    assert_eq!(
        replica.tensor_get("a").unwrap().data(),
        primary.tensor_get("a").unwrap().data()
    );
    assert_eq!(replica.model_get("m").unwrap().blob, mul_graph_blob());

    // RUN outputs arrive as tensor writes; the replica never runs a backend,
    // so its stats stay at zero.
    primary.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    assert_eq!(
        replica.tensor_get("c").unwrap().data(),
        primary.tensor_get("c").unwrap().data()
    );
    assert_eq!(replica.info("m").unwrap().stats.calls, 0);

    // Deletes and overwrites propagate.
    primary.run_tokens(&["AI.MODELDEL", "m"]).unwrap();
    assert!(replica.model_get("m").is_err());
    primary.run_tokens(&["AI.TENSORSET", "a", "INT32", "1", "VALUES", "9"]).unwrap();
    assert_eq!(
        replica.tensor_get("a").unwrap().data(),
        primary.tensor_get("a").unwrap().data()
    );
}
