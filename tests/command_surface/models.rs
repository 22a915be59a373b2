//! Model registry and MODELRUN.

use crate::common::{add_program_blob, db, mul_graph_blob, seed_inputs, seed_mul_model, tokens, values_of};
use tensordb::{Backend, Device, Reply};

#[test]
fn mul_graph_end_to_end() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    let values = values_of(db.run_tokens(&["AI.TENSORGET", "c", "VALUES"]).unwrap());
    assert_eq!(values, vec![4.0, 9.0, 4.0, 9.0]);
}

#[test]
fn modelget_returns_stored_blob() {
    let db = db();
    seed_mul_model(&db);
    match db.run_tokens(&["AI.MODELGET", "m"]).unwrap() {
        Reply::ModelMeta {
            backend,
            device,
            blob,
            ..
        } => {
            assert_eq!(backend, Backend::Tf);
            assert_eq!(device, Device::Cpu);
            assert_eq!(blob, mul_graph_blob());
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn graph_backend_requires_name_lists() {
    let db = db();
    let mut args = tokens(&["AI.MODELSET", "m", "TF", "CPU"]);
    args.push(mul_graph_blob());
    let err = db.run_command(&args).unwrap_err();
    assert_eq!(err.to_string(), "INPUTS and OUTPUTS not specified");
}

#[test]
fn other_backends_reject_name_lists() {
    let db = db();
    let mut args = tokens(&["AI.MODELSET", "m", "TORCH", "CPU", "INPUTS", "x", "OUTPUTS", "y"]);
    args.push(add_program_blob());
    let err = db.run_command(&args).unwrap_err();
    assert_eq!(err.to_string(), "INPUTS and OUTPUTS not supported for this backend");
}

#[test]
fn unknown_backend_and_device_tokens() {
    let db = db();
    let err = db.run_tokens(&["AI.MODELSET", "m", "PORCH", "CPU", "blob"]).unwrap_err();
    assert_eq!(err.to_string(), "unsupported backend: PORCH");
    let err = db.run_tokens(&["AI.MODELSET", "m", "TF", "TPU", "blob"]).unwrap_err();
    assert_eq!(err.to_string(), "unsupported device: TPU");
}

#[test]
fn invalid_graph_blob_rejected() {
    let db = db();
    let err = db
        .run_tokens(&["AI.MODELSET", "m", "TF", "CPU", "INPUTS", "a", "OUTPUTS", "b", "junk"])
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid GraphDef");
}

#[test]
fn declared_name_missing_from_graph_rejected() {
    let db = db();
    let mut args = tokens(&["AI.MODELSET", "m", "TF", "CPU", "INPUTS", "a", "zzz", "OUTPUTS", "mul"]);
    args.push(mul_graph_blob());
    assert!(db.run_command(&args).is_err());
}

#[test]
fn program_backend_derives_names_and_runs() {
    let db = db();
    let mut args = tokens(&["AI.MODELSET", "p", "TORCH", "CPU"]);
    args.push(add_program_blob());
    db.run_command(&args).unwrap();
    seed_inputs(&db);
    db.run_tokens(&["AI.MODELRUN", "p", "INPUTS", "a", "b", "OUTPUTS", "sum"]).unwrap();
    let values = values_of(db.run_tokens(&["AI.TENSORGET", "sum", "VALUES"]).unwrap());
    assert_eq!(values, vec![4.0, 6.0, 4.0, 6.0]);
}

#[test]
fn run_error_taxonomy() {
    let db = db();
    seed_mul_model(&db);
    let err = db
        .run_tokens(&["AI.MODELRUN", "nope", "INPUTS", "a", "OUTPUTS", "c"])
        .unwrap_err();
    assert_eq!(err.to_string(), "model key is empty");

    let err = db
        .run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "missing", "OUTPUTS", "c"])
        .unwrap_err();
    assert_eq!(err.to_string(), "Input key is empty");

    let err = db
        .run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c", "d"])
        .unwrap_err();
    assert_eq!(err.to_string(), "number of output keys does not match the model definition");
}

#[test]
fn failed_run_commits_nothing() {
    let db = db();
    seed_mul_model(&db);
    let _ = db
        .run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "missing", "OUTPUTS", "c"])
        .unwrap_err();
    let err = db.run_tokens(&["AI.TENSORGET", "c", "META"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot get tensor from empty key");
}

#[test]
fn del_taxonomy_and_replace() {
    let db = db();
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELDEL", "m"]).unwrap();
    let err = db.run_tokens(&["AI.MODELGET", "m"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot get model from empty key");
    let err = db.run_tokens(&["AI.MODELDEL", "m"]).unwrap_err();
    assert_eq!(err.to_string(), "no model at key");

    // Replace is atomic at the key: old handle stays valid for holders.
    seed_mul_model(&db);
    seed_mul_model(&db);
    db.run_tokens(&["AI.MODELRUN", "m", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
}
