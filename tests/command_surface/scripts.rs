//! Script registry and SCRIPTRUN.

use crate::common::{db, seed_inputs, values_of};
use tensordb::{Device, Reply};

const SOURCE: &str = "# entry points\ndef bar add\ndef baz mul\n";

#[test]
fn set_get_round_trips_source() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "GPU", "TAG", "v1", SOURCE]).unwrap();
    match db.run_tokens(&["AI.SCRIPTGET", "s"]).unwrap() {
        Reply::ScriptMeta { device, tag, source } => {
            assert_eq!(device, Device::Gpu(None));
            assert_eq!(tag, "v1");
            assert_eq!(source, SOURCE);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn compile_failure_names_the_line() {
    let db = db();
    let err = db
        .run_tokens(&["AI.SCRIPTSET", "s", "CPU", "def bar add\nreturn 1\n"])
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to compile script at line 2");
}

#[test]
fn entry_points_run_independently() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", SOURCE]).unwrap();
    seed_inputs(&db);

    db.run_tokens(&["AI.SCRIPTRUN", "s", "bar", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    let values = values_of(db.run_tokens(&["AI.TENSORGET", "c", "VALUES"]).unwrap());
    assert_eq!(values, vec![4.0, 6.0, 4.0, 6.0]);

    db.run_tokens(&["AI.SCRIPTRUN", "s", "baz", "INPUTS", "a", "b", "OUTPUTS", "c"]).unwrap();
    let values = values_of(db.run_tokens(&["AI.TENSORGET", "c", "VALUES"]).unwrap());
    assert_eq!(values, vec![4.0, 9.0, 4.0, 9.0]);
}

#[test]
fn run_error_taxonomy() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", SOURCE]).unwrap();
    seed_inputs(&db);

    let err = db
        .run_tokens(&["AI.SCRIPTRUN", "nope", "bar", "INPUTS", "a", "OUTPUTS", "c"])
        .unwrap_err();
    assert_eq!(err.to_string(), "script key is empty");

    let err = db
        .run_tokens(&["AI.SCRIPTRUN", "s", "qux", "INPUTS", "a", "OUTPUTS", "c"])
        .unwrap_err();
    assert_eq!(err.to_string(), "undefined script entry point: qux");

    let err = db
        .run_tokens(&["AI.SCRIPTRUN", "s", "bar", "INPUTS", "a", "missing", "OUTPUTS", "c"])
        .unwrap_err();
    assert_eq!(err.to_string(), "Input key is empty");
}

#[test]
fn del_taxonomy() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", SOURCE]).unwrap();
    db.run_tokens(&["AI.SCRIPTDEL", "s"]).unwrap();
    let err = db.run_tokens(&["AI.SCRIPTGET", "s"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot get script from empty key");
    let err = db.run_tokens(&["AI.SCRIPTDEL", "s"]).unwrap_err();
    assert_eq!(err.to_string(), "no script at key");
}
