//! Tensor store commands.

use crate::common::{db, tokens, values_of};
use tensordb::{DType, Error, Reply, Scalar};

#[test]
fn values_round_trip_every_dtype() {
    let cases = [
        ("FLOAT", vec!["2.5", "-3.5"]),
        ("DOUBLE", vec!["2.5", "-3.5"]),
        ("INT8", vec!["-128", "127"]),
        ("INT16", vec!["-300", "300"]),
        ("INT32", vec!["-70000", "70000"]),
        ("INT64", vec!["-5000000000", "5000000000"]),
        ("UINT8", vec!["0", "255"]),
        ("UINT16", vec!["0", "65535"]),
        ("BOOL", vec!["1", "0"]),
    ];
    let db = db();
    for (dtype, literals) in cases {
        let mut args = vec!["AI.TENSORSET", "t", dtype, "2", "VALUES"];
        args.extend(literals.iter().copied());
        db.run_tokens(&args).unwrap();
        match db.run_tokens(&["AI.TENSORGET", "t", "VALUES"]).unwrap() {
            Reply::TensorValues { values, .. } => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                assert_eq!(rendered, literals, "dtype {}", dtype);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}

#[test]
fn blob_round_trips_byte_identical() {
    let db = db();
    let blob: Vec<u8> = (0u8..16).collect();
    let mut args = tokens(&["AI.TENSORSET", "t", "INT32", "2", "2", "BLOB"]);
    args.push(blob.clone());
    db.run_command(&args).unwrap();
    match db.run_tokens(&["AI.TENSORGET", "t", "BLOB"]).unwrap() {
        Reply::TensorBlob { dtype, shape, data } => {
            assert_eq!(dtype, DType::Int32);
            assert_eq!(shape, vec![2, 2]);
            assert_eq!(data, blob);
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn meta_reports_dtype_and_shape() {
    let db = db();
    db.run_tokens(&["AI.TENSORSET", "t", "DOUBLE", "3", "1"]).unwrap();
    assert_eq!(
        db.run_tokens(&["AI.TENSORGET", "t", "META"]).unwrap(),
        Reply::TensorMeta {
            dtype: DType::Double,
            shape: vec![3, 1],
        }
    );
}

#[test]
fn unknown_format_message_is_exact() {
    let db = db();
    db.run_tokens(&["AI.TENSORSET", "t", "FLOAT", "1", "VALUES", "1"]).unwrap();
    let err = db.run_tokens(&["AI.TENSORGET", "t", "unsupported"]).unwrap_err();
    assert_eq!(err.to_string(), "unsupported data format");
}

#[test]
fn parse_error_taxonomy() {
    let db = db();
    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "FLOAT16", "2", "VALUES", "1", "2"])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid data type");

    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "FLOAT", "2", "-1", "VALUES", "1", "2"])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid argument found in tensor shape");

    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "FLOAT", "2", "VALUES", "1", "A"])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid value");

    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "INT8", "2", "VALUES", "1", "1000"])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid value");

    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "FLOAT", "2", "VALUES", "1"])
        .unwrap_err();
    assert!(matches!(err, Error::WrongArity(_)));
}

#[test]
fn huge_shape_product_rejected_without_storing() {
    let db = db();
    let err = db
        .run_tokens(&["AI.TENSORSET", "t", "FLOAT", "4294967296", "4294967296"])
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid argument found in tensor shape");
    // Nothing lands at the key.
    let err = db.run_tokens(&["AI.TENSORGET", "t", "META"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot get tensor from empty key");
}

#[test]
fn blob_length_mismatch_is_shape_error() {
    let db = db();
    let mut args = tokens(&["AI.TENSORSET", "t", "FLOAT", "2", "2", "BLOB"]);
    args.push(vec![0u8; 15]);
    let err = db.run_command(&args).unwrap_err();
    assert_eq!(
        err.to_string(),
        "data length (15) does not match tensor shape and type (16)"
    );
}

#[test]
fn absent_and_wrong_kind_messages() {
    let db = db();
    let err = db.run_tokens(&["AI.TENSORGET", "nope", "META"]).unwrap_err();
    assert_eq!(err.to_string(), "cannot get tensor from empty key");

    db.run_tokens(&["AI.SCRIPTSET", "s", "CPU", "def bar add"]).unwrap();
    let err = db.run_tokens(&["AI.TENSORGET", "s", "META"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "WRONGTYPE Operation against a key holding the wrong kind of value"
    );
}

#[test]
fn set_overwrites_any_prior_kind() {
    let db = db();
    db.run_tokens(&["AI.SCRIPTSET", "k", "CPU", "def bar add"]).unwrap();
    db.run_tokens(&["AI.TENSORSET", "k", "FLOAT", "1", "VALUES", "7"]).unwrap();
    let values = values_of(db.run_tokens(&["AI.TENSORGET", "k", "VALUES"]).unwrap());
    assert_eq!(values, vec![7.0]);
}

#[test]
fn omitted_payload_zero_fills() {
    let db = db();
    db.run_tokens(&["AI.TENSORSET", "t", "INT16", "2", "2"]).unwrap();
    match db.run_tokens(&["AI.TENSORGET", "t", "VALUES"]).unwrap() {
        Reply::TensorValues { values, .. } => {
            assert_eq!(values, vec![Scalar::Int(0); 4]);
        }
        other => panic!("unexpected: {:?}", other),
    }
}
