//! Shared fixtures for the command surface suite.

#![allow(dead_code)]

use tensordb::{Reply, Scalar, TensorDb};
use tensordb_backends::{GraphDef, GraphNode, OpKind, ProgramDef, ProgramOutput};

/// A fresh database with test-friendly tracing wired up.
pub fn db() -> TensorDb {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    TensorDb::with_workers(2)
}

pub fn tokens(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

/// A graph multiplying placeholders `a` and `b` into node `mul`.
pub fn mul_graph_blob() -> Vec<u8> {
    GraphDef {
        placeholders: vec!["a".into(), "b".into()],
        nodes: vec![GraphNode {
            name: "mul".into(),
            op: OpKind::Mul,
            inputs: vec!["a".into(), "b".into()],
        }],
    }
    .encode()
}

/// A self-describing program adding its two inputs into `sum`.
pub fn add_program_blob() -> Vec<u8> {
    ProgramDef {
        inputs: vec!["x".into(), "y".into()],
        outputs: vec![ProgramOutput {
            name: "sum".into(),
            op: OpKind::Add,
        }],
    }
    .encode()
}

/// Store the canonical `[2,3,2,3]` float inputs at keys `a` and `b`.
pub fn seed_inputs(db: &TensorDb) {
    for key in ["a", "b"] {
        db.run_tokens(&["AI.TENSORSET", key, "FLOAT", "2", "2", "VALUES", "2", "3", "2", "3"])
            .unwrap();
    }
}

/// Store the mul graph at `m` with inputs seeded.
pub fn seed_mul_model(db: &TensorDb) {
    let mut args = tokens(&["AI.MODELSET", "m", "TF", "CPU", "INPUTS", "a", "b", "OUTPUTS", "mul"]);
    args.push(mul_graph_blob());
    db.run_command(&args).unwrap();
    seed_inputs(db);
}

/// Decode a VALUES reply into f64s.
pub fn values_of(reply: Reply) -> Vec<f64> {
    match reply {
        Reply::TensorValues { values, .. } => values.iter().map(Scalar::as_f64).collect(),
        other => panic!("expected VALUES reply, got {:?}", other),
    }
}
