//! Element-wise kernels shared by all backend engines.
//!
//! Kernels compute in f64 and the adapter re-encodes results into the dtype
//! of the first bound input, so a run is deterministic regardless of which
//! backend executed it or on which replica.

use serde::{Deserialize, Serialize};
use tensordb_core::{Error, Result, Tensor};

/// The operation a node or entry point applies to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Element-wise sum over all inputs.
    Add,
    /// Element-wise difference, folded left to right.
    Sub,
    /// Element-wise product over all inputs.
    Mul,
    /// max(x, 0) over a single input.
    Relu,
    /// Pass the single input through unchanged.
    Identity,
}

impl OpKind {
    /// Parse a script-source token into an op.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "add" => Some(OpKind::Add),
            "sub" => Some(OpKind::Sub),
            "mul" => Some(OpKind::Mul),
            "relu" => Some(OpKind::Relu),
            "identity" => Some(OpKind::Identity),
            _ => None,
        }
    }
}

/// Apply `op` over decoded input buffers.
///
/// All inputs must share one shape; a mismatch is an execution error, not a
/// validation error, because shapes are only known once tensors are bound.
pub fn apply(op: OpKind, inputs: &[&Tensor]) -> Result<Vec<f64>> {
    let first = inputs
        .first()
        .ok_or_else(|| Error::BackendExecution("no inputs bound".into()))?;
    for t in &inputs[1..] {
        if t.shape() != first.shape() {
            return Err(Error::BackendExecution(format!(
                "input shape mismatch: {:?} vs {:?}",
                t.shape(),
                first.shape()
            )));
        }
    }

    let unary = matches!(op, OpKind::Relu | OpKind::Identity);
    if unary && inputs.len() != 1 {
        return Err(Error::BackendExecution(format!(
            "{:?} takes exactly one input, got {}",
            op,
            inputs.len()
        )));
    }

    let mut acc = first.as_f64_vec();
    match op {
        OpKind::Identity => {}
        OpKind::Relu => {
            for v in acc.iter_mut() {
                *v = v.max(0.0);
            }
        }
        OpKind::Add | OpKind::Sub | OpKind::Mul => {
            for t in &inputs[1..] {
                for (a, b) in acc.iter_mut().zip(t.as_f64_vec()) {
                    match op {
                        OpKind::Add => *a += b,
                        OpKind::Sub => *a -= b,
                        OpKind::Mul => *a *= b,
                        _ => unreachable!(),
                    }
                }
            }
        }
    }
    Ok(acc)
}
