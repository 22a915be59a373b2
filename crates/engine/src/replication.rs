//! Replication of state-mutating operations.
//!
//! Every successful mutation is forwarded to attached sinks as a
//! deterministic operation: applying the same op stream to an empty replica
//! reproduces byte-identical tensor buffers and model/script blobs. Stats
//! are operational state and are never replicated.

use serde::{Deserialize, Serialize};
use tensordb_core::{Backend, DType, Device};

/// One deterministic state-mutating operation.
///
/// RUN is not forwarded as a run; its committed output tensors are
/// forwarded as `TensorSet` ops so replicas never re-execute a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MutationOp {
    /// A tensor write (TENSORSET or a RUN output commit).
    TensorSet {
        /// Target key.
        key: String,
        /// Element type.
        dtype: DType,
        /// Ordered dimensions.
        shape: Vec<usize>,
        /// Raw little-endian buffer.
        data: Vec<u8>,
    },
    /// A model write.
    ModelSet {
        /// Target key.
        key: String,
        /// Backend tag.
        backend: Backend,
        /// Execution target.
        device: Device,
        /// Opaque user tag.
        tag: String,
        /// Declared input names (graphs only, empty otherwise).
        inputs: Vec<String>,
        /// Declared output names (graphs only, empty otherwise).
        outputs: Vec<String>,
        /// The original blob.
        blob: Vec<u8>,
    },
    /// A script write.
    ScriptSet {
        /// Target key.
        key: String,
        /// Execution target.
        device: Device,
        /// Opaque user tag.
        tag: String,
        /// The original source text.
        source: String,
    },
    /// A key deletion (MODELDEL, SCRIPTDEL, or host eviction).
    Del {
        /// Target key.
        key: String,
    },
}

impl MutationOp {
    /// The key this op mutates.
    pub fn key(&self) -> &str {
        match self {
            MutationOp::TensorSet { key, .. } => key,
            MutationOp::ModelSet { key, .. } => key,
            MutationOp::ScriptSet { key, .. } => key,
            MutationOp::Del { key } => key,
        }
    }
}

/// Receives the deterministic op stream from a primary.
///
/// The transport is assumed reliable once invoked; a sink failure is the
/// sink's concern and must not fail the originating command.
pub trait ReplicationSink: Send + Sync {
    /// Apply one forwarded operation.
    fn forward(&self, op: &MutationOp);
}
