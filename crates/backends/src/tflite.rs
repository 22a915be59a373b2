//! Mobile backend (`TFLITE`).
//!
//! Mobile blobs are self-describing like exchange blobs. The interpreter is
//! not reentrant, so the dispatcher serializes runs of this backend per
//! device (see `Backend::supports_concurrent_execution`). The blob is the
//! magic tag `TDL1` followed by a bincode encoding of [`MobileDef`].

use crate::ops::{self, OpKind};
use serde::{Deserialize, Serialize};
use tensordb_core::{Error, Result, Tensor};

pub(crate) const MAGIC: &[u8; 4] = b"TDL1";

/// A parsed mobile model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobileDef {
    /// Flatbuffer-style schema version, carried as opaque metadata.
    pub schema_version: u32,
    /// Input names in binding order.
    pub inputs: Vec<String>,
    /// Outputs in production order.
    pub outputs: Vec<MobileOutput>,
}

/// One output of a mobile model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobileOutput {
    /// Output name derived from the model.
    pub name: String,
    /// Operation folded over all model inputs.
    pub op: OpKind,
}

impl MobileDef {
    /// Serialize into the wire blob stored at the key.
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = MAGIC.to_vec();
        blob.extend(bincode::serialize(self).expect("mobile definitions always serialize"));
        blob
    }

    /// Parse a stored blob back into a definition.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let invalid = || Error::BackendValidation("Invalid mobile model blob".into());
        if blob.len() < MAGIC.len() || &blob[..MAGIC.len()] != MAGIC {
            return Err(invalid());
        }
        bincode::deserialize(&blob[MAGIC.len()..]).map_err(|_| invalid())
    }

    /// Execute against positionally-bound inputs.
    pub fn run(&self, inputs: &[Tensor]) -> Result<Vec<Tensor>> {
        if inputs.len() != self.inputs.len() {
            return Err(Error::BackendExecution(format!(
                "model takes {} inputs, {} bound",
                self.inputs.len(),
                inputs.len()
            )));
        }
        let refs: Vec<&Tensor> = inputs.iter().collect();
        let proto = &inputs[0];
        self.outputs
            .iter()
            .map(|out| {
                let result = ops::apply(out.op, &refs)?;
                Tensor::from_f64(proto.dtype(), proto.shape().to_vec(), &result)
            })
            .collect()
    }
}
