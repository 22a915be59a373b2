//! Exchange-format backend (`ONNX`).
//!
//! Exchange blobs are self-describing: input and output names come from the
//! parsed definition, never from the command. The blob is the magic tag
//! `TDX1` followed by a bincode encoding of [`ExchangeDef`].

use crate::ops::{self, OpKind};
use serde::{Deserialize, Serialize};
use tensordb_core::{Error, Result, Tensor};

pub(crate) const MAGIC: &[u8; 4] = b"TDX1";

/// A parsed exchange-format model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDef {
    /// Tool that produced the model, carried as opaque metadata.
    pub producer: String,
    /// Input names in binding order.
    pub inputs: Vec<String>,
    /// Outputs in production order.
    pub outputs: Vec<ExchangeOutput>,
}

/// One output of an exchange-format model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOutput {
    /// Output name derived from the model.
    pub name: String,
    /// Operation folded over all model inputs.
    pub op: OpKind,
}

impl ExchangeDef {
    /// Serialize into the wire blob stored at the key.
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = MAGIC.to_vec();
        blob.extend(bincode::serialize(self).expect("exchange definitions always serialize"));
        blob
    }

    /// Parse a stored blob back into a definition.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let invalid = || Error::BackendValidation("Invalid exchange-format blob".into());
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
