//! Compiled-program backend (`TORCH`) and the script interpreter it hosts.
//!
//! A compiled program carries its own input and output names; MODELSET for
//! this backend must not declare name lists. Scripts are line-oriented
//! textual source compiled into a set of named entry points, each resolved
//! by name at SCRIPTRUN time.

use crate::ops::{self, OpKind};
use serde::{Deserialize, Serialize};
use tensordb_core::{Error, Result, Tensor};

pub(crate) const MAGIC: &[u8; 4] = b"TDP1";

/// A compiled program: self-describing input/output names plus one op per
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDef {
    /// Input names in binding order.
    pub inputs: Vec<String>,
    /// Outputs in production order.
    pub outputs: Vec<ProgramOutput>,
}

/// One produced output of a compiled program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutput {
    /// Output name derived from the program itself.
    pub name: String,
    /// Operation folded over all program inputs.
    pub op: OpKind,
}

impl ProgramDef {
    /// Serialize into the wire blob stored at the key.
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = MAGIC.to_vec();
        blob.extend(bincode::serialize(self).expect("program definitions always serialize"));
        blob
    }

    /// Parse a stored blob back into a program.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let invalid = || Error::BackendValidation("Invalid program blob".into());
        if blob.len() < MAGIC.len() || &blob[..MAGIC.len()] != MAGIC {
            return Err(invalid());
        }
        bincode::deserialize(&blob[MAGIC.len()..]).map_err(|_| invalid())
    }

    /// Execute: inputs are bound positionally against the program's
    /// declared input order.
    pub fn run(&self, inputs: &[Tensor]) -> Result<Vec<Tensor>> {
        if inputs.len() != self.inputs.len() {
            return Err(Error::BackendExecution(format!(
                "program takes {} inputs, {} bound",
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

/// A compiled script: named entry points over a shared source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptDef {
    entries: Vec<(String, OpKind)>,
}

impl ScriptDef {
    /// Compile line-oriented source.
    ///
    /// Each non-empty, non-comment line is `def <name> <op>`. Anything else
    /// fails compilation.
    pub fn compile(source: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (lineno, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (def, name, op) = (parts.next(), parts.next(), parts.next());
            let compiled = match (def, name, op, parts.next()) {
                (Some("def"), Some(name), Some(op), None) => {
                    OpKind::parse_token(op).map(|op| (name.to_string(), op))
                }
                _ => None,
            };
            match compiled {
                Some(entry) => entries.push(entry),
                None => {
                    return Err(Error::BackendValidation(format!(
                        "failed to compile script at line {}",
                        lineno + 1
                    )))
                }
            }
        }
        if entries.is_empty() {
            return Err(Error::BackendValidation(
                "failed to compile script: no entry points".into(),
            ));
        }
        Ok(ScriptDef { entries })
    }

    /// Whether the source defines `entry`.
    pub fn has_entry(&self, entry: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == entry)
    }

    /// Execute one entry point. The entry produces a single tensor;
    /// `declared_outputs` beyond one is an execution failure.
    pub fn run(&self, entry: &str, inputs: &[Tensor], declared_outputs: usize) -> Result<Vec<Tensor>> {
        let (_, op) = self
            .entries
            .iter()
            .find(|(name, _)| name == entry)
            .ok_or_else(|| {
                Error::BackendExecution(format!("undefined script entry point: {}", entry))
            })?;
        if declared_outputs != 1 {
            return Err(Error::BackendExecution(format!(
                "script entry produced 1 outputs, {} declared",
                declared_outputs
            )));
        }
        let refs: Vec<&Tensor> = inputs.iter().collect();
        let result = ops::apply(*op, &refs)?;
        let proto = inputs
            .first()
            .ok_or_else(|| Error::BackendExecution("no inputs bound".into()))?;
        Ok(vec![Tensor::from_f64(
            proto.dtype(),
            proto.shape().to_vec(),
            &result,
        )?])
    }
}
