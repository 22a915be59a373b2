//! Graph backend (`TF`).
//!
//! A graph definition is a set of named placeholders plus named op nodes
//! wired by name. The blob is the magic tag `TDG1` followed by a bincode
//! encoding of [`GraphDef`]. This is the only backend whose input and output
//! names are declared at SET time; validation checks the declared names
//! against the parsed graph and reports any failure as `Invalid GraphDef`.

use crate::ops::{self, OpKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tensordb_core::{Error, Result, Tensor};

pub(crate) const MAGIC: &[u8; 4] = b"TDG1";

/// A parsed graph: placeholders feed op nodes, any node can be an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    /// Names the caller binds input tensors to.
    pub placeholders: Vec<String>,
    /// Op nodes in definition order.
    pub nodes: Vec<GraphNode>,
}

/// One op node of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node name, referenced by OUTPUTS and by downstream nodes.
    pub name: String,
    /// Operation applied to the node's inputs.
    pub op: OpKind,
    /// Names of placeholders or upstream nodes feeding this node.
    pub inputs: Vec<String>,
}

impl GraphDef {
    /// Serialize into the wire blob stored at the key.
    pub fn encode(&self) -> Vec<u8> {
        let mut blob = MAGIC.to_vec();
        // GraphDef is plain data; bincode cannot fail on it.
        blob.extend(bincode::serialize(self).expect("graph definitions always serialize"));
        blob
    }

    fn invalid() -> Error {
        Error::BackendValidation("Invalid GraphDef".into())
    }

    /// Parse a stored blob back into a graph.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.len() < MAGIC.len() || &blob[..MAGIC.len()] != MAGIC {
            return Err(Self::invalid());
        }
        bincode::deserialize(&blob[MAGIC.len()..]).map_err(|_| Self::invalid())
    }

    /// Validate a blob against the names declared at SET time.
    pub fn validate(blob: &[u8], inputs: &[String], outputs: &[String]) -> Result<Self> {
        let def = Self::decode(blob)?;
        for name in inputs {
            if !def.placeholders.contains(name) {
                return Err(Self::invalid());
            }
        }
        for name in outputs {
            if !def.nodes.iter().any(|n| &n.name == name) {
                return Err(Self::invalid());
            }
        }
        Ok(def)
    }

    /// Evaluate the requested output nodes against bound inputs.
    pub fn run(&self, inputs: &FxHashMap<String, Tensor>, outputs: &[String]) -> Result<Vec<Tensor>> {
        let mut env: FxHashMap<&str, Tensor> = FxHashMap::default();
        for name in &self.placeholders {
            let bound = inputs.get(name).ok_or_else(|| {
                Error::BackendExecution(format!("placeholder {} is not bound", name))
            })?;
            env.insert(name.as_str(), bound.clone());
        }
        // Nodes are stored in definition order, so one forward pass suffices.
        for node in &self.nodes {
            let mut operands = Vec::with_capacity(node.inputs.len());
            for input in &node.inputs {
                let t = env.get(input.as_str()).ok_or_else(|| {
                    Error::BackendExecution(format!("node input {} is undefined", input))
                })?;
                operands.push(t.clone());
            }
            let refs: Vec<&Tensor> = operands.iter().collect();
            let result = ops::apply(node.op, &refs)?;
            let proto = &operands[0];
            let tensor = Tensor::from_f64(proto.dtype(), proto.shape().to_vec(), &result)?;
            env.insert(node.name.as_str(), tensor);
        }
        outputs
            .iter()
            .map(|name| {
                env.get(name.as_str()).cloned().ok_or_else(|| {
                    Error::BackendExecution(format!("graph has no node named {}", name))
                })
            })
            .collect()
    }
}
