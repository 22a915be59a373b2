//! Backend adapter set for TensorDB.
//!
//! Backends form a closed, tagged capability set behind a single contract:
//! `validate(blob, names) -> handle` and `run(handle, inputs, outputs) ->
//! outputs`. New engines extend [`Backend`] and the [`ModelHandle`] enum,
//! not a class hierarchy. Everything above this crate treats a handle as
//! opaque.

pub mod graph;
pub mod onnx;
pub mod ops;
pub mod tflite;
pub mod torch;

use rustc_hash::FxHashMap;
use tensordb_core::{Backend, Error, Result, Tensor};
use tracing::debug;

pub use graph::{GraphDef, GraphNode};
pub use onnx::{ExchangeDef, ExchangeOutput};
pub use ops::OpKind;
pub use tflite::{MobileDef, MobileOutput};
pub use torch::{ProgramDef, ProgramOutput, ScriptDef};

/// An opaque parsed model, produced by [`validate_model`] and held by the
/// registry until the key is replaced or deleted.
#[derive(Debug, Clone)]
pub enum ModelHandle {
    /// Parsed graph (`TF`).
    Graph(GraphDef),
    /// Parsed compiled program (`TORCH`).
    Program(ProgramDef),
    /// Parsed exchange-format model (`ONNX`).
    Exchange(ExchangeDef),
    /// Parsed mobile model (`TFLITE`).
    Mobile(MobileDef),
}

impl ModelHandle {
    /// Input names carried by the parsed blob (empty for graphs, whose
    /// names are declared at SET time instead).
    pub fn derived_inputs(&self) -> Vec<String> {
        match self {
            ModelHandle::Graph(_) => Vec::new(),
            ModelHandle::Program(def) => def.inputs.clone(),
            ModelHandle::Exchange(def) => def.inputs.clone(),
            ModelHandle::Mobile(def) => def.inputs.clone(),
        }
    }

    /// Output names carried by the parsed blob (empty for graphs).
    pub fn derived_outputs(&self) -> Vec<String> {
        match self {
            ModelHandle::Graph(_) => Vec::new(),
            ModelHandle::Program(def) => def.outputs.iter().map(|o| o.name.clone()).collect(),
            ModelHandle::Exchange(def) => def.outputs.iter().map(|o| o.name.clone()).collect(),
            ModelHandle::Mobile(def) => def.outputs.iter().map(|o| o.name.clone()).collect(),
        }
    }
}

/// Result of one successful adapter run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Produced tensors, one per declared output name, in declaration order.
    pub outputs: Vec<Tensor>,
    /// Adapter-reported sample count for stats accounting.
    pub samples: i64,
}

/// Parse and validate a model blob for `backend`.
///
/// `declared_inputs`/`declared_outputs` are the SET-time name lists; only
/// the graph backend receives non-empty lists, and for it every declared
/// name must exist in the parsed graph.
pub fn validate_model(
    backend: Backend,
    blob: &[u8],
    declared_inputs: &[String],
    declared_outputs: &[String],
) -> Result<ModelHandle> {
    debug!(backend = %backend, blob_len = blob.len(), "validating model blob");
    match backend {
        Backend::Tf => {
            GraphDef::validate(blob, declared_inputs, declared_outputs).map(ModelHandle::Graph)
        }
        Backend::Torch => ProgramDef::decode(blob).map(ModelHandle::Program),
        Backend::Onnx => ExchangeDef::decode(blob).map(ModelHandle::Exchange),
        Backend::Tflite => MobileDef::decode(blob).map(ModelHandle::Mobile),
    }
}

/// Execute a validated model against bound inputs.
///
/// `inputs` pairs each RUN-time input name with its bound tensor, in
/// command order. Graphs bind by name; the other backends bind
/// positionally against their derived input order.
pub fn run_model(
    handle: &ModelHandle,
    inputs: &[(String, Tensor)],
    output_names: &[String],
) -> Result<RunOutcome> {
    let samples = inputs
        .first()
        .map(|(_, t)| t.batch_dim() as i64)
        .ok_or_else(|| Error::BackendExecution("no inputs bound".into()))?;
    let outputs = match handle {
        ModelHandle::Graph(def) => {
            let mut bound: FxHashMap<String, Tensor> = FxHashMap::default();
            for (name, tensor) in inputs {
                bound.insert(name.clone(), tensor.clone());
            }
            def.run(&bound, output_names)?
        }
        ModelHandle::Program(def) => {
            let tensors: Vec<Tensor> = inputs.iter().map(|(_, t)| t.clone()).collect();
            def.run(&tensors)?
        }
        ModelHandle::Exchange(def) => {
            let tensors: Vec<Tensor> = inputs.iter().map(|(_, t)| t.clone()).collect();
            def.run(&tensors)?
        }
        ModelHandle::Mobile(def) => {
            let tensors: Vec<Tensor> = inputs.iter().map(|(_, t)| t.clone()).collect();
            def.run(&tensors)?
        }
    };
    if outputs.len() != output_names.len() {
        return Err(Error::BackendExecution(format!(
            "model produced {} outputs, {} declared",
            outputs.len(),
            output_names.len()
        )));
    }
    Ok(RunOutcome { outputs, samples })
}
