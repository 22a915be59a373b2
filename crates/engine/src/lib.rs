//! TensorDB engine: keyspace, registries, execution, durability.
//!
//! [`Database`] is the single entry point. It owns:
//! - the shared [`store::Keyspace`] holding tensors, models, scripts and
//!   foreign host values;
//! - the [`dispatch::Dispatcher`] running models and scripts on background
//!   workers;
//! - the replication fan-out: every committed mutation is forwarded to
//!   attached [`replication::ReplicationSink`]s as a deterministic op;
//! - snapshot persistence in the framed format of [`snapshot`].
//!
//! Commands parse elsewhere; this layer takes typed arguments and enforces
//! the registry and execution semantics.

pub mod dispatch;
pub mod replication;
pub mod snapshot;
pub mod store;

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tensordb_backends::{run_model, validate_model, ScriptDef};
use tensordb_core::{Backend, Device, Error, Result, RunType, StatsBlock, StatsSnapshot, Tensor};
use tracing::{debug, info, warn};

pub use dispatch::Dispatcher;
pub use replication::{MutationOp, ReplicationSink};
pub use snapshot::{RecordValue, SnapshotRecord};
pub use store::{Entry, Keyspace, ModelValue, ScriptValue};

/// Flat INFO view of one model or script key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoReport {
    /// The inspected key.
    pub key: String,
    /// MODEL or SCRIPT.
    pub run_type: RunType,
    /// Owning backend; scripts report the program backend.
    pub backend: Backend,
    /// Execution target.
    pub device: Device,
    /// Opaque user tag, empty when unset.
    pub tag: String,
    /// Counter values at inspection time.
    pub stats: StatsSnapshot,
}

/// The TensorDB engine.
pub struct Database {
    keyspace: Arc<Keyspace>,
    dispatcher: Dispatcher,
    sinks: Arc<RwLock<Vec<Arc<dyn ReplicationSink>>>>,
}

impl Database {
    /// Open an in-memory database with the default worker count.
    pub fn new() -> Self {
        Self::with_workers(Dispatcher::DEFAULT_WORKERS)
    }

    /// Open an in-memory database with an explicit worker count.
    pub fn with_workers(workers: usize) -> Self {
        Database {
            keyspace: Arc::new(Keyspace::new()),
            dispatcher: Dispatcher::new(workers),
            sinks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored keys, all kinds included.
    pub fn len(&self) -> usize {
        self.keyspace.len()
    }

    /// Whether the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.keyspace.is_empty()
    }

    // ===== Tensor store =====

    /// Store a tensor, replacing any prior value of any kind.
    pub fn tensor_set(&self, key: &str, tensor: Tensor) -> Result<()> {
        let op = MutationOp::TensorSet {
            key: key.to_string(),
            dtype: tensor.dtype(),
            shape: tensor.shape().to_vec(),
            data: tensor.data().to_vec(),
        };
        self.keyspace.put(key, Entry::Tensor(Arc::new(tensor)));
        self.forward(&op);
        Ok(())
    }

    /// Fetch a tensor.
    pub fn tensor_get(&self, key: &str) -> Result<Arc<Tensor>> {
        self.keyspace.tensor(key, "cannot get tensor from empty key")
    }

    /// Store a foreign host-native value. TensorDB commands only ever see
    /// it as the wrong kind; it still participates in snapshots.
    pub fn foreign_set(&self, key: &str, data: Vec<u8>) {
        self.keyspace.put(key, Entry::Foreign(Arc::new(data)));
    }

    /// Remove a key of any kind, as the host does on eviction.
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.keyspace.remove(key).is_some();
        if removed {
            self.forward(&MutationOp::Del {
                key: key.to_string(),
            });
        }
        removed
    }

    // ===== Model registry =====

    /// Validate and store a model, replacing any prior value atomically.
    ///
    /// The graph backend requires declared INPUTS/OUTPUTS name lists; every
    /// other backend derives its names from the blob and must omit them.
    pub fn model_set(
        &self,
        key: &str,
        backend: Backend,
        device: Device,
        tag: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        blob: Vec<u8>,
    ) -> Result<()> {
        let op = MutationOp::ModelSet {
            key: key.to_string(),
            backend,
            device,
            tag: tag.to_string(),
            inputs: inputs.clone(),
            outputs: outputs.clone(),
            blob: blob.clone(),
        };
        self.install_model(key, backend, device, tag, inputs, outputs, blob)?;
        info!(key, backend = %backend, device = %device, "model stored");
        self.forward(&op);
        Ok(())
    }

    /// Fetch a model's metadata and blob.
    pub fn model_get(&self, key: &str) -> Result<Arc<ModelValue>> {
        self.keyspace.model(key, "cannot get model from empty key")
    }

    /// Delete a model.
    pub fn model_del(&self, key: &str) -> Result<()> {
        match self.keyspace.get(key) {
            None => return Err(Error::KeyAbsent("no model at key".into())),
            Some(Entry::Model(_)) => {}
            Some(_) => return Err(Error::KeyWrongType),
        }
        self.keyspace.remove(key);
        self.forward(&MutationOp::Del {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Run a model against bound tensor keys, committing one output tensor
    /// per output key on success and nothing on failure.
    pub fn model_run(&self, key: &str, input_keys: &[String], output_keys: &[String]) -> Result<()> {
        let model = self.keyspace.model(key, "model key is empty")?;
        if input_keys.is_empty() || output_keys.is_empty() {
            return Err(Error::InvalidArgument(
                "INPUTS and OUTPUTS not specified".into(),
            ));
        }
        // Structural mismatches fail before dispatch and stay out of stats.
        if input_keys.len() != model.inputs.len() {
            return Err(Error::InvalidArgument(
                "number of input keys does not match the model definition".into(),
            ));
        }
        if output_keys.len() != model.outputs.len() {
            return Err(Error::InvalidArgument(
                "number of output keys does not match the model definition".into(),
            ));
        }

        let mut bound = Vec::with_capacity(input_keys.len());
        for (name, input_key) in model.inputs.iter().zip(input_keys) {
            match self.keyspace.tensor(input_key, "Input key is empty") {
                Ok(tensor) => bound.push((name.clone(), (*tensor).clone())),
                Err(err) => {
                    model.stats.record_failure();
                    return Err(err);
                }
            }
        }

        let serialize = !model.backend.supports_concurrent_execution();
        let device = model.device;
        let keyspace = Arc::clone(&self.keyspace);
        let sinks = Arc::clone(&self.sinks);
        let output_keys = output_keys.to_vec();
        self.dispatcher.execute(device, serialize, move || {
            let started = Instant::now();
            match run_model(&model.handle, &bound, &model.outputs) {
                Ok(outcome) => {
                    let elapsed = started.elapsed().as_micros() as u64;
                    commit_outputs(&keyspace, &sinks, &output_keys, outcome.outputs);
                    model.stats.record_success(elapsed, outcome.samples);
                    Ok(())
                }
                Err(err) => {
                    model.stats.record_failure();
                    Err(err)
                }
            }
        })?
    }

    // ===== Script registry =====

    /// Compile and store a script, replacing any prior value atomically.
    pub fn script_set(&self, key: &str, device: Device, tag: &str, source: &str) -> Result<()> {
        let op = MutationOp::ScriptSet {
            key: key.to_string(),
            device,
            tag: tag.to_string(),
            source: source.to_string(),
        };
        self.install_script(key, device, tag, source)?;
        info!(key, device = %device, "script stored");
        self.forward(&op);
        Ok(())
    }

    /// Fetch a script's metadata and source.
    pub fn script_get(&self, key: &str) -> Result<Arc<ScriptValue>> {
        self.keyspace.script(key, "cannot get script from empty key")
    }

    /// Delete a script.
    pub fn script_del(&self, key: &str) -> Result<()> {
        match self.keyspace.get(key) {
            None => return Err(Error::KeyAbsent("no script at key".into())),
            Some(Entry::Script(_)) => {}
            Some(_) => return Err(Error::KeyWrongType),
        }
        self.keyspace.remove(key);
        self.forward(&MutationOp::Del {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Run one script entry point against bound tensor keys.
    pub fn script_run(
        &self,
        key: &str,
        entry: &str,
        input_keys: &[String],
        output_keys: &[String],
    ) -> Result<()> {
        let script = self.keyspace.script(key, "script key is empty")?;
        if input_keys.is_empty() || output_keys.is_empty() {
            return Err(Error::InvalidArgument(
                "INPUTS and OUTPUTS not specified".into(),
            ));
        }
        if !script.handle.has_entry(entry) {
            return Err(Error::InvalidArgument(format!(
                "undefined script entry point: {}",
                entry
            )));
        }

        let mut bound = Vec::with_capacity(input_keys.len());
        for input_key in input_keys {
            match self.keyspace.tensor(input_key, "Input key is empty") {
                Ok(tensor) => bound.push((*tensor).clone()),
                Err(err) => {
                    script.stats.record_failure();
                    return Err(err);
                }
            }
        }

        let device = script.device;
        let keyspace = Arc::clone(&self.keyspace);
        let sinks = Arc::clone(&self.sinks);
        let entry = entry.to_string();
        let declared = output_keys.len();
        let output_keys = output_keys.to_vec();
        self.dispatcher.execute(device, false, move || {
            let started = Instant::now();
            match script.handle.run(&entry, &bound, declared) {
                Ok(outputs) => {
                    let elapsed = started.elapsed().as_micros() as u64;
                    commit_outputs(&keyspace, &sinks, &output_keys, outputs);
                    script.stats.record_success(elapsed, 0);
                    Ok(())
                }
                Err(err) => {
                    script.stats.record_failure();
                    Err(err)
                }
            }
        })?
    }

    // ===== Stats =====

    /// INFO view of a model or script key.
    pub fn info(&self, key: &str) -> Result<InfoReport> {
        match self.keyspace.get(key) {
            Some(Entry::Model(m)) => Ok(InfoReport {
                key: key.to_string(),
                run_type: RunType::Model,
                backend: m.backend,
                device: m.device,
                tag: m.tag.clone(),
                stats: m.stats.snapshot(),
            }),
            Some(Entry::Script(s)) => Ok(InfoReport {
                key: key.to_string(),
                run_type: RunType::Script,
                backend: Backend::Torch,
                device: s.device,
                tag: s.tag.clone(),
                stats: s.stats.snapshot(),
            }),
            _ => Err(Error::KeyAbsent("cannot find run info for key".into())),
        }
    }

    /// Zero a key's counters, leaving its content untouched.
    pub fn reset_stats(&self, key: &str) -> Result<()> {
        match self.keyspace.get(key) {
            Some(Entry::Model(m)) => {
                m.stats.reset();
                Ok(())
            }
            Some(Entry::Script(s)) => {
                s.stats.reset();
                Ok(())
            }
            _ => Err(Error::KeyAbsent("cannot find run info for key".into())),
        }
    }

    /// Enumerate `(key, tag)` for every entry of one run type, key-sorted.
    pub fn list_entries(&self, run_type: RunType) -> Vec<(String, String)> {
        self.keyspace
            .entries()
            .into_iter()
            .filter_map(|(key, entry)| match (run_type, entry) {
                (RunType::Model, Entry::Model(m)) => Some((key, m.tag.clone())),
                (RunType::Script, Entry::Script(s)) => Some((key, s.tag.clone())),
                _ => None,
            })
            .collect()
    }

    // ===== Persistence =====

    /// Write the full keyspace to a snapshot file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let records: Vec<SnapshotRecord> = self
            .keyspace
            .entries()
            .into_iter()
            .map(|(key, entry)| SnapshotRecord {
                key,
                value: match entry {
                    Entry::Tensor(t) => RecordValue::Tensor {
                        dtype: t.dtype(),
                        shape: t.shape().to_vec(),
                        data: t.data().to_vec(),
                    },
                    Entry::Model(m) => RecordValue::Model {
                        backend: m.backend,
                        device: m.device,
                        tag: m.tag.clone(),
                        inputs: m.inputs.clone(),
                        outputs: m.outputs.clone(),
                        blob: m.blob.clone(),
                    },
                    Entry::Script(s) => RecordValue::Script {
                        device: s.device,
                        tag: s.tag.clone(),
                        source: s.source.clone(),
                    },
                    Entry::Foreign(data) => RecordValue::Foreign {
                        data: (*data).clone(),
                    },
                },
            })
            .collect();
        snapshot::write(path, &records)
    }

    /// Replace the keyspace with a snapshot's contents.
    ///
    /// All records revalidate before any existing state is dropped, so a
    /// bad file leaves the database untouched. Stats start fresh.
    pub fn load_snapshot(&self, path: &Path) -> Result<()> {
        let records = snapshot::read(path)?;
        let mut staged = Vec::with_capacity(records.len());
        for record in records {
            let entry = match record.value {
                RecordValue::Tensor { dtype, shape, data } => {
                    Entry::Tensor(Arc::new(Tensor::from_blob(dtype, shape, data)?))
                }
                RecordValue::Model {
                    backend,
                    device,
                    tag,
                    inputs,
                    outputs,
                    blob,
                } => {
                    let handle = validate_model(backend, &blob, &inputs, &outputs)?;
                    Entry::Model(Arc::new(ModelValue {
                        backend,
                        device,
                        tag,
                        inputs,
                        outputs,
                        blob,
                        handle,
                        stats: StatsBlock::new(),
                    }))
                }
                RecordValue::Script { device, tag, source } => {
                    let handle = ScriptDef::compile(&source)?;
                    Entry::Script(Arc::new(ScriptValue {
                        device,
                        tag,
                        source,
                        handle,
                        stats: StatsBlock::without_samples(),
                    }))
                }
                RecordValue::Foreign { data } => Entry::Foreign(Arc::new(data)),
            };
            staged.push((record.key, entry));
        }
        self.keyspace.clear();
        let count = staged.len();
        for (key, entry) in staged {
            self.keyspace.put(&key, entry);
        }
        info!(path = %path.display(), records = count, "snapshot loaded");
        Ok(())
    }

    // ===== Replication =====

    /// Attach a sink, replaying the current keyspace to it first so a fresh
    /// replica converges before live ops arrive. Foreign values stay local.
    pub fn attach_replica(&self, sink: Arc<dyn ReplicationSink>) {
        for (key, entry) in self.keyspace.entries() {
            let op = match entry {
                Entry::Tensor(t) => MutationOp::TensorSet {
                    key,
                    dtype: t.dtype(),
                    shape: t.shape().to_vec(),
                    data: t.data().to_vec(),
                },
                Entry::Model(m) => MutationOp::ModelSet {
                    key,
                    backend: m.backend,
                    device: m.device,
                    tag: m.tag.clone(),
                    inputs: m.inputs.clone(),
                    outputs: m.outputs.clone(),
                    blob: m.blob.clone(),
                },
                Entry::Script(s) => MutationOp::ScriptSet {
                    key,
                    device: s.device,
                    tag: s.tag.clone(),
                    source: s.source.clone(),
                },
                Entry::Foreign(_) => continue,
            };
            sink.forward(&op);
        }
        self.sinks.write().push(sink);
    }

    /// Apply one replicated op to this database's keyspace.
    pub fn apply_op(&self, op: &MutationOp) -> Result<()> {
        debug!(key = op.key(), "applying replicated op");
        match op {
            MutationOp::TensorSet {
                key,
                dtype,
                shape,
                data,
            } => {
                let tensor = Tensor::from_blob(*dtype, shape.clone(), data.clone())?;
                self.keyspace.put(key, Entry::Tensor(Arc::new(tensor)));
            }
            MutationOp::ModelSet {
                key,
                backend,
                device,
                tag,
                inputs,
                outputs,
                blob,
            } => {
                self.install_model(
                    key,
                    *backend,
                    *device,
                    tag,
                    inputs.clone(),
                    outputs.clone(),
                    blob.clone(),
                )?;
            }
            MutationOp::ScriptSet {
                key,
                device,
                tag,
                source,
            } => {
                self.install_script(key, *device, tag, source)?;
            }
            MutationOp::Del { key } => {
                self.keyspace.remove(key);
            }
        }
        Ok(())
    }

    // ===== Internals =====

    /// Validate and store a model without forwarding.
    fn install_model(
        &self,
        key: &str,
        backend: Backend,
        device: Device,
        tag: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        blob: Vec<u8>,
    ) -> Result<()> {
        if backend.requires_declared_names() && (inputs.is_empty() || outputs.is_empty()) {
            return Err(Error::InvalidArgument(
                "INPUTS and OUTPUTS not specified".into(),
            ));
        }
        if !backend.requires_declared_names() && (!inputs.is_empty() || !outputs.is_empty()) {
            return Err(Error::InvalidArgument(
                "INPUTS and OUTPUTS not supported for this backend".into(),
            ));
        }
        let handle = validate_model(backend, &blob, &inputs, &outputs)?;
        let (inputs, outputs) = if backend.requires_declared_names() {
            (inputs, outputs)
        } else {
            (handle.derived_inputs(), handle.derived_outputs())
        };
        self.keyspace.put(
            key,
            Entry::Model(Arc::new(ModelValue {
                backend,
                device,
                tag: tag.to_string(),
                inputs,
                outputs,
                blob,
                handle,
                stats: StatsBlock::new(),
            })),
        );
        Ok(())
    }

    /// Compile and store a script without forwarding.
    fn install_script(&self, key: &str, device: Device, tag: &str, source: &str) -> Result<()> {
        let handle = ScriptDef::compile(source)?;
        self.keyspace.put(
            key,
            Entry::Script(Arc::new(ScriptValue {
                device,
                tag: tag.to_string(),
                source: source.to_string(),
                handle,
                stats: StatsBlock::without_samples(),
            })),
        );
        Ok(())
    }

    fn forward(&self, op: &MutationOp) {
        forward_to(&self.sinks, op);
    }
}

fn commit_outputs(
    keyspace: &Keyspace,
    sinks: &RwLock<Vec<Arc<dyn ReplicationSink>>>,
    output_keys: &[String],
    outputs: Vec<Tensor>,
) {
    for (key, tensor) in output_keys.iter().zip(outputs) {
        let op = MutationOp::TensorSet {
            key: key.clone(),
            dtype: tensor.dtype(),
            shape: tensor.shape().to_vec(),
            data: tensor.data().to_vec(),
        };
        keyspace.put(key, Entry::Tensor(Arc::new(tensor)));
        forward_to(sinks, &op);
    }
}

fn forward_to(sinks: &RwLock<Vec<Arc<dyn ReplicationSink>>>, op: &MutationOp) {
    for sink in sinks.read().iter() {
        sink.forward(op);
    }
}

impl ReplicationSink for Database {
    /// A database can serve as a replica: forwarded ops apply directly.
    fn forward(&self, op: &MutationOp) {
        if let Err(err) = self.apply_op(op) {
            warn!(key = op.key(), %err, "replicated op failed to apply");
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("keys", &self.keyspace.len())
            .finish()
    }
}
