//! The shared keyspace.
//!
//! One namespace holds all value kinds: tensors, models, scripts, and
//! foreign host-native values. Entries are `Arc`ed so a RUN can hold an
//! immutable snapshot of a model while a concurrent SET/DEL replaces the
//! key. Reads are lock-free via DashMap; writes only lock the target shard.
//!
//! Typed accessors fail distinctly for "absent" vs "wrong kind"; the
//! absent-key message varies by command, so callers supply it.

use dashmap::DashMap;
use std::sync::Arc;
use tensordb_backends::{ModelHandle, ScriptDef};
use tensordb_core::{Backend, Device, Error, Result, StatsBlock, Tensor};

/// A model value: metadata, the original blob, the parsed handle, stats.
#[derive(Debug)]
pub struct ModelValue {
    /// Backend tag resolved at SET time.
    pub backend: Backend,
    /// Execution target passed through to the backend.
    pub device: Device,
    /// Opaque user tag, empty when unset.
    pub tag: String,
    /// Resolved input names (declared for graphs, derived otherwise).
    pub inputs: Vec<String>,
    /// Resolved output names (declared for graphs, derived otherwise).
    pub outputs: Vec<String>,
    /// The original blob, byte-identical across reload and replication.
    pub blob: Vec<u8>,
    /// The adapter's parsed handle.
    pub handle: ModelHandle,
    /// Per-key cumulative telemetry.
    pub stats: StatsBlock,
}

/// A script value: device, source text, compiled entry points, stats.
#[derive(Debug)]
pub struct ScriptValue {
    /// Execution target passed through to the interpreter.
    pub device: Device,
    /// Opaque user tag, empty when unset.
    pub tag: String,
    /// The original source, byte-identical across reload and replication.
    pub source: String,
    /// Compiled entry points.
    pub handle: ScriptDef,
    /// Per-key cumulative telemetry. Samples are undefined (-1).
    pub stats: StatsBlock,
}

/// One keyspace slot.
#[derive(Debug, Clone)]
pub enum Entry {
    /// A typed tensor buffer.
    Tensor(Arc<Tensor>),
    /// A validated model.
    Model(Arc<ModelValue>),
    /// A compiled script.
    Script(Arc<ScriptValue>),
    /// A foreign host-native value; TensorDB commands only ever see it as
    /// the wrong kind.
    Foreign(Arc<Vec<u8>>),
}

impl Entry {
    /// Kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Tensor(_) => "tensor",
            Entry::Model(_) => "model",
            Entry::Script(_) => "script",
            Entry::Foreign(_) => "foreign",
        }
    }
}

/// The shared keyspace.
#[derive(Debug, Default)]
pub struct Keyspace {
    slots: DashMap<String, Entry>,
}

impl Keyspace {
    /// Create an empty keyspace.
    pub fn new() -> Self {
        Keyspace {
            slots: DashMap::new(),
        }
    }

    /// Fetch a raw entry.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.slots.get(key).map(|e| e.value().clone())
    }

    /// Store an entry, replacing any prior value of any kind.
    pub fn put(&self, key: &str, entry: Entry) {
        self.slots.insert(key.to_string(), entry);
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&self, key: &str) -> Option<Entry> {
        self.slots.remove(key).map(|(_, e)| e)
    }

    /// Whether any value is stored at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every entry. Used when replacing state from a snapshot.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Snapshot of all entries, sorted by key for deterministic iteration.
    pub fn entries(&self) -> Vec<(String, Entry)> {
        let mut all: Vec<_> = self
            .slots
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.cmp(b));
        all
    }

    /// Typed fetch of a tensor. `absent` is the command-specific message.
    pub fn tensor(&self, key: &str, absent: &str) -> Result<Arc<Tensor>> {
        match self.get(key) {
            None => Err(Error::KeyAbsent(absent.into())),
            Some(Entry::Tensor(t)) => Ok(t),
            Some(_) => Err(Error::KeyWrongType),
        }
    }

    /// Typed fetch of a model. `absent` is the command-specific message.
    pub fn model(&self, key: &str, absent: &str) -> Result<Arc<ModelValue>> {
        match self.get(key) {
            None => Err(Error::KeyAbsent(absent.into())),
            Some(Entry::Model(m)) => Ok(m),
            Some(_) => Err(Error::KeyWrongType),
        }
    }

    /// Typed fetch of a script. `absent` is the command-specific message.
    pub fn script(&self, key: &str, absent: &str) -> Result<Arc<ScriptValue>> {
        match self.get(key) {
            None => Err(Error::KeyAbsent(absent.into())),
            Some(Entry::Script(s)) => Ok(s),
            Some(_) => Err(Error::KeyWrongType),
        }
    }
}
