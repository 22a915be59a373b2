//! The public database handle.

use std::path::Path;
use std::sync::Arc;
use tensordb_core::{Result, RunType, Tensor};
use tensordb_engine::{Database, InfoReport, ReplicationSink};
use tensordb_executor::{Executor, Reply};

/// An open TensorDB instance: the engine plus its command surface.
///
/// Clones share the same underlying database.
#[derive(Debug, Clone)]
pub struct TensorDb {
    executor: Executor,
}

impl TensorDb {
    /// Open an in-memory database with the default worker count.
    pub fn new() -> Self {
        TensorDb {
            executor: Executor::new(Arc::new(Database::new())),
        }
    }

    /// Open an in-memory database with an explicit worker count.
    pub fn with_workers(workers: usize) -> Self {
        TensorDb {
            executor: Executor::new(Arc::new(Database::with_workers(workers))),
        }
    }

    /// Execute one tokenized command given as raw byte tokens.
    pub fn run_command(&self, args: &[Vec<u8>]) -> Result<Reply> {
        self.executor.run(args)
    }

    /// Execute one tokenized command given as text tokens. Convenience for
    /// commands without binary blob arguments.
    pub fn run_tokens(&self, args: &[&str]) -> Result<Reply> {
        let raw: Vec<Vec<u8>> = args.iter().map(|a| a.as_bytes().to_vec()).collect();
        self.executor.run(&raw)
    }

    /// Store a tensor directly, bypassing the command surface.
    pub fn tensor_set(&self, key: &str, tensor: Tensor) -> Result<()> {
        self.engine().tensor_set(key, tensor)
    }

    /// Fetch a tensor directly.
    pub fn tensor_get(&self, key: &str) -> Result<Arc<Tensor>> {
        self.engine().tensor_get(key)
    }

    /// INFO view of a model or script key.
    pub fn info(&self, key: &str) -> Result<InfoReport> {
        self.engine().info(key)
    }

    /// Enumerate `(key, tag)` for every model or script, key-sorted.
    pub fn list_entries(&self, run_type: RunType) -> Vec<(String, String)> {
        self.engine().list_entries(run_type)
    }

    /// Write the full keyspace to a snapshot file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        self.engine().save_snapshot(path)
    }

    /// Replace the keyspace with a snapshot's contents.
    pub fn load_snapshot(&self, path: &Path) -> Result<()> {
        self.engine().load_snapshot(path)
    }

    /// Attach a replication sink; current state replays to it first.
    pub fn attach_replica(&self, sink: Arc<dyn ReplicationSink>) {
        self.engine().attach_replica(sink)
    }

    /// The underlying engine, for host integrations that bypass commands.
    pub fn engine(&self) -> &Arc<Database> {
        self.executor.database()
    }
}

impl Default for TensorDb {
    fn default() -> Self {
        Self::new()
    }
}
