//! TensorDB: a keyspace store extended with tensors, models and scripts.
//!
//! TensorDB adds three value kinds to a keyspace-oriented store and the
//! commands to create, run, inspect and delete them, executing numerical
//! inference through a closed set of pluggable backend engines.
//!
//! ## Layers
//!
//! - `tensordb-core` - dtypes, tensors, devices, stats, the error taxonomy
//! - `tensordb-backends` - the backend adapter set behind `{validate, run}`
//! - `tensordb-engine` - keyspace, registries, dispatcher, snapshots,
//!   replication
//! - `tensordb-executor` - tokenized command parsing and execution
//!
//! ## Example
//!
//! ```
//! use tensordb::TensorDb;
//!
//! let db = TensorDb::new();
//! db.run_tokens(&["AI.TENSORSET", "a", "FLOAT", "2", "VALUES", "2", "3"]).unwrap();
//! db.run_tokens(&["AI.TENSORSET", "b", "FLOAT", "2", "VALUES", "2", "3"]).unwrap();
//! ```

mod database;

pub use database::TensorDb;
pub use tensordb_core::{
    Backend, DType, Device, Error, Result, RunType, Scalar, StatsSnapshot, Tensor,
};
pub use tensordb_engine::{Database, InfoReport, MutationOp, ReplicationSink};
pub use tensordb_executor::{Command, Executor, Reply, TensorFormat};
