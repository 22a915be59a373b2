//! Command execution over a [`Database`].

use crate::parse::{self, Command, TensorFormat};
use crate::reply::Reply;
use std::sync::Arc;
use tensordb_core::Result;
use tensordb_engine::Database;
use tracing::debug;

/// Executes parsed commands against one database.
#[derive(Debug, Clone)]
pub struct Executor {
    db: Arc<Database>,
}

impl Executor {
    /// Wrap a database.
    pub fn new(db: Arc<Database>) -> Self {
        Executor { db }
    }

    /// The wrapped database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Parse and execute one tokenized command.
    pub fn run(&self, args: &[Vec<u8>]) -> Result<Reply> {
        self.execute(parse::parse(args)?)
    }

    /// Execute an already parsed command.
    pub fn execute(&self, command: Command) -> Result<Reply> {
        debug!(?command, "executing command");
        match command {
            Command::TensorSet { key, tensor } => {
                self.db.tensor_set(&key, tensor)?;
                Ok(Reply::Ok)
            }
            Command::TensorGet { key, format } => {
                let tensor = self.db.tensor_get(&key)?;
                Ok(match format {
                    TensorFormat::Meta => Reply::TensorMeta {
                        dtype: tensor.dtype(),
                        shape: tensor.shape().to_vec(),
                    },
                    TensorFormat::Values => Reply::TensorValues {
                        dtype: tensor.dtype(),
                        shape: tensor.shape().to_vec(),
                        values: tensor.values(),
                    },
                    TensorFormat::Blob => Reply::TensorBlob {
                        dtype: tensor.dtype(),
                        shape: tensor.shape().to_vec(),
                        data: tensor.data().to_vec(),
                    },
                })
            }
            Command::ModelSet {
                key,
                backend,
                device,
                tag,
                inputs,
                outputs,
                blob,
            } => {
                self.db
                    .model_set(&key, backend, device, &tag, inputs, outputs, blob)?;
                Ok(Reply::Ok)
            }
            Command::ModelGet { key } => {
                let model = self.db.model_get(&key)?;
                Ok(Reply::ModelMeta {
                    backend: model.backend,
                    device: model.device,
                    tag: model.tag.clone(),
                    blob: model.blob.clone(),
                })
            }
            Command::ModelDel { key } => {
                self.db.model_del(&key)?;
                Ok(Reply::Ok)
            }
            Command::ModelRun { key, inputs, outputs } => {
                self.db.model_run(&key, &inputs, &outputs)?;
                Ok(Reply::Ok)
            }
            Command::ScriptSet {
                key,
                device,
                tag,
                source,
            } => {
                self.db.script_set(&key, device, &tag, &source)?;
                Ok(Reply::Ok)
            }
            Command::ScriptGet { key } => {
                let script = self.db.script_get(&key)?;
                Ok(Reply::ScriptMeta {
                    device: script.device,
                    tag: script.tag.clone(),
                    source: script.source.clone(),
                })
            }
            Command::ScriptDel { key } => {
                self.db.script_del(&key)?;
                Ok(Reply::Ok)
            }
            Command::ScriptRun {
                key,
                entry,
                inputs,
                outputs,
            } => {
                self.db.script_run(&key, &entry, &inputs, &outputs)?;
                Ok(Reply::Ok)
            }
            Command::Info { key, reset } => {
                if reset {
                    self.db.reset_stats(&key)?;
                    Ok(Reply::Ok)
                } else {
                    Ok(Reply::Info(self.db.info(&key)?))
                }
            }
        }
    }
}
