//! Canonical error taxonomy.
//!
//! Every command surfaces exactly one of these variants as its reply. The
//! messages on key-lookup failures vary by command and value kind, so those
//! variants carry the full message rather than formatting it here.

use thiserror::Error;

/// All TensorDB errors.
///
/// The taxonomy is fixed: argument arity, argument parsing, shape mismatch,
/// backend validation, key lookup (absent vs wrong kind), and backend
/// execution. Nothing is silently swallowed and nothing is auto-retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong token/argument count for a command.
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// Bad dtype/device/backend token or unparsable literal.
    #[error("{0}")]
    InvalidArgument(String),

    /// Declared dims do not line up with the supplied payload.
    #[error("{0}")]
    ShapeMismatch(String),

    /// Blob/source failed adapter parsing, or a declared name is absent
    /// from the parsed content.
    #[error("{0}")]
    BackendValidation(String),

    /// Key does not exist. Message varies by command and value kind.
    #[error("{0}")]
    KeyAbsent(String),

    /// Key holds an incompatible value kind.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    KeyWrongType,

    /// Adapter failure during RUN. The call is counted, no output commits.
    #[error("{0}")]
    BackendExecution(String),

    /// I/O error from persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or replication payload could not be encoded/decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persisted data failed an integrity check.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Bug or broken invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for TensorDB operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
