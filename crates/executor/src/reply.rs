//! Command reply model.
//!
//! The host protocol layer renders these into its own wire shapes; TensorDB
//! only fixes field names and ordering.

use tensordb_core::{Backend, DType, Device, Scalar};
use tensordb_engine::InfoReport;

/// The result of one successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Simple acknowledgement.
    Ok,
    /// TENSORGET META: dtype and shape only.
    TensorMeta {
        /// Element type.
        dtype: DType,
        /// Ordered dimensions.
        shape: Vec<usize>,
    },
    /// TENSORGET VALUES: decoded literals.
    TensorValues {
        /// Element type.
        dtype: DType,
        /// Ordered dimensions.
        shape: Vec<usize>,
        /// Decoded elements in row-major order.
        values: Vec<Scalar>,
    },
    /// TENSORGET BLOB: the raw buffer.
    TensorBlob {
        /// Element type.
        dtype: DType,
        /// Ordered dimensions.
        shape: Vec<usize>,
        /// Raw little-endian buffer.
        data: Vec<u8>,
    },
    /// MODELGET: metadata plus the stored blob.
    ModelMeta {
        /// Backend tag.
        backend: Backend,
        /// Execution target.
        device: Device,
        /// Opaque user tag, empty when unset.
        tag: String,
        /// The stored blob, byte-identical to what MODELSET received.
        blob: Vec<u8>,
    },
    /// SCRIPTGET: metadata plus the stored source.
    ScriptMeta {
        /// Execution target.
        device: Device,
        /// Opaque user tag, empty when unset.
        tag: String,
        /// The stored source, byte-identical to what SCRIPTSET received.
        source: String,
    },
    /// INFO: the flat per-key report.
    Info(InfoReport),
}
