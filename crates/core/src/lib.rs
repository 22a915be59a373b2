//! Core types for TensorDB.
//!
//! This crate defines the data model shared by every layer:
//! - [`DType`] / [`Tensor`] - typed multi-dimensional buffers
//! - [`Backend`] / [`Device`] - the closed backend tag set and execution targets
//! - [`StatsBlock`] - per-key cumulative execution telemetry
//! - [`Error`] - the canonical error taxonomy
//!
//! Higher layers (backends, engine, executor) build on these types and never
//! redefine them.

pub mod dtype;
pub mod error;
pub mod stats;
pub mod tensor;
pub mod types;

pub use dtype::{DType, Scalar};
pub use error::{Error, Result};
pub use stats::{StatsBlock, StatsSnapshot};
pub use tensor::Tensor;
pub use types::{Backend, Device, RunType};
