//! Backend tags, devices, and run types.
//!
//! The backend set is closed: new engines extend the tag enumeration, not a
//! class hierarchy. Tokens are part of the compatibility surface.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The closed set of native inference engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Graph backend: explicit INPUTS/OUTPUTS name lists at SET time.
    Tf,
    /// Compiled-program backend; also hosts interpreted scripts.
    Torch,
    /// Exchange-format backend; names derived from the parsed blob.
    Onnx,
    /// Mobile backend; names derived from the parsed blob.
    Tflite,
}

impl Backend {
    /// Parse a command token into a backend tag.
    pub fn parse_token(token: &str) -> Result<Self> {
        match token {
            "TF" => Ok(Backend::Tf),
            "TORCH" => Ok(Backend::Torch),
            "ONNX" => Ok(Backend::Onnx),
            "TFLITE" => Ok(Backend::Tflite),
            _ => Err(Error::InvalidArgument(format!(
                "unsupported backend: {}",
                token
            ))),
        }
    }

    /// The command token for this backend.
    pub fn token(&self) -> &'static str {
        match self {
            Backend::Tf => "TF",
            Backend::Torch => "TORCH",
            Backend::Onnx => "ONNX",
            Backend::Tflite => "TFLITE",
        }
    }

    /// Only the graph backend takes explicit INPUTS/OUTPUTS lists at SET.
    pub fn requires_declared_names(&self) -> bool {
        matches!(self, Backend::Tf)
    }

    /// Whether this backend tolerates concurrent runs on one device.
    ///
    /// The mobile interpreter is not reentrant; the dispatcher serializes
    /// its runs per device.
    pub fn supports_concurrent_execution(&self) -> bool {
        !matches!(self, Backend::Tflite)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// An opaque execution-target token passed through to the backend.
///
/// `CPU`, `GPU`, or an indexed `GPU:<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// Host CPU
    Cpu,
    /// GPU, optionally indexed
    Gpu(Option<u32>),
}

impl Device {
    /// Parse a command token into a device.
    pub fn parse_token(token: &str) -> Result<Self> {
        if token == "CPU" {
            return Ok(Device::Cpu);
        }
        if token == "GPU" {
            return Ok(Device::Gpu(None));
        }
        if let Some(index) = token.strip_prefix("GPU:") {
            let index: u32 = index
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("unsupported device: {}", token)))?;
            return Ok(Device::Gpu(Some(index)));
        }
        Err(Error::InvalidArgument(format!(
            "unsupported device: {}",
            token
        )))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => f.write_str("CPU"),
            Device::Gpu(None) => f.write_str("GPU"),
            Device::Gpu(Some(index)) => write!(f, "GPU:{}", index),
        }
    }
}

/// Discriminates model and script entries in INFO replies and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunType {
    /// A model value
    Model,
    /// A script value
    Script,
}

impl RunType {
    /// The token reported in INFO's TYPE field.
    pub fn token(&self) -> &'static str {
        match self {
            RunType::Model => "MODEL",
            RunType::Script => "SCRIPT",
        }
    }
}
