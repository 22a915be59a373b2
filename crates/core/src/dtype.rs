//! Tensor element types.
//!
//! The dtype token set is part of the compatibility surface: `FLOAT`,
//! `DOUBLE`, `INT8`..`INT64`, `UINT8`, `UINT16`, `BOOL`. Literal parsing
//! distinguishes int and float parse failures internally but both surface
//! as "invalid value".

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Element type of a tensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit IEEE-754 float (`FLOAT`)
    Float,
    /// 64-bit IEEE-754 float (`DOUBLE`)
    Double,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    Uint8,
    /// 16-bit unsigned integer
    Uint16,
    /// Boolean, stored as one byte per element
    Bool,
}

impl DType {
    /// Parse a command token into a dtype.
    pub fn parse_token(token: &str) -> Result<Self> {
        match token {
            "FLOAT" => Ok(DType::Float),
            "DOUBLE" => Ok(DType::Double),
            "INT8" => Ok(DType::Int8),
            "INT16" => Ok(DType::Int16),
            "INT32" => Ok(DType::Int32),
            "INT64" => Ok(DType::Int64),
            "UINT8" => Ok(DType::Uint8),
            "UINT16" => Ok(DType::Uint16),
            "BOOL" => Ok(DType::Bool),
            _ => Err(Error::InvalidArgument("invalid data type".into())),
        }
    }

    /// The command token for this dtype.
    pub fn token(&self) -> &'static str {
        match self {
            DType::Float => "FLOAT",
            DType::Double => "DOUBLE",
            DType::Int8 => "INT8",
            DType::Int16 => "INT16",
            DType::Int32 => "INT32",
            DType::Int64 => "INT64",
            DType::Uint8 => "UINT8",
            DType::Uint16 => "UINT16",
            DType::Bool => "BOOL",
        }
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            DType::Float | DType::Int32 => 4,
            DType::Double | DType::Int64 => 8,
            DType::Int8 | DType::Uint8 | DType::Bool => 1,
            DType::Int16 | DType::Uint16 => 2,
        }
    }

    /// Whether values of this dtype are floating point.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float | DType::Double)
    }

    /// Parse one literal as this dtype.
    ///
    /// Int and float parses fail differently under the hood but both report
    /// "invalid value", matching the historical surface.
    pub fn parse_literal(&self, literal: &str) -> Result<Scalar> {
        let invalid = || Error::InvalidArgument("invalid value".into());
        if self.is_float() {
            let v: f64 = literal.parse().map_err(|_| invalid())?;
            Ok(Scalar::Float(v))
        } else if *self == DType::Bool {
            match literal {
                "0" | "false" => Ok(Scalar::Bool(false)),
                "1" | "true" => Ok(Scalar::Bool(true)),
                _ => Err(invalid()),
            }
        } else {
            let v: i64 = literal.parse().map_err(|_| invalid())?;
            if !self.fits(v) {
                return Err(invalid());
            }
            Ok(Scalar::Int(v))
        }
    }

    fn fits(&self, v: i64) -> bool {
        match self {
            DType::Int8 => i8::try_from(v).is_ok(),
            DType::Int16 => i16::try_from(v).is_ok(),
            DType::Int32 => i32::try_from(v).is_ok(),
            DType::Int64 => true,
            DType::Uint8 => u8::try_from(v).is_ok(),
            DType::Uint16 => u16::try_from(v).is_ok(),
            _ => true,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// One decoded tensor element.
///
/// Integer dtypes decode to `Int`, float dtypes to `Float`, `BOOL` to `Bool`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Signed integer element (any int/uint dtype)
    Int(i64),
    /// Floating point element
    Float(f64),
    /// Boolean element
    Bool(bool),
}

impl Scalar {
    /// Numeric view used by backend kernels.
    pub fn as_f64(&self) -> f64 {
        match self {
            Scalar::Int(v) => *v as f64,
            Scalar::Float(v) => *v,
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(b) => write!(f, "{}", *b as u8),
        }
    }
}
