//! Typed, shaped, contiguous tensor buffers.
//!
//! A tensor is `{dtype, shape, data}` with the invariant
//! `data.len() == shape.product() * dtype.size()`. Elements are stored
//! little-endian in row-major order; the byte buffer is the canonical
//! representation for persistence and replication, so encode/decode must be
//! deterministic across hosts.

use crate::dtype::{DType, Scalar};
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// A typed multi-dimensional buffer stored as a first-class keyspace value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

/// Validate a declared shape: at least one dimension, each positive.
pub fn check_shape(shape: &[usize]) -> Result<()> {
    if shape.is_empty() || shape.iter().any(|&d| d == 0) {
        return Err(shape_error());
    }
    Ok(())
}

/// Element count of a shape. Dimensions are user-supplied, so the product
/// must not wrap: a shape whose product overflows is rejected, never stored.
pub fn element_count(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(shape_error)
}

/// Byte size of a buffer with this dtype and shape, overflow-checked.
pub fn byte_size(dtype: DType, shape: &[usize]) -> Result<usize> {
    element_count(shape)?
        .checked_mul(dtype.size())
        .ok_or_else(shape_error)
}

fn shape_error() -> Error {
    Error::InvalidArgument("invalid argument found in tensor shape".into())
}

impl Tensor {
    /// Build a tensor from decoded scalars.
    ///
    /// The caller guarantees `scalars.len()` equals the element count; the
    /// token parser enforces that as an arity error before literals are
    /// decoded.
    pub fn from_scalars(dtype: DType, shape: Vec<usize>, scalars: &[Scalar]) -> Result<Self> {
        check_shape(&shape)?;
        let count = element_count(&shape)?;
        if scalars.len() != count {
            return Err(Error::Internal(format!(
                "scalar count {} does not match shape {:?}",
                scalars.len(),
                shape
            )));
        }
        let mut data = vec![0u8; byte_size(dtype, &shape)?];
        for (i, s) in scalars.iter().enumerate() {
            encode_element(dtype, &mut data[i * dtype.size()..], s);
        }
        Ok(Tensor { dtype, shape, data })
    }

    /// Build a tensor from a raw byte blob.
    ///
    /// The blob length must equal the computed byte size exactly.
    pub fn from_blob(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        check_shape(&shape)?;
        let expected = byte_size(dtype, &shape)?;
        if data.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "data length ({}) does not match tensor shape and type ({})",
                data.len(),
                expected
            )));
        }
        Ok(Tensor { dtype, shape, data })
    }

    /// Build a tensor by encoding an f64 kernel result into `dtype`.
    ///
    /// Used by backend adapters to hand results back in the dtype the run
    /// was bound with. Values are truncated toward zero for integer dtypes,
    /// matching native engine casts.
    pub fn from_f64(dtype: DType, shape: Vec<usize>, values: &[f64]) -> Result<Self> {
        check_shape(&shape)?;
        let count = element_count(&shape)?;
        if values.len() != count {
            return Err(Error::Internal(format!(
                "kernel produced {} elements for shape {:?}",
                values.len(),
                shape
            )));
        }
        let mut data = vec![0u8; byte_size(dtype, &shape)?];
        for (i, &v) in values.iter().enumerate() {
            let scalar = if dtype.is_float() {
                Scalar::Float(v)
            } else if dtype == DType::Bool {
                Scalar::Bool(v != 0.0)
            } else {
                Scalar::Int(v as i64)
            };
            encode_element(dtype, &mut data[i * dtype.size()..], &scalar);
        }
        Ok(Tensor { dtype, shape, data })
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Ordered dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw little-endian buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Total buffer size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Leading dimension, reported by adapters as the sample count.
    pub fn batch_dim(&self) -> usize {
        self.shape[0]
    }

    /// Decode the buffer into a literal sequence.
    pub fn values(&self) -> Vec<Scalar> {
        let size = self.dtype.size();
        self.data
            .chunks_exact(size)
            .map(|chunk| decode_element(self.dtype, chunk))
            .collect()
    }

    /// Numeric view for backend kernels.
    pub fn as_f64_vec(&self) -> Vec<f64> {
        self.values().iter().map(Scalar::as_f64).collect()
    }
}

fn encode_element(dtype: DType, out: &mut [u8], scalar: &Scalar) {
    match dtype {
        DType::Float => LittleEndian::write_f32(out, scalar.as_f64() as f32),
        DType::Double => LittleEndian::write_f64(out, scalar.as_f64()),
        DType::Int8 => out[0] = (scalar_int(scalar) as i8) as u8,
        DType::Int16 => LittleEndian::write_i16(out, scalar_int(scalar) as i16),
        DType::Int32 => LittleEndian::write_i32(out, scalar_int(scalar) as i32),
        DType::Int64 => LittleEndian::write_i64(out, scalar_int(scalar)),
        DType::Uint8 => out[0] = scalar_int(scalar) as u8,
        DType::Uint16 => LittleEndian::write_u16(out, scalar_int(scalar) as u16),
        DType::Bool => out[0] = (scalar.as_f64() != 0.0) as u8,
    }
}

fn scalar_int(scalar: &Scalar) -> i64 {
    match scalar {
        Scalar::Int(v) => *v,
        Scalar::Float(v) => *v as i64,
        Scalar::Bool(b) => *b as i64,
    }
}

fn decode_element(dtype: DType, chunk: &[u8]) -> Scalar {
    match dtype {
        DType::Float => Scalar::Float(LittleEndian::read_f32(chunk) as f64),
        DType::Double => Scalar::Float(LittleEndian::read_f64(chunk)),
        DType::Int8 => Scalar::Int((chunk[0] as i8) as i64),
        DType::Int16 => Scalar::Int(LittleEndian::read_i16(chunk) as i64),
        DType::Int32 => Scalar::Int(LittleEndian::read_i32(chunk) as i64),
        DType::Int64 => Scalar::Int(LittleEndian::read_i64(chunk)),
        DType::Uint8 => Scalar::Int(chunk[0] as i64),
        DType::Uint16 => Scalar::Int(LittleEndian::read_u16(chunk) as i64),
        DType::Bool => Scalar::Bool(chunk[0] != 0),
    }
}
