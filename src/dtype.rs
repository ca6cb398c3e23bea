//! Element type support for tensors
//!
//! Kernels are written once against the [`Element`] trait and instantiated
//! for each supported floating-point precision. Scalar kernel parameters are
//! passed in the wide accumulation type (`f64`) and narrowed on entry.

use crate::error::{Result, VoltaError};
use num_traits::{Float, NumCast};
use std::fmt;

/// Supported tensor data types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DType {
    /// 32-bit floating point (default)
    #[default]
    F32 = 0,
    /// 64-bit floating point
    F64 = 1,
}

impl DType {
    /// Returns the size in bytes of a single element of this dtype
    #[must_use]
    pub fn size_of(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Returns the name of this dtype as a string
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Numeric element stored in a tensor.
///
/// `Send + Sync` is required so element buffers can be split across pool
/// workers.
pub trait Element: Float + NumCast + Send + Sync + fmt::Debug + 'static {
    const DTYPE: DType;

    /// Narrow an accumulation-precision scalar (`accreal`) to this type.
    fn from_accreal(value: f64) -> Result<Self> {
        <Self as NumCast>::from(value).ok_or(VoltaError::UnrepresentableScalar {
            value,
            dtype: Self::DTYPE,
        })
    }

    /// Convert an element count to this type, for averaging.
    fn from_count(n: usize) -> Result<Self> {
        <Self as NumCast>::from(n).ok_or_else(|| {
            VoltaError::InvalidParameter(format!("element count {n} does not fit {}", Self::DTYPE))
        })
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F32.size_of(), 4);
        assert_eq!(DType::F64.size_of(), 8);
        assert_eq!(std::mem::size_of::<f32>(), f32::DTYPE.size_of());
        assert_eq!(std::mem::size_of::<f64>(), f64::DTYPE.size_of());
    }

    #[test]
    fn test_dtype_name() {
        assert_eq!(DType::F32.name(), "f32");
        assert_eq!(DType::F64.to_string(), "f64");
    }

    #[test]
    fn test_from_accreal() {
        assert_eq!(f32::from_accreal(-1.0).unwrap(), -1.0f32);
        assert_eq!(f64::from_accreal(0.25).unwrap(), 0.25);
        assert!(f64::from_accreal(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn test_from_count() {
        assert_eq!(f32::from_count(4).unwrap(), 4.0);
        assert_eq!(f64::from_count(0).unwrap(), 0.0);
    }
}
