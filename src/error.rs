use crate::dtype::DType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoltaError {
    #[error("Shape mismatch: tensor has {elements} elements but data length is {len}")]
    ShapeDataMismatch {
        shape: Vec<usize>,
        elements: usize,
        len: usize,
    },

    #[error("{op}: expected {expected} elements, got {actual}")]
    ElementCountMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(
        "{op}: expected a {expected_dims}-d tensor with size {expected_size} at dim {dim}, got shape {shape:?}"
    )]
    DimSizeMismatch {
        op: &'static str,
        expected_dims: usize,
        dim: usize,
        expected_size: usize,
        shape: Vec<usize>,
    },

    #[error("Invalid view: shape {shape:?}, strides {strides:?}, offset {offset} over storage of {storage_len} elements")]
    InvalidView {
        shape: Vec<usize>,
        strides: Vec<usize>,
        offset: usize,
        storage_len: usize,
    },

    #[error("Dimension {dim} out of bounds for shape {shape:?}")]
    DimensionOutOfBounds { dim: usize, shape: Vec<usize> },

    #[error("Cannot represent {value} as {dtype}")]
    UnrepresentableScalar { value: f64, dtype: DType },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Tensor storage lock poisoned by an earlier panic")]
    PoisonedStorage,

    #[error("Worker task failed: {0}")]
    WorkerPanic(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, VoltaError>;
