//! # volta-pointwise
//!
//! Elementwise compute over strided tensors, and two neural-network kernels
//! built on it.
//!
//! - [`Tensor`]: a [`Layout`] (shape, strides, offset) over shared
//!   [`Storage`]. Views alias storage; in-place kernels use that.
//! - [`apply_unary`], [`apply_binary`], [`apply_ternary`]: visit every
//!   position of one to three tensors. Each call picks a strided walk, a flat
//!   serial loop, or a flat loop chunked over a rayon pool ([`Dispatch`]).
//! - [`ExecContext`]: the worker pool, the parallel threshold and whether the
//!   caller is already running inside a parallel region.
//! - [`HardTanh`] and [`MarginCriterion`]: forward and backward kernels.
//!
//! ```
//! use volta_pointwise::{ExecContext, HardTanh, Tensor};
//!
//! let ctx = ExecContext::default();
//! let input = Tensor::new(vec![-2.0f32, -1.0, 0.0, 1.0, 2.0], &[5]).unwrap();
//! let mut output = Tensor::zeros(&[0]);
//! HardTanh::new(-1.0, 1.0)
//!     .unwrap()
//!     .update_output(&ctx, &input, &mut output)
//!     .unwrap();
//! assert_eq!(output.to_vec().unwrap(), vec![-1.0, -1.0, 0.0, 1.0, 1.0]);
//! ```

pub mod config;
pub mod device;
pub mod dtype;
pub mod error;
pub mod layout;
pub mod nn;
pub mod ops;
pub mod storage;
pub mod tensor;

pub use config::ApplyConfig;
pub use device::Device;
pub use dtype::{DType, Element};
pub use error::{Result, VoltaError};
pub use layout::{Layout, StridedIter};
pub use nn::{HardTanh, MarginCriterion};
pub use ops::{
    Dispatch, ExecContext, apply_binary, apply_ternary, apply_unary, dispatch_for, fold_binary,
};
pub use storage::Storage;
pub use tensor::Tensor;
