// Elementwise apply engine
//
// Every applicator picks one of three strategies per call (see `Dispatch`):
// a strided walk that computes offsets from each operand's strides, a flat
// serial loop, or a flat loop split into chunks on the worker pool.
pub mod binary;
pub mod context;
pub(crate) mod engine;
pub mod movement;
pub mod reduce;
pub mod ternary;
pub mod unary;

pub use binary::apply_binary;
pub use context::{Dispatch, ExecContext};
pub use reduce::fold_binary;
pub use ternary::apply_ternary;
pub use unary::apply_unary;

use crate::dtype::Element;
use crate::tensor::Tensor;

/// Strategy an applicator would use for `out` and `inputs` under `ctx`.
///
/// Recomputed on every call; nothing about the decision is cached.
pub fn dispatch_for<T: Element>(
    ctx: &ExecContext,
    out: &Tensor<T>,
    inputs: &[&Tensor<T>],
) -> Dispatch {
    engine::plan(ctx, out, inputs)
}
