use super::context::ExecContext;
use super::engine::apply_n;
use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::Tensor;

/// Visit `out` and `a` position by position, calling `f(&mut out[i], a[i])`.
///
/// `out` and `a` need the same element count but not the same shape or
/// strides; each is walked in its own row-major order. `a` may alias `out`,
/// in which case `f` sees the current output value as both arguments.
///
/// # Errors
/// `ElementCountMismatch` before any element is touched if the counts
/// differ; `WorkerPanic` if `f` panics.
pub fn apply_binary<T, F>(ctx: &ExecContext, out: &Tensor<T>, a: &Tensor<T>, f: F) -> Result<()>
where
    T: Element,
    F: Fn(&mut T, T) + Send + Sync,
{
    apply_n(ctx, "apply_binary", out, [a], |o, [x]| f(o, x))
}
