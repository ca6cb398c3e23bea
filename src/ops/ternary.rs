use super::context::ExecContext;
use super::engine::apply_n;
use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::Tensor;

/// Visit three tensors position by position, calling
/// `f(&mut out[i], a[i], b[i])`.
///
/// Same element-count and aliasing contract as
/// [`apply_binary`](super::binary::apply_binary).
pub fn apply_ternary<T, F>(
    ctx: &ExecContext,
    out: &Tensor<T>,
    a: &Tensor<T>,
    b: &Tensor<T>,
    f: F,
) -> Result<()>
where
    T: Element,
    F: Fn(&mut T, T, T) + Send + Sync,
{
    apply_n(ctx, "apply_ternary", out, [a, b], |o, [x, y]| f(o, x, y))
}
