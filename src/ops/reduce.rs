use super::engine::check_numel;
use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::Tensor;
use tracing::trace;

/// Fold two equally sized tensors into one accumulator.
///
/// Always walks both tensors serially in logical row-major order, whatever
/// their layout, so the summation order (and the floating-point result) is
/// fixed for a given pair of inputs. There is no parallel variant.
///
/// # Errors
/// `ElementCountMismatch` if `a` and `b` differ in element count.
pub fn fold_binary<T, A, F>(
    op: &'static str,
    a: &Tensor<T>,
    b: &Tensor<T>,
    init: A,
    mut f: F,
) -> Result<A>
where
    T: Element,
    F: FnMut(A, T, T) -> A,
{
    check_numel(op, a, b)?;
    trace!(op, numel = a.numel(), "serial fold");

    let a_guard = a.storage().read()?;
    // A second read lock on the same storage could block behind a writer
    let b_guard = if a.shares_storage(b) {
        None
    } else {
        Some(b.storage().read()?)
    };
    let a_buf = a_guard.as_slice();
    let b_buf = b_guard.as_ref().map_or(a_buf, |g| g.as_slice());

    let acc = a
        .layout()
        .offsets()
        .zip(b.layout().offsets())
        .fold(init, |acc, (i, j)| f(acc, a_buf[i], b_buf[j]));
    Ok(acc)
}
