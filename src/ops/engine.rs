//! Shared machinery behind the unary, binary and ternary applicators.
//!
//! One output tensor is written in place while `N` input tensors are read.
//! Any input may alias the output's storage. Aliased inputs are read
//! through the output buffer, since the output holds the only lock on it.

use super::context::{Dispatch, ExecContext};
use crate::dtype::Element;
use crate::error::{Result, VoltaError};
use crate::layout::StridedIter;
use crate::tensor::Tensor;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::RwLockReadGuard;
use tracing::{debug_span, trace};

/// Where an input operand's elements live during one call
#[derive(Clone, Copy)]
enum Source<'a, T> {
    /// A separately locked buffer
    Buffer(&'a [T]),
    /// The output's own buffer
    Output,
}

impl<T: Copy> Source<'_, T> {
    #[inline]
    fn read(self, out: &[T], offset: usize) -> T {
        match self {
            Source::Buffer(buf) => buf[offset],
            Source::Output => out[offset],
        }
    }
}

/// Fail unless every input has as many elements as `out`
pub(crate) fn check_numel<T: Element>(
    op: &'static str,
    expected: &Tensor<T>,
    actual: &Tensor<T>,
) -> Result<()> {
    if expected.numel() != actual.numel() {
        return Err(VoltaError::ElementCountMismatch {
            op,
            expected: expected.numel(),
            actual: actual.numel(),
        });
    }
    Ok(())
}

/// Decide the execution strategy for `out` and `inputs`
pub(crate) fn plan<T: Element>(
    ctx: &ExecContext,
    out: &Tensor<T>,
    inputs: &[&Tensor<T>],
) -> Dispatch {
    let all_contiguous = out.is_contiguous() && inputs.iter().all(|t| t.is_contiguous());
    let min_rank = inputs.iter().map(|t| t.ndim()).fold(out.ndim(), usize::min);
    let dispatch = ctx.plan(out.numel(), all_contiguous, min_rank);

    // The flat loops index every operand by the same position, so an input
    // that overlaps the output at a shifted offset must be walked in order.
    let shifted_alias = inputs
        .iter()
        .any(|t| t.shares_storage(out) && t.offset() != out.offset());
    if shifted_alias && dispatch != Dispatch::Strided {
        Dispatch::Strided
    } else {
        dispatch
    }
}

/// Visit every element of `out` together with the matching elements of
/// `inputs`, calling `f(&mut out[i], [in_0[i], .., in_N-1[i]])`.
pub(crate) fn apply_n<T, F, const N: usize>(
    ctx: &ExecContext,
    op: &'static str,
    out: &Tensor<T>,
    inputs: [&Tensor<T>; N],
    f: F,
) -> Result<()>
where
    T: Element,
    F: Fn(&mut T, [T; N]) + Send + Sync,
{
    for input in &inputs {
        check_numel(op, out, input)?;
    }
    let numel = out.numel();
    if numel == 0 {
        return Ok(());
    }

    let dispatch = plan(ctx, out, &inputs);
    trace!(op, numel, ?dispatch, "elementwise apply");

    let mut out_guard = out.storage().write()?;

    // One read lock per distinct input storage; aliases of the output go
    // through the write guard instead.
    let mut guards: Vec<RwLockReadGuard<'_, Vec<T>>> = Vec::with_capacity(N);
    let mut slots: [Option<usize>; N] = [None; N];
    for (i, input) in inputs.iter().enumerate() {
        if input.shares_storage(out) {
            continue;
        }
        let reuse = (0..i).find_map(|j| slots[j].filter(|_| inputs[j].shares_storage(input)));
        slots[i] = match reuse {
            Some(slot) => Some(slot),
            None => {
                guards.push(input.storage().read()?);
                Some(guards.len() - 1)
            }
        };
    }
    let sources: [Source<'_, T>; N] = std::array::from_fn(|i| match slots[i] {
        Some(slot) => Source::Buffer(guards[slot].as_slice()),
        None => Source::Output,
    });

    let out_buf = out_guard.as_mut_slice();
    let run = || match dispatch {
        Dispatch::Strided => strided(out, &inputs, &sources, out_buf, &f),
        Dispatch::FlatSerial => {
            let bases: [usize; N] = std::array::from_fn(|i| inputs[i].offset());
            let start = out.offset();
            flat_chunk(&mut out_buf[start..start + numel], 0, &sources, &bases, &f);
        }
        Dispatch::FlatParallel => {
            let bases: [usize; N] = std::array::from_fn(|i| inputs[i].offset());
            let start = out.offset();
            let chunk = numel.div_ceil(ctx.num_threads());
            let _span = debug_span!("parallel_apply", op, numel, chunk).entered();
            let part = &mut out_buf[start..start + numel];
            ctx.install(|| {
                part.par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(c, piece)| flat_chunk(piece, c * chunk, &sources, &bases, &f));
            });
        }
    };

    panic::catch_unwind(AssertUnwindSafe(run)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        VoltaError::WorkerPanic(format!("{op}: {message}"))
    })
}

/// Index-computing walk, valid for any layouts
fn strided<T, F, const N: usize>(
    out: &Tensor<T>,
    inputs: &[&Tensor<T>; N],
    sources: &[Source<'_, T>; N],
    out_buf: &mut [T],
    f: &F,
) where
    T: Element,
    F: Fn(&mut T, [T; N]),
{
    let mut out_offsets = out.layout().offsets();
    let mut in_offsets: [StridedIter<'_>; N] =
        std::array::from_fn(|i| inputs[i].layout().offsets());
    for _ in 0..out.numel() {
        let o = out_offsets.step();
        let args: [T; N] =
            std::array::from_fn(|i| sources[i].read(&*out_buf, in_offsets[i].step()));
        f(&mut out_buf[o], args);
    }
}

/// Flat loop over `piece`, which starts at logical index `start`.
///
/// Inputs aliasing the output share its offset here, so their value is the
/// output element itself.
fn flat_chunk<T, F, const N: usize>(
    piece: &mut [T],
    start: usize,
    sources: &[Source<'_, T>; N],
    bases: &[usize; N],
    f: &F,
) where
    T: Element,
    F: Fn(&mut T, [T; N]),
{
    for (k, slot) in piece.iter_mut().enumerate() {
        let idx = start + k;
        let current = *slot;
        let args: [T; N] = std::array::from_fn(|i| match sources[i] {
            Source::Buffer(buf) => buf[bases[i] + idx],
            Source::Output => current,
        });
        f(slot, args);
    }
}
