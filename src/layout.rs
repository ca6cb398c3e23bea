//! Strided layouts
//!
//! A [`Layout`] maps logical row-major positions of a tensor onto physical
//! offsets inside its storage. Nothing here touches element data.

use crate::error::{Result, VoltaError};

/// Row-major strides for `shape`
///
/// Strides saturate instead of wrapping; that can only happen for shapes
/// with a zero-sized dimension, whose strides are never dereferenced.
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1].saturating_mul(shape[i + 1]);
    }
    strides
}

/// Product of `shape`, or `None` if it does not fit in `usize`
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &size| acc.checked_mul(size))
}

/// Element count and largest reachable offset (`None` when empty), or
/// `None` overall if either overflows `usize`
fn checked_extent(
    shape: &[usize],
    strides: &[usize],
    offset: usize,
) -> Option<(usize, Option<usize>)> {
    if shape.contains(&0) {
        return Some((0, None));
    }
    let mut numel = 1usize;
    let mut max = offset;
    for (&size, &stride) in shape.iter().zip(strides) {
        numel = numel.checked_mul(size)?;
        max = max.checked_add((size - 1).checked_mul(stride)?)?;
    }
    Some((numel, Some(max)))
}

/// Shape, per-dimension strides and storage offset of a tensor view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    /// Row-major layout starting at offset 0
    pub fn contiguous(shape: &[usize]) -> Self {
        Layout {
            shape: shape.to_vec(),
            strides: compute_strides(shape),
            offset: 0,
        }
    }

    /// Arbitrary strided layout
    ///
    /// # Errors
    /// `InvalidView` if `shape` and `strides` differ in rank, or if the
    /// element count or the largest reachable offset overflows `usize`.
    pub fn new(shape: &[usize], strides: &[usize], offset: usize) -> Result<Self> {
        if shape.len() != strides.len() || checked_extent(shape, strides, offset).is_none() {
            return Err(VoltaError::InvalidView {
                shape: shape.to_vec(),
                strides: strides.to_vec(),
                offset,
                storage_len: 0,
            });
        }
        Ok(Layout {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
            offset,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of logical elements. A rank-0 layout holds one element, any
    /// zero-sized dimension makes it empty.
    ///
    /// Saturates at `usize::MAX` for a contiguous layout over a shape whose
    /// product overflows; such a layout can never back real storage.
    pub fn numel(&self) -> usize {
        checked_numel(&self.shape).unwrap_or(usize::MAX)
    }

    /// True if the strides are the row-major strides of the shape.
    /// Dimensions of size 1 never break contiguity.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1;
        for (&size, &stride) in self.shape.iter().zip(&self.strides).rev() {
            if size != 1 {
                if stride != expected {
                    return false;
                }
                expected = expected.saturating_mul(size);
            }
        }
        true
    }

    /// Largest physical offset the layout reaches, `None` when empty or
    /// when it overflows `usize`
    pub fn max_offset(&self) -> Option<usize> {
        checked_extent(&self.shape, &self.strides, self.offset).and_then(|(_, max)| max)
    }

    /// Check that every reachable offset lies inside a buffer of `len`
    pub fn check_fits(&self, len: usize) -> Result<()> {
        match checked_extent(&self.shape, &self.strides, self.offset) {
            Some((_, None)) => Ok(()),
            Some((_, Some(max))) if max < len => Ok(()),
            _ => Err(VoltaError::InvalidView {
                shape: self.shape.clone(),
                strides: self.strides.clone(),
                offset: self.offset,
                storage_len: len,
            }),
        }
    }

    /// Physical offsets of every element, in logical row-major order
    pub fn offsets(&self) -> StridedIter<'_> {
        StridedIter::new(self)
    }
}

/// Odometer walk over a [`Layout`], yielding physical offsets
pub struct StridedIter<'a> {
    layout: &'a Layout,
    index: Vec<usize>,
    current: usize,
    remaining: usize,
}

impl<'a> StridedIter<'a> {
    fn new(layout: &'a Layout) -> Self {
        StridedIter {
            layout,
            index: vec![0; layout.ndim()],
            current: layout.offset,
            remaining: layout.numel(),
        }
    }

    /// Next offset of an iterator known to have elements left
    pub(crate) fn step(&mut self) -> usize {
        debug_assert!(self.remaining > 0, "strided walk overran its layout");
        let out = self.current;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            self.advance();
        }
        out
    }

    fn advance(&mut self) {
        let layout = self.layout;
        let (shape, strides) = (&layout.shape, &layout.strides);
        for d in (0..shape.len()).rev() {
            self.index[d] += 1;
            self.current += strides[d];
            if self.index[d] < shape[d] {
                return;
            }
            self.current -= strides[d] * shape[d];
            self.index[d] = 0;
        }
    }
}

impl Iterator for StridedIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        Some(self.step())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter<'_> {}
