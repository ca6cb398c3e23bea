use crate::dtype::Element;
use crate::error::{Result, VoltaError};
use crate::layout::Layout;
use crate::tensor::Tensor;

/// Movement operations: re-index existing storage without copying.
///
/// Every view returned here aliases the source tensor's storage, so writes
/// through the view land in the source. Most of them produce
/// non-contiguous layouts, which exercise the strided apply path.
impl<T: Element> Tensor<T> {
    /// Reorder dimensions: output dim `i` is input dim `axes[i]`
    ///
    /// # Errors
    /// `InvalidParameter` unless `axes` is a permutation of `0..ndim`.
    pub fn permute(&self, axes: &[usize]) -> Result<Self> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        for &ax in axes {
            if ax >= ndim || std::mem::replace(&mut seen[ax], true) {
                return Err(VoltaError::InvalidParameter(format!(
                    "permute axes {axes:?} are not a permutation of 0..{ndim}"
                )));
            }
        }
        if axes.len() != ndim {
            return Err(VoltaError::InvalidParameter(format!(
                "permute expects {ndim} axes, got {}",
                axes.len()
            )));
        }
        let shape: Vec<usize> = axes.iter().map(|&a| self.shape()[a]).collect();
        let strides: Vec<usize> = axes.iter().map(|&a| self.strides()[a]).collect();
        let layout = Layout::new(&shape, &strides, self.offset())?;
        Ok(Self::from_parts(self.storage().clone(), layout))
    }

    /// Swap two dimensions
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        for dim in [dim0, dim1] {
            if dim >= self.ndim() {
                return Err(VoltaError::DimensionOutOfBounds {
                    dim,
                    shape: self.shape().to_vec(),
                });
            }
        }
        let mut axes: Vec<usize> = (0..self.ndim()).collect();
        axes.swap(dim0, dim1);
        self.permute(&axes)
    }

    /// Keep `len` entries of dimension `dim` starting at `start`
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        if dim >= self.ndim() {
            return Err(VoltaError::DimensionOutOfBounds {
                dim,
                shape: self.shape().to_vec(),
            });
        }
        if start + len > self.shape()[dim] {
            return Err(VoltaError::InvalidParameter(format!(
                "narrow {start}..{} exceeds size {} of dim {dim}",
                start + len,
                self.shape()[dim]
            )));
        }
        let mut shape = self.shape().to_vec();
        shape[dim] = len;
        let offset = self.offset() + start * self.strides()[dim];
        let layout = Layout::new(&shape, self.strides(), offset)?;
        Ok(Self::from_parts(self.storage().clone(), layout))
    }

    /// Arbitrary view of this tensor's storage.
    ///
    /// `offset` is absolute within the storage, not relative to this view.
    ///
    /// # Errors
    /// `InvalidView` if the view would read past the end of the storage.
    pub fn as_strided(&self, shape: &[usize], strides: &[usize], offset: usize) -> Result<Self> {
        let layout = Layout::new(shape, strides, offset)?;
        Self::with_layout(self.storage().clone(), layout)
    }
}
