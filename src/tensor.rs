use crate::device::Device;
use crate::dtype::{DType, Element};
use crate::error::{Result, VoltaError};
use crate::layout::Layout;
use crate::storage::Storage;
use rand::Rng;
use rand_distr::StandardNormal;

/// A strided view over shared element storage.
///
/// Several `Tensor` handles may alias one [`Storage`]; [`Tensor::view`] creates
/// such an alias explicitly. `Tensor` is not `Clone`; copying data is
/// spelled [`Tensor::contiguous`].
///
/// Fields:
/// - `storage`: flat buffer, possibly shared with other handles
/// - `layout`: shape, strides and starting offset into `storage`
pub struct Tensor<T> {
    storage: Storage<T>,
    layout: Layout,
}

impl<T> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.layout.shape())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .field("storage", &self.storage)
            .finish()
    }
}

// ===== TENSOR CONSTRUCTORS =====
impl<T: Element> Tensor<T> {
    /// Create a new contiguous tensor from data and shape
    ///
    /// # Errors
    /// `ShapeDataMismatch` if `data.len()` differs from the shape product.
    pub fn new(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let layout = Layout::contiguous(shape);
        if data.len() != layout.numel() {
            return Err(VoltaError::ShapeDataMismatch {
                shape: shape.to_vec(),
                elements: layout.numel(),
                len: data.len(),
            });
        }
        Ok(Tensor {
            storage: Storage::new(data),
            layout,
        })
    }

    /// Create a rank-1 tensor owning `data`
    pub fn from_vec(data: Vec<T>) -> Self {
        let layout = Layout::contiguous(&[data.len()]);
        Tensor {
            storage: Storage::new(data),
            layout,
        }
    }

    /// Create a rank-0 tensor holding one value
    pub fn scalar(value: T) -> Self {
        Tensor {
            storage: Storage::new(vec![value]),
            layout: Layout::contiguous(&[]),
        }
    }

    /// Create a tensor filled with a constant value
    pub fn full(value: T, shape: &[usize]) -> Self {
        let layout = Layout::contiguous(shape);
        Tensor {
            storage: Storage::new(vec![value; layout.numel()]),
            layout,
        }
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(T::zero(), shape)
    }

    /// Create a tensor with random values uniformly distributed in [0, 1)
    pub fn rand(shape: &[usize]) -> Self {
        let mut rng = rand::rng();
        let size = shape.iter().product();
        let data = (0..size)
            .map(|_| num_traits::cast::<f64, T>(rng.random::<f64>()).unwrap_or_else(T::zero))
            .collect();
        Self::from_parts(Storage::new(data), Layout::contiguous(shape))
    }

    /// Create a tensor with values from standard normal distribution N(0, 1)
    pub fn randn(shape: &[usize]) -> Self {
        let mut rng = rand::rng();
        let size = shape.iter().product();
        let data = (0..size)
            .map(|_| {
                let z: f64 = rng.sample(StandardNormal);
                num_traits::cast::<f64, T>(z).unwrap_or_else(T::zero)
            })
            .collect();
        Self::from_parts(Storage::new(data), Layout::contiguous(shape))
    }

    /// Wrap existing storage with a layout
    ///
    /// # Errors
    /// `InvalidView` if the layout reaches past the end of the storage.
    pub fn with_layout(storage: Storage<T>, layout: Layout) -> Result<Self> {
        layout.check_fits(storage.len()?)?;
        Ok(Self::from_parts(storage, layout))
    }

    pub(crate) fn from_parts(storage: Storage<T>, layout: Layout) -> Self {
        Tensor { storage, layout }
    }
}

// ===== QUERIES =====
impl<T: Element> Tensor<T> {
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn device(&self) -> Device {
        Device::CPU
    }

    /// True if both handles read and write the same buffer
    pub fn shares_storage(&self, other: &Self) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// True if both handles are the same view of the same buffer
    pub fn is_same_view(&self, other: &Self) -> bool {
        self.shares_storage(other) && self.layout == other.layout
    }
}

// ===== ALIASING & RESIZING =====
impl<T: Element> Tensor<T> {
    /// New handle sharing this tensor's storage and layout.
    ///
    /// Writes through either handle are visible through the other.
    #[must_use]
    pub fn view(&self) -> Self {
        Tensor {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }

    /// Make this tensor the shape of `other`.
    ///
    /// Keeps the current storage and strides when the shapes already agree,
    /// otherwise points this handle at fresh zero-filled contiguous storage.
    pub fn resize_as(&mut self, other: &Self) {
        if self.shape() == other.shape() {
            return;
        }
        *self = Self::zeros(other.shape());
    }

    /// Copy the logical elements into a new contiguous tensor
    pub fn contiguous(&self) -> Result<Self> {
        Self::new(self.to_vec()?, self.shape())
    }

    /// Logical elements in row-major order
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let data = self.storage.read()?;
        Ok(self.layout.offsets().map(|o| data[o]).collect())
    }

    /// Value of a tensor holding exactly one element
    pub fn item(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(VoltaError::ElementCountMismatch {
                op: "item",
                expected: 1,
                actual: self.numel(),
            });
        }
        let data = self.storage.read()?;
        Ok(data[self.layout.offset()])
    }

    fn offset_1d(&self, index: usize) -> Result<usize> {
        if self.ndim() != 1 || index >= self.shape()[0] {
            return Err(VoltaError::DimensionOutOfBounds {
                dim: index,
                shape: self.shape().to_vec(),
            });
        }
        Ok(self.layout.offset() + index * self.strides()[0])
    }

    /// Read element `index` of a rank-1 tensor
    pub fn get_1d(&self, index: usize) -> Result<T> {
        let o = self.offset_1d(index)?;
        Ok(self.storage.read()?[o])
    }

    /// Write element `index` of a rank-1 tensor
    pub fn set_1d(&self, index: usize, value: T) -> Result<()> {
        let o = self.offset_1d(index)?;
        self.storage.write()?[o] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(Tensor::new(vec![1.0f32, 2.0, 3.0], &[3]).is_ok());
        let err = Tensor::new(vec![1.0f32, 2.0], &[3]).unwrap_err();
        assert!(matches!(err, VoltaError::ShapeDataMismatch { elements: 3, len: 2, .. }));
    }

    #[test]
    fn test_new_rejects_overflowing_shape() {
        let err = Tensor::new(vec![0.0f32; 4], &[1 << 40, 1 << 40]).unwrap_err();
        assert!(matches!(err, VoltaError::ShapeDataMismatch { len: 4, .. }));
        let empty = Tensor::<f32>::new(Vec::new(), &[0, 1 << 40, 1 << 40]).unwrap();
        assert_eq!(empty.numel(), 0);
        assert!(empty.to_vec().unwrap().is_empty());
    }

    #[test]
    fn test_view_aliases() {
        let a = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let b = a.view();
        assert!(a.shares_storage(&b));
        assert!(a.is_same_view(&b));
        b.storage().write().unwrap()[3] = 9.0;
        assert_eq!(a.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 9.0]);
    }

    #[test]
    fn test_contiguous_copies() {
        let a = Tensor::new(vec![1.0f64, 2.0], &[2]).unwrap();
        let b = a.contiguous().unwrap();
        assert!(!a.shares_storage(&b));
        assert_eq!(b.to_vec().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_resize_as() {
        let src = Tensor::<f32>::zeros(&[2, 3]);
        let mut out = Tensor::from_vec(vec![5.0f32]);
        out.resize_as(&src);
        assert_eq!(out.shape(), &[2, 3]);
        assert!(out.is_contiguous());
        assert_eq!(out.to_vec().unwrap(), vec![0.0; 6]);

        // Same shape keeps the storage
        let keep = out.view();
        out.resize_as(&src);
        assert!(out.shares_storage(&keep));
    }

    #[test]
    fn test_item_and_1d_access() {
        assert_eq!(Tensor::scalar(3.5f32).item().unwrap(), 3.5);
        let t = Tensor::<f64>::zeros(&[1]);
        t.set_1d(0, 2.0).unwrap();
        assert_eq!(t.get_1d(0).unwrap(), 2.0);
        assert_eq!(t.item().unwrap(), 2.0);
        assert!(t.get_1d(1).is_err());
        assert!(Tensor::<f32>::zeros(&[2]).item().is_err());
    }

    #[test]
    fn test_with_layout_bounds() {
        let storage = Storage::new(vec![0.0f32; 6]);
        let ok = Layout::new(&[3, 2], &[1, 3], 0).unwrap();
        assert!(Tensor::with_layout(storage.clone(), ok).is_ok());
        let bad = Layout::new(&[3, 2], &[2, 3], 0).unwrap();
        assert!(matches!(
            Tensor::with_layout(storage.clone(), bad),
            Err(VoltaError::InvalidView { .. })
        ));
        // Contiguous layout over a shape whose product overflows
        let huge = Layout::contiguous(&[1 << 40, 1 << 40]);
        assert!(matches!(
            Tensor::with_layout(storage, huge),
            Err(VoltaError::InvalidView { .. })
        ));
    }

    #[test]
    fn test_random_constructors() {
        let u = Tensor::<f32>::rand(&[4, 4]);
        assert!(u.to_vec().unwrap().iter().all(|&x| (0.0..1.0).contains(&x)));
        let n = Tensor::<f64>::randn(&[3, 5]);
        assert_eq!(n.numel(), 15);
        assert_eq!(n.dtype(), DType::F64);
        assert_eq!(n.device(), Device::CPU);
    }
}
