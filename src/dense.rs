//! Owned dense tensors.
//!
//! A [`Tensor`] owns a contiguous buffer of `shape.iter().product()` elements
//! laid out according to its [`Order`]. It is the only owning container in the
//! crate; everything else (views, expression nodes) borrows from it.

use crate::order::{ravel_index, Order};
use crate::view::{SliceSpec, View, ViewMut};
use crate::{broadcast, NdError, Result};
use num_traits::{Float, Num, One, Zero};
use std::ops::{Index, IndexMut};

/// An owned dense array of rank `N`.
///
/// # Buffer invalidation
///
/// [`Tensor::resize`] discards the old buffer and allocates a new one; the
/// previous contents are lost and any raw pointers into the old buffer become
/// dangling. Safe code cannot observe this: `resize` takes `&mut self`, so no
/// [`View`] or iterator borrowed from the tensor can be alive across the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T, const N: usize> {
    data: Vec<T>,
    shape: [usize; N],
    order: Order,
}

impl<T, const N: usize> Tensor<T, N> {
    /// Assemble a tensor from a buffer already laid out for `order`.
    pub(crate) fn from_parts(data: Vec<T>, shape: [usize; N], order: Order) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Self { data, shape, order }
    }

    /// Create a tensor by cloning `value` into every element (row-major).
    pub fn from_elem(shape: [usize; N], value: T) -> Self
    where
        T: Clone,
    {
        let len = shape.iter().product();
        Self::from_parts(vec![value; len], shape, Order::RowMajor)
    }

    /// Fallible variant of [`Tensor::from_elem`] that surfaces
    /// [`NdError::AllocationFailure`] instead of aborting when the storage
    /// layer cannot obtain the buffer.
    pub fn try_from_elem(shape: [usize; N], value: T) -> Result<Self>
    where
        T: Clone,
    {
        let requested = shape.iter().product();
        let mut data = Vec::new();
        data.try_reserve_exact(requested)
            .map_err(|_| NdError::AllocationFailure { requested })?;
        data.resize(requested, value);
        Ok(Self::from_parts(data, shape, Order::RowMajor))
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: [usize; N]) -> Self
    where
        T: Zero + Clone,
    {
        Self::from_elem(shape, T::zero())
    }

    /// Create a one-filled tensor.
    pub fn ones(shape: [usize; N]) -> Self
    where
        T: One + Clone,
    {
        Self::from_elem(shape, T::one())
    }

    /// Wrap an existing buffer. The buffer is interpreted in row-major order
    /// and its length must equal the shape's element count.
    pub fn from_vec(shape: [usize; N], data: Vec<T>) -> Result<Self> {
        let expected = shape.iter().product();
        if data.len() != expected {
            return Err(NdError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_parts(data, shape, Order::RowMajor))
    }

    /// Create a tensor by evaluating `f` at every coordinate (row-major).
    pub fn from_fn(shape: [usize; N], f: impl FnMut([usize; N]) -> T) -> Self {
        Self::from_fn_in(shape, Order::RowMajor, f)
    }

    /// Create a tensor laid out in `order`, filling via `f` in that order.
    pub fn from_fn_in(
        shape: [usize; N],
        order: Order,
        mut f: impl FnMut([usize; N]) -> T,
    ) -> Self {
        let len = shape.iter().product();
        let mut data = Vec::with_capacity(len);
        for index in crate::iter::indices(shape, order) {
            data.push(f(index));
        }
        Self::from_parts(data, shape, order)
    }

    /// Returns the extent of each axis.
    #[inline]
    pub fn shape(&self) -> &[usize; N] {
        &self.shape
    }

    /// Returns the extent of axis `axis`.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if any axis has extent 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        N
    }

    /// Returns the buffer layout.
    #[inline]
    pub fn order(&self) -> Order {
        self.order
    }

    /// Returns the dense strides implied by the shape and layout.
    #[inline]
    pub fn strides(&self) -> [isize; N] {
        self.order.strides(&self.shape)
    }

    /// Returns the buffer in native memory order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the buffer mutably, in native memory order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the tensor, returning its buffer in native memory order.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element at native buffer position `pos`.
    #[inline]
    pub fn flat(&self, pos: usize) -> &T {
        &self.data[pos]
    }

    /// Mutable element at native buffer position `pos`.
    #[inline]
    pub fn flat_mut(&mut self, pos: usize) -> &mut T {
        &mut self.data[pos]
    }

    /// Checked element access.
    pub fn try_get(&self, index: [usize; N]) -> Result<&T> {
        for axis in 0..N {
            if index[axis] >= self.shape[axis] {
                return Err(NdError::IndexOutOfRange {
                    index: index[axis],
                    axis,
                    extent: self.shape[axis],
                });
            }
        }
        Ok(&self.data[ravel_index(&index, &self.shape, self.order)])
    }

    /// Iterate the buffer in native memory order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Clone `value` into every element, keeping shape and layout.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for slot in &mut self.data {
            *slot = value.clone();
        }
    }

    /// A read-only strided view of the whole tensor.
    pub fn view(&self) -> View<'_, T, N> {
        View::from_raw_parts(&self.data, self.shape, self.order.strides(&self.shape), 0)
    }

    /// A mutable strided view of the whole tensor.
    pub fn view_mut(&mut self) -> ViewMut<'_, T, N> {
        let strides = self.order.strides(&self.shape);
        ViewMut::from_raw_parts(&mut self.data, self.shape, strides, 0)
    }

    /// Slice the tensor, yielding a read-only view (aliasing, no copy).
    pub fn slice(&self, spec: [SliceSpec; N]) -> Result<View<'_, T, N>> {
        self.view().slice(spec)
    }

    /// Slice the tensor, yielding a mutable view. Assignments through the
    /// result write into this tensor's buffer.
    pub fn slice_mut(&mut self, spec: [SliceSpec; N]) -> Result<ViewMut<'_, T, N>> {
        let mut view = self.view_mut();
        view.narrow(spec)?;
        Ok(view)
    }

    /// A read-only view of this tensor stretched to `target` via stride-0
    /// broadcasting. See [`crate::broadcast_to`].
    pub fn broadcast(&self, target: &[usize; N]) -> Result<View<'_, T, N>> {
        broadcast::broadcast_to(self.view(), target)
    }

    /// Discard the current buffer and allocate a fresh one of `new_shape`,
    /// filled with `value`.
    ///
    /// This is the documented invalidation point: previous contents are lost
    /// and the old buffer is freed. Layout is preserved.
    pub fn resize(&mut self, new_shape: [usize; N], value: T) -> Result<()>
    where
        T: Clone,
    {
        let requested = new_shape.iter().product();
        let mut data = Vec::new();
        data.try_reserve_exact(requested)
            .map_err(|_| NdError::AllocationFailure { requested })?;
        data.resize(requested, value);
        self.data = data;
        self.shape = new_shape;
        Ok(())
    }
}

impl<T: Copy + Num + PartialOrd> Tensor<T, 1> {
    /// Values from `start` (inclusive) to `stop` (exclusive), stepping by
    /// `step`. A negative step counts down.
    pub fn arange(start: T, stop: T, step: T) -> Result<Self> {
        if step == T::zero() {
            return Err(NdError::InvalidArgument(
                "arange step must be non-zero".into(),
            ));
        }
        let mut data = Vec::new();
        let mut v = start;
        if step > T::zero() {
            while v < stop {
                data.push(v);
                v = v + step;
            }
        } else {
            while v > stop {
                data.push(v);
                v = v + step;
            }
        }
        let len = data.len();
        Ok(Self::from_parts(data, [len], Order::RowMajor))
    }
}

impl<T: Float> Tensor<T, 1> {
    /// `count` evenly spaced values from `start` to `stop` inclusive.
    pub fn linspace(start: T, stop: T, count: usize) -> Result<Self> {
        let convert = |i: usize| {
            T::from(i).ok_or_else(|| {
                NdError::InvalidArgument("linspace count does not fit element type".into())
            })
        };
        let mut data = Vec::with_capacity(count);
        match count {
            0 => {}
            1 => data.push(start),
            _ => {
                let step = (stop - start) / convert(count - 1)?;
                for i in 0..count - 1 {
                    data.push(start + step * convert(i)?);
                }
                data.push(stop);
            }
        }
        let len = data.len();
        Ok(Self::from_parts(data, [len], Order::RowMajor))
    }
}

impl<T, const N: usize> Index<[usize; N]> for Tensor<T, N> {
    type Output = T;

    #[inline]
    fn index(&self, index: [usize; N]) -> &T {
        for axis in 0..N {
            assert!(index[axis] < self.shape[axis], "index out of bounds");
        }
        &self.data[ravel_index(&index, &self.shape, self.order)]
    }
}

impl<T, const N: usize> IndexMut<[usize; N]> for Tensor<T, N> {
    #[inline]
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        for axis in 0..N {
            assert!(index[axis] < self.shape[axis], "index out of bounds");
        }
        let flat = ravel_index(&index, &self.shape, self.order);
        &mut self.data[flat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_size() {
        let err = Tensor::from_vec([2, 2], vec![1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            NdError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_from_fn_row_major() {
        let t = Tensor::from_fn([2, 3], |[i, j]| i * 10 + j);
        assert_eq!(t.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(t[[1, 2]], 12);
    }

    #[test]
    fn test_from_fn_col_major_layout() {
        let t = Tensor::from_fn_in([2, 3], Order::ColMajor, |[i, j]| i * 10 + j);
        assert_eq!(t.as_slice(), &[0, 10, 1, 11, 2, 12]);
        // Coordinate indexing is layout-independent.
        assert_eq!(t[[1, 2]], 12);
        assert_eq!(t.strides(), [1, 2]);
    }

    #[test]
    fn test_try_get() {
        let t = Tensor::from_fn([2, 2], |[i, j]| i + j);
        assert_eq!(*t.try_get([1, 1]).unwrap(), 2);
        let err = t.try_get([1, 2]).unwrap_err();
        assert!(matches!(
            err,
            NdError::IndexOutOfRange {
                index: 2,
                axis: 1,
                extent: 2
            }
        ));
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut t = Tensor::from_vec([3], vec![1, 2, 3]).unwrap();
        t.resize([5], 0).unwrap();
        assert_eq!(t.shape(), &[5]);
        assert_eq!(t.as_slice(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_arange() {
        let t = Tensor::arange(0, 10, 3).unwrap();
        assert_eq!(t.as_slice(), &[0, 3, 6, 9]);
        let down = Tensor::arange(3, 0, -1).unwrap();
        assert_eq!(down.as_slice(), &[3, 2, 1]);
        assert!(Tensor::arange(0, 4, 0).is_err());
    }

    #[test]
    fn test_linspace() {
        let t = Tensor::linspace(0.0, 1.0, 5).unwrap();
        assert_eq!(t.as_slice(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(Tensor::<f64, 1>::linspace(0.0, 1.0, 1).unwrap().as_slice(), &[0.0]);
        assert!(Tensor::<f64, 1>::linspace(0.0, 1.0, 0).unwrap().is_empty());
    }
}
