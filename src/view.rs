//! Non-owning strided views.
//!
//! A view describes a window into some other container's buffer: a shape, a
//! per-axis stride, and a base offset. Slicing, axis permutation, reversal,
//! and broadcasting all produce new views over the same buffer without
//! copying any data.
//!
//! A view is valid only while its source buffer is alive; Rust's lifetimes
//! enforce that statically, so the "view outlives buffer" hazard of the
//! strided-view model cannot be expressed in safe code.

use crate::expr::Expression;
use crate::iter::IndexIter;
use crate::order::Order;
use crate::{broadcast, NdError, Result};
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// An immutable strided view over a contiguous buffer.
///
/// # Example
/// ```
/// use ndexpr::View;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let view: View<'_, f64, 2> = View::new(&data, [2, 3], [3, 1], 0).unwrap();
/// assert_eq!(view.get([1, 2]), 6.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct View<'a, T, const N: usize> {
    data: &'a [T],
    shape: [usize; N],
    strides: [isize; N],
    offset: usize,
}

/// A mutable strided view over a contiguous buffer.
///
/// Same window semantics as [`View`], plus mutation: writes through the view
/// land in the source buffer (aliasing, not copying).
#[derive(Debug)]
pub struct ViewMut<'a, T, const N: usize> {
    data: &'a mut [T],
    shape: [usize; N],
    strides: [isize; N],
    offset: usize,
}

/// Check that every reachable offset of the window lies inside the buffer.
fn validate_bounds<const N: usize>(
    len: usize,
    shape: &[usize; N],
    strides: &[isize; N],
    offset: usize,
) -> Result<()> {
    if shape.contains(&0) {
        return Ok(());
    }
    let mut lo = offset as isize;
    let mut hi = offset as isize;
    for i in 0..N {
        let span = (shape[i] as isize - 1) * strides[i];
        if span >= 0 {
            hi += span;
        } else {
            lo += span;
        }
    }
    if lo < 0 || hi >= len as isize {
        return Err(NdError::ViewOutOfBounds { lo, hi, len });
    }
    Ok(())
}

fn compute_slice_len(start: usize, stop: usize, step: isize) -> usize {
    if step > 0 {
        stop.saturating_sub(start).div_ceil(step as usize)
    } else {
        start.saturating_sub(stop).div_ceil(step.unsigned_abs())
    }
}

/// Apply a slice spec to window metadata, producing the narrowed metadata.
fn sliced_parts<const N: usize>(
    shape: &[usize; N],
    strides: &[isize; N],
    offset: usize,
    spec: &[SliceSpec; N],
) -> Result<([usize; N], [isize; N], usize)> {
    let mut new_shape = [0usize; N];
    let mut new_strides = [0isize; N];
    let mut new_offset = offset as isize;

    for axis in 0..N {
        let extent = shape[axis];
        let s = &spec[axis];
        if s.step == 0 {
            return Err(NdError::InvalidArgument(
                "slice step must be non-zero".into(),
            ));
        }
        let stop = s.stop.unwrap_or(extent);
        // With a negative step the start element itself is read, so it must
        // be a valid index; with a positive step, start == extent is an
        // empty slice.
        let start_limit = if s.step < 0 && extent > 0 {
            extent - 1
        } else {
            extent
        };
        if s.start > start_limit {
            return Err(NdError::IndexOutOfRange {
                index: s.start,
                axis,
                extent,
            });
        }
        if stop > extent {
            return Err(NdError::IndexOutOfRange {
                index: stop,
                axis,
                extent,
            });
        }
        new_shape[axis] = compute_slice_len(s.start, stop, s.step);
        new_strides[axis] = strides[axis] * s.step;
        new_offset += s.start as isize * strides[axis];
    }
    Ok((new_shape, new_strides, new_offset as usize))
}

impl<'a, T, const N: usize> View<'a, T, N> {
    /// Create a view over `data`.
    ///
    /// # Errors
    /// Returns [`NdError::ViewOutOfBounds`] if any index combination would
    /// reach outside the buffer.
    pub fn new(
        data: &'a [T],
        shape: [usize; N],
        strides: [isize; N],
        offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), &shape, &strides, offset)?;
        Ok(Self {
            data,
            shape,
            strides,
            offset,
        })
    }

    /// Assemble a view from metadata already known to be in bounds.
    pub(crate) fn from_raw_parts(
        data: &'a [T],
        shape: [usize; N],
        strides: [isize; N],
        offset: usize,
    ) -> Self {
        debug_assert!(validate_bounds(data.len(), &shape, &strides, offset).is_ok());
        Self {
            data,
            shape,
            strides,
            offset,
        }
    }

    /// Returns the extent of each axis.
    #[inline]
    pub fn shape(&self) -> &[usize; N] {
        &self.shape
    }

    /// Returns the stride for each axis.
    #[inline]
    pub fn strides(&self) -> &[isize; N] {
        &self.strides
    }

    /// Returns the base offset into the buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns true if any axis has extent 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Returns the number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        N
    }

    /// Returns the extent of axis `axis`.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Returns the underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Flat buffer position of a coordinate.
    #[inline]
    fn linear_index(&self, index: &[usize; N]) -> usize {
        let mut pos = self.offset as isize;
        for i in 0..N {
            pos += index[i] as isize * self.strides[i];
        }
        pos as usize
    }

    /// Whether the window is contiguous in row-major order.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1isize;
        for i in (0..N).rev() {
            if self.shape[i] <= 1 {
                continue;
            }
            if self.strides[i] != expected {
                return false;
            }
            expected *= self.shape[i] as isize;
        }
        true
    }

    /// Narrow the window along every axis (aliasing, no copy).
    ///
    /// Element `i` along an axis sliced with `(start, stop, step)` maps to
    /// source position `start + i*step`; the slice has
    /// `ceil((stop - start) / step)` elements.
    pub fn slice(&self, spec: [SliceSpec; N]) -> Result<View<'a, T, N>> {
        let (shape, strides, offset) = sliced_parts(&self.shape, &self.strides, self.offset, &spec)?;
        Ok(View {
            data: self.data,
            shape,
            strides,
            offset,
        })
    }

    /// Permute axes according to `perm` (zero-copy).
    ///
    /// # Panics
    /// Panics if `perm` is not a permutation of `0..N`.
    pub fn permute(self, perm: [usize; N]) -> Self {
        assert!(is_permutation(&perm), "invalid permutation");
        let mut shape = [0usize; N];
        let mut strides = [0isize; N];
        for i in 0..N {
            shape[i] = self.shape[perm[i]];
            strides[i] = self.strides[perm[i]];
        }
        View {
            data: self.data,
            shape,
            strides,
            offset: self.offset,
        }
    }

    /// Reverse the window along `axis` by negating its stride (zero-copy).
    pub fn flip(self, axis: usize) -> Result<Self> {
        if axis >= N {
            return Err(NdError::InvalidAxis { axis, rank: N });
        }
        let mut flipped = self;
        if flipped.shape[axis] > 0 {
            flipped.offset = (flipped.offset as isize
                + (flipped.shape[axis] as isize - 1) * flipped.strides[axis])
                as usize;
            flipped.strides[axis] = -flipped.strides[axis];
        }
        Ok(flipped)
    }

    /// A view of this window stretched to `target` via stride-0 broadcasting.
    pub fn broadcast(self, target: &[usize; N]) -> Result<Self> {
        broadcast::broadcast_to(self, target)
    }
}

impl<'a, T: Copy, const N: usize> View<'a, T, N> {
    /// Get the element at `index`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, index: [usize; N]) -> T {
        for i in 0..N {
            assert!(index[i] < self.shape[i], "index out of bounds");
        }
        self.data[self.linear_index(&index)]
    }
}

impl<'a, T> View<'a, T, 2> {
    /// Transpose a 2-D view by swapping axes (zero-copy).
    #[inline]
    pub fn t(self) -> View<'a, T, 2> {
        self.permute([1, 0])
    }
}

fn is_permutation<const N: usize>(perm: &[usize; N]) -> bool {
    let mut seen = [false; N];
    for &p in perm {
        if p >= N || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

impl<'a, T, const N: usize> ViewMut<'a, T, N> {
    /// Create a mutable view over `data`.
    pub fn new(
        data: &'a mut [T],
        shape: [usize; N],
        strides: [isize; N],
        offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), &shape, &strides, offset)?;
        Ok(Self {
            data,
            shape,
            strides,
            offset,
        })
    }

    pub(crate) fn from_raw_parts(
        data: &'a mut [T],
        shape: [usize; N],
        strides: [isize; N],
        offset: usize,
    ) -> Self {
        debug_assert!(validate_bounds(data.len(), &shape, &strides, offset).is_ok());
        Self {
            data,
            shape,
            strides,
            offset,
        }
    }

    /// Returns the extent of each axis.
    #[inline]
    pub fn shape(&self) -> &[usize; N] {
        &self.shape
    }

    /// Returns the stride for each axis.
    #[inline]
    pub fn strides(&self) -> &[isize; N] {
        &self.strides
    }

    /// Returns the base offset into the buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns true if any axis has extent 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Returns the number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        N
    }

    #[inline]
    fn linear_index(&self, index: &[usize; N]) -> usize {
        let mut pos = self.offset as isize;
        for i in 0..N {
            pos += index[i] as isize * self.strides[i];
        }
        pos as usize
    }

    /// Reborrow as an immutable view.
    #[inline]
    pub fn as_view(&self) -> View<'_, T, N> {
        View {
            data: self.data,
            shape: self.shape,
            strides: self.strides,
            offset: self.offset,
        }
    }

    /// Set the element at `index`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, index: [usize; N], value: T) {
        for i in 0..N {
            assert!(index[i] < self.shape[i], "index out of bounds");
        }
        let pos = self.linear_index(&index);
        self.data[pos] = value;
    }

    /// Mutable reference to the element at `index`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: [usize; N]) -> &mut T {
        for i in 0..N {
            assert!(index[i] < self.shape[i], "index out of bounds");
        }
        let pos = self.linear_index(&index);
        &mut self.data[pos]
    }

    /// Narrow this window in place along every axis.
    pub fn narrow(&mut self, spec: [SliceSpec; N]) -> Result<()> {
        let (shape, strides, offset) = sliced_parts(&self.shape, &self.strides, self.offset, &spec)?;
        self.shape = shape;
        self.strides = strides;
        self.offset = offset;
        Ok(())
    }

    /// Narrow the window along every axis, consuming the view. Assignments
    /// through the result write into the original buffer.
    pub fn slice_mut(mut self, spec: [SliceSpec; N]) -> Result<ViewMut<'a, T, N>> {
        self.narrow(spec)?;
        Ok(self)
    }
}

impl<'a, T: Copy, const N: usize> ViewMut<'a, T, N> {
    /// Get the element at `index`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, index: [usize; N]) -> T {
        for i in 0..N {
            assert!(index[i] < self.shape[i], "index out of bounds");
        }
        self.data[self.linear_index(&index)]
    }

    /// Copy `value` into every element of the window.
    pub fn fill(&mut self, value: T) {
        for index in IndexIter::new(self.shape, Order::RowMajor) {
            let pos = self.linear_index(&index);
            self.data[pos] = value;
        }
    }

    /// Assign `src` into the window, broadcasting size-1 source axes.
    ///
    /// Shape compatibility is validated before any element is written.
    /// Writes proceed element-by-element in row-major order; assignment is
    /// not atomic with respect to the destination buffer.
    pub fn assign<E>(&mut self, src: E) -> Result<()>
    where
        E: Expression<N, Elem = T>,
    {
        let src_shape = src.shape();
        for axis in 0..N {
            if src_shape[axis] != self.shape[axis] && src_shape[axis] != 1 {
                return Err(NdError::shape_mismatch(
                    axis,
                    src_shape[axis],
                    self.shape[axis],
                    &src_shape,
                    &self.shape,
                ));
            }
        }
        for index in IndexIter::new(self.shape, Order::RowMajor) {
            let value = src.eval(broadcast::broadcast_index(index, &src_shape));
            let pos = self.linear_index(&index);
            self.data[pos] = value;
        }
        Ok(())
    }
}

// ============================================================================
// Slice specs
// ============================================================================

/// A per-axis `(start, stop, step)` slice description.
///
/// `stop = None` means "up to the axis extent". For a negative step the
/// window runs from `start` downward to `stop` (exclusive); `start` must
/// then be a valid index of the axis.
#[derive(Debug, Clone, Copy)]
pub struct SliceSpec {
    start: usize,
    stop: Option<usize>,
    step: isize,
}

impl SliceSpec {
    pub fn new(start: usize, stop: usize, step: isize) -> Self {
        Self {
            start,
            stop: Some(stop),
            step,
        }
    }

    /// The whole axis.
    pub fn all() -> Self {
        Self {
            start: 0,
            stop: None,
            step: 1,
        }
    }

    /// Keep start/stop, replace the step.
    ///
    /// `stop` is unsigned and exclusive, so a negative step can never reach
    /// index 0; use [`View::flip`] to reverse a whole axis.
    pub fn step_by(mut self, step: isize) -> Self {
        self.step = step;
        self
    }
}

impl From<Range<usize>> for SliceSpec {
    fn from(r: Range<usize>) -> Self {
        SliceSpec::new(r.start, r.end, 1)
    }
}

impl From<RangeFrom<usize>> for SliceSpec {
    fn from(r: RangeFrom<usize>) -> Self {
        SliceSpec {
            start: r.start,
            stop: None,
            step: 1,
        }
    }
}

impl From<RangeTo<usize>> for SliceSpec {
    fn from(r: RangeTo<usize>) -> Self {
        SliceSpec::new(0, r.end, 1)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        SliceSpec::all()
    }
}
