//! Conditional selection and index-based read/write routines.
//!
//! [`select`] is the lazy, broadcasting three-operand conditional. The rest
//! of the module is eager: [`take`]/[`take_axis`] gather by integer index,
//! [`put`]/[`place`]/[`putmask`] scatter into a tensor, and
//! [`compress`]/[`mask_select`] filter by boolean mask. Flat positions
//! follow row-major coordinate order regardless of the operand's buffer
//! layout.

use crate::broadcast::{broadcast_index, broadcast_shapes};
use crate::dense::Tensor;
use crate::expr::{Expr, Expression, Fill, Scalar};
use crate::iter::IndexIter;
use crate::order::{unravel_index, Order};
use crate::{NdError, Result};

/// Lazy three-operand conditional under broadcasting.
///
/// Only the chosen branch is evaluated at each coordinate, so the unchosen
/// branch may be undefined there (a division by zero, say) without effect.
#[derive(Debug, Clone, Copy)]
pub struct WhereExpr<C, A, B, const N: usize> {
    cond: C,
    on_true: A,
    on_false: B,
    cond_shape: [usize; N],
    true_shape: [usize; N],
    false_shape: [usize; N],
    shape: [usize; N],
}

impl<C, A, B, T, const N: usize> Expression<N> for WhereExpr<C, A, B, N>
where
    C: Expression<N, Elem = bool>,
    A: Expression<N, Elem = T>,
    B: Expression<N, Elem = T>,
    T: Copy,
{
    type Elem = T;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.shape
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> T {
        if self.cond.eval(broadcast_index(index, &self.cond_shape)) {
            self.on_true.eval(broadcast_index(index, &self.true_shape))
        } else {
            self.on_false.eval(broadcast_index(index, &self.false_shape))
        }
    }
}

/// An operand acceptable as a [`select`] branch: any expression, or a
/// [`Scalar`] that adopts the broadcast shape.
pub trait SelectSource<T: Copy, const N: usize> {
    type Source: Expression<N, Elem = T>;

    /// The operand's own shape, or `None` if it adapts to any shape.
    fn source_shape(&self) -> Option<[usize; N]>;

    fn into_source(self, shape: [usize; N]) -> Self::Source;
}

impl<E, T, const N: usize> SelectSource<T, N> for E
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    type Source = E;

    fn source_shape(&self) -> Option<[usize; N]> {
        Some(self.shape())
    }

    fn into_source(self, _shape: [usize; N]) -> E {
        self
    }
}

impl<T: Copy, const N: usize> SelectSource<T, N> for Scalar<T> {
    type Source = Fill<T, N>;

    fn source_shape(&self) -> Option<[usize; N]> {
        None
    }

    fn into_source(self, shape: [usize; N]) -> Fill<T, N> {
        Fill::new(self.0, shape)
    }
}

/// Lazily choose between `on_true` and `on_false` per element of `cond`.
///
/// All three operands broadcast against each other; either branch may be a
/// [`Scalar`].
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] if the shapes cannot broadcast.
///
/// # Example
/// ```
/// use ndexpr::{gt, select, Expression, Scalar, Tensor};
///
/// let a = Tensor::from_vec([4], vec![1, 5, 3, 7]).unwrap();
/// let cap = Tensor::from_elem([4], 4);
/// let clipped = select(gt(&a, &cap).unwrap(), &cap, &a).unwrap();
/// assert_eq!(clipped.copy().as_slice(), &[1, 4, 3, 4]);
/// ```
pub fn select<C, A, B, T, const N: usize>(
    cond: C,
    on_true: A,
    on_false: B,
) -> Result<Expr<WhereExpr<C, A::Source, B::Source, N>, N>>
where
    C: Expression<N, Elem = bool>,
    A: SelectSource<T, N>,
    B: SelectSource<T, N>,
    T: Copy,
{
    let cond_shape = cond.shape();
    let mut shape = cond_shape;
    if let Some(s) = on_true.source_shape() {
        shape = broadcast_shapes(&shape, &s)?;
    }
    if let Some(s) = on_false.source_shape() {
        shape = broadcast_shapes(&shape, &s)?;
    }
    let on_true = on_true.into_source(shape);
    let on_false = on_false.into_source(shape);
    Ok(Expr(WhereExpr {
        cond_shape,
        true_shape: on_true.shape(),
        false_shape: on_false.shape(),
        shape,
        cond,
        on_true,
        on_false,
    }))
}

/// Alias for [`select`] under the conventional conditional name.
pub fn where_<C, A, B, T, const N: usize>(
    cond: C,
    on_true: A,
    on_false: B,
) -> Result<Expr<WhereExpr<C, A::Source, B::Source, N>, N>>
where
    C: Expression<N, Elem = bool>,
    A: SelectSource<T, N>,
    B: SelectSource<T, N>,
    T: Copy,
{
    select(cond, on_true, on_false)
}

/// Gather elements of `src` at row-major flat positions given by `indices`.
///
/// The result takes the shape of the index tensor, so an index tensor of any
/// rank performs integer-array indexing in one call.
///
/// # Errors
/// Returns [`NdError::FlatIndexOutOfRange`] for any position outside
/// `0..src.size()`.
pub fn take<E, T, const N: usize, const M: usize>(
    src: E,
    indices: &Tensor<usize, M>,
) -> Result<Tensor<T, M>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let len = src.size();
    let mut data = Vec::with_capacity(indices.len());
    for coord in IndexIter::new(*indices.shape(), Order::RowMajor) {
        let flat = indices[coord];
        if flat >= len {
            return Err(NdError::FlatIndexOutOfRange { index: flat, len });
        }
        data.push(src.eval_flat(flat));
    }
    Ok(Tensor::from_parts(data, *indices.shape(), Order::RowMajor))
}

/// Gather whole slices of `src` along `axis`; entry `i` of the result along
/// that axis is slice `indices[i]` of the source. Indices may repeat or
/// reorder slices.
///
/// # Errors
/// Returns [`NdError::InvalidAxis`] for a bad axis and
/// [`NdError::IndexOutOfRange`] for an index outside the axis extent.
pub fn take_axis<E, T, const N: usize>(
    src: E,
    axis: usize,
    indices: &Tensor<usize, 1>,
) -> Result<Tensor<T, N>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    let src_shape = src.shape();
    let extent = src_shape[axis];
    for &i in indices.as_slice() {
        if i >= extent {
            return Err(NdError::IndexOutOfRange {
                index: i,
                axis,
                extent,
            });
        }
    }
    let mut out_shape = src_shape;
    out_shape[axis] = indices.len();
    let mut data = Vec::with_capacity(out_shape.iter().product());
    for mut coord in IndexIter::new(out_shape, Order::RowMajor) {
        coord[axis] = indices[[coord[axis]]];
        data.push(src.eval(coord));
    }
    Ok(Tensor::from_parts(data, out_shape, Order::RowMajor))
}

/// Scatter `values` into `dst` at row-major flat positions `indices`,
/// cycling `values` if it is shorter than `indices`.
///
/// # Errors
/// Returns [`NdError::FlatIndexOutOfRange`] for a position outside the
/// tensor and [`NdError::InvalidArgument`] if `values` is empty while
/// `indices` is not.
pub fn put<T: Copy, const N: usize>(
    dst: &mut Tensor<T, N>,
    indices: &[usize],
    values: &[T],
) -> Result<()> {
    if values.is_empty() && !indices.is_empty() {
        return Err(NdError::InvalidArgument(
            "put requires at least one value".into(),
        ));
    }
    let len = dst.len();
    let shape = *dst.shape();
    for (k, &flat) in indices.iter().enumerate() {
        if flat >= len {
            return Err(NdError::FlatIndexOutOfRange { index: flat, len });
        }
        let coord = unravel_index(flat, &shape, Order::RowMajor);
        dst[coord] = values[k % values.len()];
    }
    Ok(())
}

/// Overwrite `dst` wherever `mask` is true, drawing from `values` in order:
/// the `n`-th masked position receives `values[n % values.len()]`.
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] if the mask shape differs from the
/// destination shape, and [`NdError::InvalidArgument`] if `values` is empty
/// while the mask selects anything.
pub fn place<T: Copy, const N: usize>(
    dst: &mut Tensor<T, N>,
    mask: &Tensor<bool, N>,
    values: &[T],
) -> Result<()> {
    check_same_shape(mask.shape(), dst.shape())?;
    let mut n = 0usize;
    for coord in IndexIter::new(*dst.shape(), Order::RowMajor) {
        if mask[coord] {
            if values.is_empty() {
                return Err(NdError::InvalidArgument(
                    "place requires at least one value".into(),
                ));
            }
            dst[coord] = values[n % values.len()];
            n += 1;
        }
    }
    Ok(())
}

/// Overwrite `dst` wherever `mask` is true, drawing `values` by the flat
/// position of the destination element (not by masked count, unlike
/// [`place`]).
pub fn putmask<T: Copy, const N: usize>(
    dst: &mut Tensor<T, N>,
    mask: &Tensor<bool, N>,
    values: &[T],
) -> Result<()> {
    check_same_shape(mask.shape(), dst.shape())?;
    for (flat, coord) in IndexIter::new(*dst.shape(), Order::RowMajor).enumerate() {
        if mask[coord] {
            if values.is_empty() {
                return Err(NdError::InvalidArgument(
                    "putmask requires at least one value".into(),
                ));
            }
            dst[coord] = values[flat % values.len()];
        }
    }
    Ok(())
}

/// Keep the flat elements of `src` whose mask entry is true, in row-major
/// order. The mask may be shorter than the source; trailing elements are
/// dropped.
///
/// # Errors
/// Returns [`NdError::SizeMismatch`] if the mask is longer than the source.
pub fn compress<E, T, const N: usize>(mask: &[bool], src: E) -> Result<Tensor<T, 1>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let size = src.size();
    if mask.len() > size {
        return Err(NdError::SizeMismatch {
            expected: size,
            actual: mask.len(),
        });
    }
    let mut data = Vec::new();
    for (flat, &keep) in mask.iter().enumerate() {
        if keep {
            data.push(src.eval_flat(flat));
        }
    }
    let len = data.len();
    Ok(Tensor::from_parts(data, [len], Order::RowMajor))
}

/// Keep the slices of `src` along `axis` whose mask entry is true. The mask
/// may be shorter than the axis; trailing slices are dropped.
///
/// # Errors
/// Returns [`NdError::InvalidAxis`] for a bad axis and
/// [`NdError::SizeMismatch`] if the mask is longer than the axis extent.
pub fn compress_axis<E, T, const N: usize>(
    mask: &[bool],
    src: E,
    axis: usize,
) -> Result<Tensor<T, N>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    let src_shape = src.shape();
    if mask.len() > src_shape[axis] {
        return Err(NdError::SizeMismatch {
            expected: src_shape[axis],
            actual: mask.len(),
        });
    }
    let kept: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter(|(_, &keep)| keep)
        .map(|(i, _)| i)
        .collect();
    let mut out_shape = src_shape;
    out_shape[axis] = kept.len();
    let mut data = Vec::with_capacity(out_shape.iter().product());
    for mut coord in IndexIter::new(out_shape, Order::RowMajor) {
        coord[axis] = kept[coord[axis]];
        data.push(src.eval(coord));
    }
    Ok(Tensor::from_parts(data, out_shape, Order::RowMajor))
}

/// Extract the elements of `src` where a same-shaped boolean mask is true,
/// flattened in row-major order.
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] if the shapes differ.
pub fn mask_select<M, E, T, const N: usize>(mask: M, src: E) -> Result<Tensor<T, 1>>
where
    M: Expression<N, Elem = bool>,
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let mask_shape = mask.shape();
    check_same_shape(&mask_shape, &src.shape())?;
    let mut data = Vec::new();
    for coord in IndexIter::new(mask_shape, Order::RowMajor) {
        if mask.eval(coord) {
            data.push(src.eval(coord));
        }
    }
    let len = data.len();
    Ok(Tensor::from_parts(data, [len], Order::RowMajor))
}

fn check_same_shape<const N: usize>(a: &[usize; N], b: &[usize; N]) -> Result<()> {
    for axis in 0..N {
        if a[axis] != b[axis] {
            return Err(NdError::shape_mismatch(axis, a[axis], b[axis], a, b));
        }
    }
    Ok(())
}
