//! Shape manipulation: rank changes, joining, repetition, padding.
//!
//! Rank-changing functions take the target rank as a const parameter because
//! the result is a different `[usize; M]` type; the relationship to the
//! source rank (`M == N + 1` or `M == N - 1`) is validated at runtime.

use crate::broadcast::{broadcast_index, broadcast_shapes};
use crate::dense::Tensor;
use crate::expr::Expression;
use crate::iter::IndexIter;
use crate::order::Order;
use crate::view::View;
use crate::{NdError, Result};

/// Insert an axis of extent 1 (stride 0) at `axis`, raising the rank by one.
/// Zero-copy; the result aliases the source buffer.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] unless `M == N + 1` and
/// [`NdError::InvalidAxis`] if `axis > N`.
pub fn expand_dims<'a, T, const N: usize, const M: usize>(
    view: View<'a, T, N>,
    axis: usize,
) -> Result<View<'a, T, M>> {
    if M != N + 1 {
        return Err(NdError::InvalidArgument(format!(
            "expand_dims target rank must be {}, got {M}",
            N + 1
        )));
    }
    if axis > N {
        return Err(NdError::InvalidAxis { axis, rank: M });
    }
    let mut shape = [1usize; M];
    let mut strides = [0isize; M];
    for i in 0..N {
        let out = if i < axis { i } else { i + 1 };
        shape[out] = view.shape()[i];
        strides[out] = view.strides()[i];
    }
    Ok(View::from_raw_parts(
        view.data(),
        shape,
        strides,
        view.offset(),
    ))
}

/// Remove an axis of extent 1, lowering the rank by one. Zero-copy.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] unless `M == N - 1` and the axis has
/// extent 1, and [`NdError::InvalidAxis`] if `axis >= N`.
pub fn squeeze<'a, T, const N: usize, const M: usize>(
    view: View<'a, T, N>,
    axis: usize,
) -> Result<View<'a, T, M>> {
    if N == 0 || M != N - 1 {
        return Err(NdError::InvalidArgument(format!(
            "squeeze target rank must be {}, got {M}",
            N.saturating_sub(1)
        )));
    }
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    if view.dim(axis) != 1 {
        return Err(NdError::InvalidArgument(format!(
            "cannot squeeze axis {axis} with extent {}",
            view.dim(axis)
        )));
    }
    let mut shape = [0usize; M];
    let mut strides = [0isize; M];
    for i in 0..M {
        let src = if i < axis { i } else { i + 1 };
        shape[i] = view.shape()[src];
        strides[i] = view.strides()[src];
    }
    Ok(View::from_raw_parts(
        view.data(),
        shape,
        strides,
        view.offset(),
    ))
}

/// Join expressions end to end along an existing axis.
///
/// All parts must agree on every axis except `axis`.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] for an empty part list,
/// [`NdError::InvalidAxis`] for a bad axis, and [`NdError::ShapeMismatch`]
/// naming the first disagreeing axis.
pub fn concatenate<E, T, const N: usize>(parts: &[E], axis: usize) -> Result<Tensor<T, N>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let first = parts.first().ok_or_else(|| {
        NdError::InvalidArgument("concatenate requires at least one operand".into())
    })?;
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    let base = first.shape();
    let mut total = 0usize;
    for part in parts {
        let shape = part.shape();
        for a in 0..N {
            if a != axis && shape[a] != base[a] {
                return Err(NdError::shape_mismatch(a, base[a], shape[a], &base, &shape));
            }
        }
        total += shape[axis];
    }
    let mut out_shape = base;
    out_shape[axis] = total;
    let mut data = Vec::with_capacity(out_shape.iter().product());
    for mut coord in IndexIter::new(out_shape, Order::RowMajor) {
        let mut pos = coord[axis];
        let mut part = 0;
        while pos >= parts[part].dim(axis) {
            pos -= parts[part].dim(axis);
            part += 1;
        }
        coord[axis] = pos;
        data.push(parts[part].eval(coord));
    }
    Ok(Tensor::from_parts(data, out_shape, Order::RowMajor))
}

/// Join same-shaped expressions along a new axis, raising the rank by one.
/// Part `i` becomes slice `i` of the result along `axis`.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] for an empty part list or a target
/// rank other than `N + 1`, [`NdError::InvalidAxis`] if `axis > N`, and
/// [`NdError::ShapeMismatch`] if the parts disagree anywhere.
pub fn stack<E, T, const N: usize, const M: usize>(
    parts: &[E],
    axis: usize,
) -> Result<Tensor<T, M>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    if M != N + 1 {
        return Err(NdError::InvalidArgument(format!(
            "stack target rank must be {}, got {M}",
            N + 1
        )));
    }
    let first = parts
        .first()
        .ok_or_else(|| NdError::InvalidArgument("stack requires at least one operand".into()))?;
    if axis > N {
        return Err(NdError::InvalidAxis { axis, rank: M });
    }
    let base = first.shape();
    for part in parts {
        let shape = part.shape();
        for a in 0..N {
            if shape[a] != base[a] {
                return Err(NdError::shape_mismatch(a, base[a], shape[a], &base, &shape));
            }
        }
    }
    let mut out_shape = [0usize; M];
    for i in 0..N {
        let out = if i < axis { i } else { i + 1 };
        out_shape[out] = base[i];
    }
    out_shape[axis] = parts.len();
    let mut data = Vec::with_capacity(out_shape.iter().product());
    for coord in IndexIter::new(out_shape, Order::RowMajor) {
        let part = coord[axis];
        let mut inner = [0usize; N];
        for i in 0..N {
            let src = if i < axis { i } else { i + 1 };
            inner[i] = coord[src];
        }
        data.push(parts[part].eval(inner));
    }
    Ok(Tensor::from_parts(data, out_shape, Order::RowMajor))
}

/// Repeat the whole expression `reps[i]` times along each axis.
pub fn tile<E, T, const N: usize>(src: E, reps: [usize; N]) -> Tensor<T, N>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let src_shape = src.shape();
    let mut out_shape = [0usize; N];
    for i in 0..N {
        out_shape[i] = src_shape[i] * reps[i];
    }
    Tensor::from_fn(out_shape, |coord| {
        let mut inner = coord;
        for i in 0..N {
            inner[i] = coord[i] % src_shape[i];
        }
        src.eval(inner)
    })
}

/// Repeat each element `count` times along `axis`.
///
/// # Errors
/// Returns [`NdError::InvalidAxis`] for a bad axis.
pub fn repeat<E, T, const N: usize>(src: E, count: usize, axis: usize) -> Result<Tensor<T, N>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    let mut out_shape = src.shape();
    out_shape[axis] *= count;
    Ok(Tensor::from_fn(out_shape, |coord| {
        let mut inner = coord;
        inner[axis] = coord[axis] / count;
        src.eval(inner)
    }))
}

/// Surround the expression with `widths[i] = (before, after)` copies of
/// `value` along each axis.
pub fn pad<E, T, const N: usize>(src: E, widths: [(usize, usize); N], value: T) -> Tensor<T, N>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let src_shape = src.shape();
    let mut out_shape = [0usize; N];
    for i in 0..N {
        out_shape[i] = widths[i].0 + src_shape[i] + widths[i].1;
    }
    Tensor::from_fn(out_shape, |coord| {
        let mut inner = [0usize; N];
        for i in 0..N {
            let lo = widths[i].0;
            if coord[i] < lo || coord[i] >= lo + src_shape[i] {
                return value;
            }
            inner[i] = coord[i] - lo;
        }
        src.eval(inner)
    })
}

/// Materialize the expression's elements as a rank-1 tensor in row-major
/// order.
pub fn flatten<E, T, const N: usize>(src: E) -> Tensor<T, 1>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let mut data = Vec::with_capacity(src.size());
    for coord in IndexIter::new(src.shape(), Order::RowMajor) {
        data.push(src.eval(coord));
    }
    let len = data.len();
    Tensor::from_parts(data, [len], Order::RowMajor)
}

/// Pair up two expressions elementwise under broadcasting.
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] if the shapes cannot broadcast.
pub fn zip<A, B, TA, TB, const N: usize>(a: A, b: B) -> Result<Tensor<(TA, TB), N>>
where
    A: Expression<N, Elem = TA>,
    B: Expression<N, Elem = TB>,
    TA: Copy,
    TB: Copy,
{
    let a_shape = a.shape();
    let b_shape = b.shape();
    let shape = broadcast_shapes(&a_shape, &b_shape)?;
    Ok(Tensor::from_fn(shape, |coord| {
        (
            a.eval(broadcast_index(coord, &a_shape)),
            b.eval(broadcast_index(coord, &b_shape)),
        )
    }))
}

/// Split a tensor of pairs into two tensors. Inverse of [`zip`].
pub fn unzip<E, TA, TB, const N: usize>(src: E) -> (Tensor<TA, N>, Tensor<TB, N>)
where
    E: Expression<N, Elem = (TA, TB)>,
    TA: Copy,
    TB: Copy,
{
    let shape = src.shape();
    let mut left = Vec::with_capacity(src.size());
    let mut right = Vec::with_capacity(src.size());
    for coord in IndexIter::new(shape, Order::RowMajor) {
        let (a, b) = src.eval(coord);
        left.push(a);
        right.push(b);
    }
    (
        Tensor::from_parts(left, shape, Order::RowMajor),
        Tensor::from_parts(right, shape, Order::RowMajor),
    )
}
