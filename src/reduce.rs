//! Reductions over expressions.
//!
//! [`reduce`] is the general map-then-fold; everything else is a wrapper
//! around it. Axis reductions keep the rank, collapsing the reduced axis to
//! extent 1 so the result broadcasts back against the source.

use crate::dense::Tensor;
use crate::expr::Expression;
use crate::iter::IndexIter;
use crate::order::Order;
use crate::{NdError, Result};
use num_traits::{Float, One, Zero};

/// Map every element through `map_fn` and fold the results with `reduce_fn`,
/// starting from `init`. Elements are visited in row-major order.
pub fn reduce<E, T, U, const N: usize>(
    src: E,
    map_fn: impl Fn(T) -> U,
    reduce_fn: impl Fn(U, U) -> U,
    init: U,
) -> U
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let mut acc = init;
    for coord in IndexIter::new(src.shape(), Order::RowMajor) {
        acc = reduce_fn(acc, map_fn(src.eval(coord)));
    }
    acc
}

/// [`reduce`] along a single axis. The reduced axis collapses to extent 1
/// instead of disappearing, so the result broadcasts against the source.
///
/// # Errors
/// Returns [`NdError::InvalidAxis`] for a bad axis.
pub fn reduce_axis<E, T, U, const N: usize>(
    src: E,
    axis: usize,
    map_fn: impl Fn(T) -> U,
    reduce_fn: impl Fn(U, U) -> U,
    init: U,
) -> Result<Tensor<U, N>>
where
    E: Expression<N, Elem = T>,
    T: Copy,
    U: Clone,
{
    if axis >= N {
        return Err(NdError::InvalidAxis { axis, rank: N });
    }
    let src_shape = src.shape();
    let mut out_shape = src_shape;
    out_shape[axis] = 1;
    let mut data = Vec::with_capacity(out_shape.iter().product());
    for coord in IndexIter::new(out_shape, Order::RowMajor) {
        let mut acc = init.clone();
        let mut inner = coord;
        for k in 0..src_shape[axis] {
            inner[axis] = k;
            acc = reduce_fn(acc, map_fn(src.eval(inner)));
        }
        data.push(acc);
    }
    Ok(Tensor::from_parts(data, out_shape, Order::RowMajor))
}

/// Sum of all elements; 0 for an empty expression.
pub fn sum<E, T, const N: usize>(src: E) -> T
where
    E: Expression<N, Elem = T>,
    T: Copy + Zero,
{
    reduce(src, |x| x, |a, b| a + b, T::zero())
}

/// Product of all elements; 1 for an empty expression.
pub fn product<E, T, const N: usize>(src: E) -> T
where
    E: Expression<N, Elem = T>,
    T: Copy + One,
{
    reduce(src, |x| x, |a, b| a * b, T::one())
}

/// Smallest element.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] for an empty expression, which has
/// no minimum.
pub fn minimum<E, T, const N: usize>(src: E) -> Result<T>
where
    E: Expression<N, Elem = T>,
    T: Copy + PartialOrd,
{
    extremum(src, |candidate, best| candidate < best)
        .ok_or_else(|| NdError::InvalidArgument("minimum of an empty expression".into()))
}

/// Largest element.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] for an empty expression, which has
/// no maximum.
pub fn maximum<E, T, const N: usize>(src: E) -> Result<T>
where
    E: Expression<N, Elem = T>,
    T: Copy + PartialOrd,
{
    extremum(src, |candidate, best| candidate > best)
        .ok_or_else(|| NdError::InvalidArgument("maximum of an empty expression".into()))
}

fn extremum<E, T, const N: usize>(src: E, better: impl Fn(T, T) -> bool) -> Option<T>
where
    E: Expression<N, Elem = T>,
    T: Copy,
{
    let mut best: Option<T> = None;
    for coord in IndexIter::new(src.shape(), Order::RowMajor) {
        let candidate = src.eval(coord);
        best = Some(match best {
            Some(b) if !better(candidate, b) => b,
            _ => candidate,
        });
    }
    best
}

/// Arithmetic mean of all elements.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] for an empty expression.
pub fn mean<E, T, const N: usize>(src: E) -> Result<T>
where
    E: Expression<N, Elem = T>,
    T: Float,
{
    if src.is_empty() {
        return Err(NdError::InvalidArgument("mean of an empty expression".into()));
    }
    let count = count_of(src.size())?;
    Ok(sum(&src) / count)
}

/// Variance of all elements with `ddof` delta degrees of freedom (0 for the
/// population variance, 1 for the sample variance).
///
/// Computed in two passes: mean first, then the averaged squared deviations.
///
/// # Errors
/// Returns [`NdError::InvalidArgument`] when fewer than `ddof + 1` elements
/// are present, which leaves no degrees of freedom.
pub fn var<E, T, const N: usize>(src: E, ddof: usize) -> Result<T>
where
    E: Expression<N, Elem = T>,
    T: Float,
{
    let size = src.size();
    if size <= ddof {
        return Err(NdError::InvalidArgument(format!(
            "variance needs more than {ddof} elements, got {size}"
        )));
    }
    let center = mean(&src)?;
    let sq_dev = reduce(
        &src,
        |x| {
            let d = x - center;
            d * d
        },
        |a, b| a + b,
        T::zero(),
    );
    Ok(sq_dev / count_of(size - ddof)?)
}

fn count_of<T: Float>(n: usize) -> Result<T> {
    T::from(n).ok_or_else(|| {
        NdError::InvalidArgument("element count does not fit the float type".into())
    })
}
