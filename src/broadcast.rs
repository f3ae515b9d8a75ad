//! Stride-0 broadcasting.
//!
//! Broadcasting reconciles equal-rank shapes axis by axis: two extents are
//! compatible when they are equal or one of them is 1, and a size-1 axis is
//! stretched to the other extent. The stretch is virtual: a broadcast view
//! keeps its buffer and sets the stretched axis's stride to 0, so every
//! position along that axis reads the same element. No element is ever
//! copied or allocated.

use crate::view::View;
use crate::{NdError, Result};

/// Reconcile two shapes axis by axis.
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] naming the first offending axis if any
/// pair of extents is neither equal nor 1.
///
/// # Example
/// ```
/// use ndexpr::broadcast_shapes;
///
/// assert_eq!(broadcast_shapes(&[1, 3], &[4, 1]).unwrap(), [4, 3]);
/// assert!(broadcast_shapes(&[2, 3], &[4, 3]).is_err());
/// ```
pub fn broadcast_shapes<const N: usize>(a: &[usize; N], b: &[usize; N]) -> Result<[usize; N]> {
    let mut out = [0usize; N];
    for axis in 0..N {
        out[axis] = match (a[axis], b[axis]) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            (x, y) => return Err(NdError::shape_mismatch(axis, x, y, a, b)),
        };
    }
    Ok(out)
}

/// Reconcile any number of shapes by folding [`broadcast_shapes`] left to
/// right; compatibility is associative, so the fold order does not matter.
pub fn broadcast_all<const N: usize>(shapes: &[[usize; N]]) -> Result<[usize; N]> {
    let (first, rest) = shapes.split_first().ok_or_else(|| {
        NdError::InvalidArgument("broadcast_all requires at least one shape".into())
    })?;
    rest.iter()
        .try_fold(*first, |acc, shape| broadcast_shapes(&acc, shape))
}

/// Stretch a view to `target` by giving size-1 axes stride 0.
///
/// The result aliases the source buffer: a later write to the source is
/// observable through the broadcast view.
///
/// # Errors
/// Returns [`NdError::ShapeMismatch`] if an axis of the view is neither equal
/// to the target extent nor 1.
pub fn broadcast_to<'a, T, const N: usize>(
    view: View<'a, T, N>,
    target: &[usize; N],
) -> Result<View<'a, T, N>> {
    let shape = *view.shape();
    let mut strides = *view.strides();
    for axis in 0..N {
        if shape[axis] == target[axis] {
            continue;
        }
        if shape[axis] == 1 {
            strides[axis] = 0;
        } else {
            return Err(NdError::shape_mismatch(
                axis,
                shape[axis],
                target[axis],
                &shape,
                target,
            ));
        }
    }
    Ok(View::from_raw_parts(view.data(), *target, strides, view.offset()))
}

/// View a single value as a rank-`N` tensor of any shape (all strides 0).
pub fn broadcast_scalar<T, const N: usize>(value: &T, shape: [usize; N]) -> View<'_, T, N> {
    View::from_raw_parts(std::slice::from_ref(value), shape, [0; N], 0)
}

/// Map a coordinate in broadcast space back to an operand's own index space
/// by zeroing the components of its size-1 axes.
#[inline]
pub fn broadcast_index<const N: usize>(
    mut index: [usize; N],
    operand_shape: &[usize; N],
) -> [usize; N] {
    for axis in 0..N {
        if operand_shape[axis] == 1 {
            index[axis] = 0;
        }
    }
    index
}
