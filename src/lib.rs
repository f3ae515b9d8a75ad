//! Dense multidimensional arrays with strided views, broadcasting, and lazy
//! expression evaluation.
//!
//! This crate provides NumPy-like semantics over a fixed, const-generic rank:
//! owned dense tensors, zero-copy strided views, stride-0 broadcasting, and an
//! expression layer that represents chained elementwise operations without
//! materializing intermediate results.
//!
//! # Core Types
//!
//! - [`Tensor`]: An owned dense array (contiguous buffer + shape + [`Order`])
//! - [`View`] / [`ViewMut`]: Zero-copy strided windows over existing data
//! - [`Expression`]: The "tensor-like" capability set (shape, size, per-index
//!   evaluation, iteration, materialization) implemented by tensors, views,
//!   and every lazy node
//! - [`Expr`]: The public wrapper around lazy nodes, carrying the operator
//!   overloads
//!
//! # Broadcasting
//!
//! - [`broadcast_shapes`] / [`broadcast_all`]: Reconcile equal-rank shapes
//! - [`broadcast_to`]: Stretch size-1 axes with stride 0 (no allocation)
//! - [`broadcast_scalar`]: View a single value as a rank-`N` tensor
//!
//! # Lazy Evaluation
//!
//! Operator overloads on [`&Tensor`](Tensor), [`View`], and [`Expr`] build
//! expression nodes instead of computing elements. Shapes are reconciled
//! eagerly at node construction; elements are computed only when the node is
//! indexed, iterated, or materialized with [`Expression::copy`]:
//!
//! ```rust
//! use ndexpr::{Expression, Scalar, Tensor};
//!
//! let a = Tensor::from_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
//! // No element work happens here.
//! let b = (&a + Scalar(10.0)) * Scalar(2.0);
//! assert_eq!(b.shape(), [3]);
//! // The cost is paid exactly once, on copy().
//! assert_eq!(b.copy().as_slice(), &[22.0, 24.0, 26.0]);
//! ```
//!
//! # Views and Slicing
//!
//! ```rust
//! use ndexpr::{SliceSpec, Tensor};
//!
//! let mut a = Tensor::from_vec([4], vec![1, 2, 3, 4]).unwrap();
//! let vals = Tensor::from_vec([2], vec![100, 200]).unwrap();
//! a.view_mut()
//!     .slice_mut([SliceSpec::from(1..3)])
//!     .unwrap()
//!     .assign(&vals)
//!     .unwrap();
//! assert_eq!(a.as_slice(), &[1, 100, 200, 4]);
//! ```
//!
//! # Threading
//!
//! The crate is single-threaded by design: all evaluation happens on the
//! caller's thread within the call that triggers it. Views and expressions
//! borrow their sources; Rust's lifetimes enforce that a source outlives
//! everything reading from it.

mod broadcast;
mod dense;
mod expr;
mod io;
mod iter;
mod manip;
mod order;
pub mod ops;
mod reduce;
mod select;
mod view;

// ============================================================================
// Shape/index model
// ============================================================================
pub use iter::{indices, IndexIter};
pub use order::{ravel_index, unravel_index, Order};

// ============================================================================
// Containers
// ============================================================================
pub use dense::Tensor;
pub use view::{SliceSpec, View, ViewMut};

// ============================================================================
// Broadcasting engine
// ============================================================================
pub use broadcast::{
    broadcast_all, broadcast_index, broadcast_scalar, broadcast_shapes, broadcast_to,
};

// ============================================================================
// Lazy expressions
// ============================================================================
pub use expr::{
    BinaryExpr, CastExpr, Elements, Expr, Expression, Fill, ReverseExpr, Scalar, ScalarLhsExpr,
    ScalarRhsExpr, UnaryExpr,
};

// ============================================================================
// Comparison / logical combinators and elementwise helpers
// ============================================================================
pub use ops::{and, conj, eq, ge, gt, le, lt, ne, or, xor, Conjugate};

// ============================================================================
// Indexing and selection
// ============================================================================
pub use select::{
    compress, compress_axis, mask_select, place, put, putmask, select, take, take_axis, where_,
    SelectSource, WhereExpr,
};

// ============================================================================
// Shape manipulation
// ============================================================================
pub use manip::{concatenate, expand_dims, flatten, pad, repeat, squeeze, stack, tile, unzip, zip};

// ============================================================================
// Reductions
// ============================================================================
pub use reduce::{maximum, mean, minimum, product, reduce, reduce_axis, sum, var};

// ============================================================================
// Persistence
// ============================================================================
pub use io::{read_vector, write_tensor, Pod};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during array operations.
#[derive(Debug, thiserror::Error)]
pub enum NdError {
    /// Two operand shapes are not broadcast-compatible. Carries the offending
    /// axis, both conflicting extents, and both full operand shapes.
    #[error("shape mismatch at axis {axis}: {lhs} vs {rhs} (operand shapes {lhs_shape:?} and {rhs_shape:?})")]
    ShapeMismatch {
        axis: usize,
        lhs: usize,
        rhs: usize,
        lhs_shape: Vec<usize>,
        rhs_shape: Vec<usize>,
    },

    /// An element count does not match the expected total.
    #[error("size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A coordinate component lies outside its axis extent.
    #[error("index {index} out of range for axis {axis} with extent {extent}")]
    IndexOutOfRange {
        index: usize,
        axis: usize,
        extent: usize,
    },

    /// A flat position lies outside `0..len`.
    #[error("flat index {index} out of range for length {len}")]
    FlatIndexOutOfRange { index: usize, len: usize },

    /// A view's reachable offsets do not all lie inside its buffer.
    #[error("view out of bounds: reachable offsets {lo}..={hi} exceed buffer of length {len}")]
    ViewOutOfBounds { lo: isize, hi: isize, len: usize },

    /// Invalid axis index for the given rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Malformed construction parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The storage layer could not obtain a buffer of the requested size.
    #[error("allocation of {requested} elements failed")]
    AllocationFailure { requested: usize },

    /// An underlying I/O failure from the persistence layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NdError {
    pub(crate) fn shape_mismatch(
        axis: usize,
        lhs: usize,
        rhs: usize,
        lhs_shape: &[usize],
        rhs_shape: &[usize],
    ) -> Self {
        NdError::ShapeMismatch {
            axis,
            lhs,
            rhs,
            lhs_shape: lhs_shape.to_vec(),
            rhs_shape: rhs_shape.to_vec(),
        }
    }
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, NdError>;
