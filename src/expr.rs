//! Lazy expression nodes.
//!
//! An expression is anything that can report a shape and produce an element
//! for a coordinate: tensors, views, and the node types in this module.
//! Building a node performs no element work; shapes are reconciled eagerly at
//! construction so shape errors surface at the erroneous call site, while the
//! arithmetic itself runs only when the node is indexed, iterated, or
//! materialized with [`Expression::copy`]. Nested nodes monomorphize, so a
//! chain like `(a + b) * c` evaluates per element with no intermediate
//! allocation.
//!
//! Dense operands enter an expression by reference (`&Tensor`); views and
//! nested nodes are small `Copy` descriptors and enter by value. Either way
//! the underlying buffers are only borrowed, and the borrow checker keeps
//! every source alive for as long as the expression can read from it.

use crate::broadcast::{broadcast_index, broadcast_shapes};
use crate::dense::Tensor;
use crate::iter::IndexIter;
use crate::order::{unravel_index, Order};
use crate::view::View;
use crate::{NdError, Result};
use num_traits::AsPrimitive;
use std::marker::PhantomData;

/// The tensor-like capability set: a shape plus per-coordinate evaluation.
///
/// Implemented by [`&Tensor`](Tensor), [`View`], and every lazy node. All
/// other behavior (size queries, iteration, materialization, casting,
/// reversal) is derived from these two methods.
pub trait Expression<const N: usize>: Sized {
    /// The element type produced by evaluation.
    type Elem: Copy;

    /// Extent of each axis of the expression's result.
    fn shape(&self) -> [usize; N];

    /// Compute the element at `index`.
    ///
    /// Indices are assumed valid for [`Expression::shape`]; implementations
    /// over storage panic on out-of-bounds coordinates.
    fn eval(&self, index: [usize; N]) -> Self::Elem;

    /// Extent of axis `axis`.
    fn dim(&self, axis: usize) -> usize {
        self.shape()[axis]
    }

    /// Total number of elements in the result.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Number of axes.
    fn ndim(&self) -> usize {
        N
    }

    /// True if any axis has extent 0.
    fn is_empty(&self) -> bool {
        self.shape().contains(&0)
    }

    /// Compute the element at row-major flat position `flat`.
    fn eval_flat(&self, flat: usize) -> Self::Elem {
        self.eval(unravel_index(flat, &self.shape(), Order::RowMajor))
    }

    /// Materialize the expression into an owned row-major tensor.
    ///
    /// This is the point where the deferred element work is actually paid.
    fn copy(&self) -> Tensor<Self::Elem, N> {
        self.copy_in(Order::RowMajor)
    }

    /// Materialize into an owned tensor with the given layout.
    fn copy_in(&self, order: Order) -> Tensor<Self::Elem, N> {
        let shape = self.shape();
        let mut data = Vec::with_capacity(self.size());
        for index in IndexIter::new(shape, order) {
            data.push(self.eval(index));
        }
        Tensor::from_parts(data, shape, order)
    }

    /// Iterate the expression's elements in row-major order.
    fn iter(&self) -> Elements<'_, Self, N> {
        self.iter_in(Order::RowMajor)
    }

    /// Iterate the expression's elements in the given traversal order.
    fn iter_in(&self, order: Order) -> Elements<'_, Self, N> {
        Elements {
            indices: IndexIter::new(self.shape(), order),
            expr: self,
        }
    }

    /// Lazily convert every element to `U` with primitive-cast semantics.
    fn cast<U>(self) -> Expr<CastExpr<Self, Self::Elem, U, N>, N>
    where
        Self::Elem: AsPrimitive<U>,
        U: Copy + 'static,
    {
        Expr(CastExpr {
            a: self,
            _cast: PhantomData,
        })
    }

    /// Lazily reverse the expression along `axis`.
    fn reverse(self, axis: usize) -> Result<Expr<ReverseExpr<Self, N>, N>> {
        if axis >= N {
            return Err(NdError::InvalidAxis { axis, rank: N });
        }
        let shape = self.shape();
        Ok(Expr(ReverseExpr {
            a: self,
            axis,
            shape,
        }))
    }
}

// References to expressions are expressions, so an operand can be reused
// without consuming it. Does not overlap the `&Tensor` impl below because
// `Tensor` itself is not an expression (only `&Tensor` is).
impl<'a, E: Expression<N>, const N: usize> Expression<N> for &'a E {
    type Elem = E::Elem;

    #[inline]
    fn shape(&self) -> [usize; N] {
        (**self).shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> E::Elem {
        (**self).eval(index)
    }
}

impl<'a, T: Copy, const N: usize> Expression<N> for &'a Tensor<T, N> {
    type Elem = T;

    #[inline]
    fn shape(&self) -> [usize; N] {
        *Tensor::shape(self)
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> T {
        (**self)[index]
    }
}

impl<'a, T: Copy, const N: usize> Expression<N> for View<'a, T, N> {
    type Elem = T;

    #[inline]
    fn shape(&self) -> [usize; N] {
        *View::shape(self)
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> T {
        self.get(index)
    }
}

/// Public wrapper around a lazy node; the operator overloads live on this
/// type (and on [`&Tensor`](Tensor) and [`View`]).
///
/// The rank rides along as a const parameter so operator impls can name it.
#[derive(Debug, Clone, Copy)]
pub struct Expr<E, const N: usize>(pub E);

impl<E: Expression<N>, const N: usize> Expression<N> for Expr<E, N> {
    type Elem = E::Elem;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.0.shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> E::Elem {
        self.0.eval(index)
    }
}

/// A plain value used as an operand: `&t + Scalar(1.0)` adds 1 to every
/// element without allocating a filled tensor.
///
/// `Scalar` is an operand marker, not an [`Expression`]; to use a single
/// value as a standalone rank-`N` expression, see [`Fill`] or
/// [`crate::broadcast_scalar`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar<T>(pub T);

/// Elementwise application of a unary function.
#[derive(Debug, Clone, Copy)]
pub struct UnaryExpr<A, T, U> {
    op: fn(T) -> U,
    a: A,
}

impl<A, T, U> UnaryExpr<A, T, U> {
    pub fn new(op: fn(T) -> U, a: A) -> Self {
        Self { op, a }
    }
}

impl<A, T, U, const N: usize> Expression<N> for UnaryExpr<A, T, U>
where
    A: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    type Elem = U;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.a.shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> U {
        (self.op)(self.a.eval(index))
    }
}

/// Elementwise combination of two expressions under broadcasting.
///
/// The result shape is reconciled at construction; each operand's original
/// shape is retained so evaluation can fold broadcast coordinates back into
/// the operand's own index space.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr<A, B, T, U, const N: usize> {
    op: fn(T, T) -> U,
    lhs: A,
    rhs: B,
    lhs_shape: [usize; N],
    rhs_shape: [usize; N],
    shape: [usize; N],
}

impl<A, B, T, U, const N: usize> BinaryExpr<A, B, T, U, N>
where
    A: Expression<N, Elem = T>,
    B: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    /// Build the node, reconciling operand shapes eagerly.
    ///
    /// # Errors
    /// Returns [`NdError::ShapeMismatch`] if the shapes cannot broadcast.
    pub fn new(op: fn(T, T) -> U, lhs: A, rhs: B) -> Result<Self> {
        let lhs_shape = lhs.shape();
        let rhs_shape = rhs.shape();
        let shape = broadcast_shapes(&lhs_shape, &rhs_shape)?;
        Ok(Self {
            op,
            lhs,
            rhs,
            lhs_shape,
            rhs_shape,
            shape,
        })
    }
}

impl<A, B, T, U, const N: usize> Expression<N> for BinaryExpr<A, B, T, U, N>
where
    A: Expression<N, Elem = T>,
    B: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    type Elem = U;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.shape
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> U {
        let a = self.lhs.eval(broadcast_index(index, &self.lhs_shape));
        let b = self.rhs.eval(broadcast_index(index, &self.rhs_shape));
        (self.op)(a, b)
    }
}

/// `expr op scalar`, with the scalar held by value on the right.
#[derive(Debug, Clone, Copy)]
pub struct ScalarRhsExpr<A, T, U> {
    op: fn(T, T) -> U,
    lhs: A,
    rhs: T,
}

impl<A, T, U> ScalarRhsExpr<A, T, U> {
    pub fn new(op: fn(T, T) -> U, lhs: A, rhs: T) -> Self {
        Self { op, lhs, rhs }
    }
}

impl<A, T, U, const N: usize> Expression<N> for ScalarRhsExpr<A, T, U>
where
    A: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    type Elem = U;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.lhs.shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> U {
        (self.op)(self.lhs.eval(index), self.rhs)
    }
}

/// `scalar op expr`, with the scalar held by value on the left. Kept distinct
/// from [`ScalarRhsExpr`] because the wrapped operators are not commutative.
#[derive(Debug, Clone, Copy)]
pub struct ScalarLhsExpr<B, T, U> {
    op: fn(T, T) -> U,
    lhs: T,
    rhs: B,
}

impl<B, T, U> ScalarLhsExpr<B, T, U> {
    pub fn new(op: fn(T, T) -> U, lhs: T, rhs: B) -> Self {
        Self { op, lhs, rhs }
    }
}

impl<B, T, U, const N: usize> Expression<N> for ScalarLhsExpr<B, T, U>
where
    B: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    type Elem = U;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.rhs.shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> U {
        (self.op)(self.lhs, self.rhs.eval(index))
    }
}

/// Lazy elementwise conversion to another primitive type.
#[derive(Debug, Clone, Copy)]
pub struct CastExpr<A, T, U, const N: usize> {
    a: A,
    _cast: PhantomData<fn(T) -> U>,
}

impl<A, T, U, const N: usize> Expression<N> for CastExpr<A, T, U, N>
where
    A: Expression<N, Elem = T>,
    T: Copy + AsPrimitive<U>,
    U: Copy + 'static,
{
    type Elem = U;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.a.shape()
    }

    #[inline]
    fn eval(&self, index: [usize; N]) -> U {
        self.a.eval(index).as_()
    }
}

/// Lazy reversal along one axis; coordinates are mirrored at evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ReverseExpr<A, const N: usize> {
    a: A,
    axis: usize,
    shape: [usize; N],
}

impl<A, const N: usize> Expression<N> for ReverseExpr<A, N>
where
    A: Expression<N>,
{
    type Elem = A::Elem;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.shape
    }

    #[inline]
    fn eval(&self, mut index: [usize; N]) -> A::Elem {
        index[self.axis] = self.shape[self.axis] - 1 - index[self.axis];
        self.a.eval(index)
    }
}

/// A constant expression: one value at every coordinate of a shape, with no
/// backing storage.
#[derive(Debug, Clone, Copy)]
pub struct Fill<T, const N: usize> {
    value: T,
    shape: [usize; N],
}

impl<T, const N: usize> Fill<T, N> {
    pub fn new(value: T, shape: [usize; N]) -> Self {
        Self { value, shape }
    }
}

impl<T: Copy, const N: usize> Expression<N> for Fill<T, N> {
    type Elem = T;

    #[inline]
    fn shape(&self) -> [usize; N] {
        self.shape
    }

    #[inline]
    fn eval(&self, _index: [usize; N]) -> T {
        self.value
    }
}

/// Iterator over an expression's elements in a chosen traversal order.
///
/// Each step evaluates one element; nothing is materialized up front.
#[derive(Debug, Clone)]
pub struct Elements<'e, E, const N: usize> {
    expr: &'e E,
    indices: IndexIter<N>,
}

impl<'e, E: Expression<N>, const N: usize> Iterator for Elements<'e, E, N> {
    type Item = E::Elem;

    #[inline]
    fn next(&mut self) -> Option<E::Elem> {
        self.indices.next().map(|index| self.expr.eval(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl<'e, E: Expression<N>, const N: usize> ExactSizeIterator for Elements<'e, E, N> {}

impl<'e, E: Expression<N>, const N: usize> std::iter::FusedIterator for Elements<'e, E, N> {}

/// Build a binary node, panicking on shape mismatch. Backs the operator
/// overloads, which cannot return `Result`.
pub(crate) fn checked_binary<A, B, T, U, const N: usize>(
    op: fn(T, T) -> U,
    lhs: A,
    rhs: B,
) -> Expr<BinaryExpr<A, B, T, U, N>, N>
where
    A: Expression<N, Elem = T>,
    B: Expression<N, Elem = T>,
    T: Copy,
    U: Copy,
{
    match BinaryExpr::new(op, lhs, rhs) {
        Ok(node) => Expr(node),
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    /// Counts how many elements are actually evaluated.
    struct Probe<'c> {
        evals: &'c Cell<usize>,
        shape: [usize; 1],
    }

    impl<'c> Expression<1> for Probe<'c> {
        type Elem = i32;

        fn shape(&self) -> [usize; 1] {
            self.shape
        }

        fn eval(&self, index: [usize; 1]) -> i32 {
            self.evals.set(self.evals.get() + 1);
            index[0] as i32
        }
    }

    #[test]
    fn test_construction_does_no_element_work() {
        let evals = Cell::new(0);
        let probe = Probe {
            evals: &evals,
            shape: [100],
        };
        let node = ScalarRhsExpr::new(add, probe, 1);
        assert_eq!(node.shape(), [100]);
        assert_eq!(node.size(), 100);
        assert_eq!(evals.get(), 0);

        assert_eq!(node.eval([7]), 8);
        assert_eq!(evals.get(), 1);

        node.copy();
        assert_eq!(evals.get(), 101);
    }

    #[test]
    fn test_binary_broadcasts_operands() {
        let row = Tensor::from_vec([1, 3], vec![1, 2, 3]).unwrap();
        let col = Tensor::from_vec([4, 1], vec![10, 20, 30, 40]).unwrap();
        let node = BinaryExpr::new(add, &row, &col).unwrap();
        assert_eq!(node.shape(), [4, 3]);
        assert_eq!(node.eval([0, 0]), 11);
        assert_eq!(node.eval([3, 2]), 43);
    }

    #[test]
    fn test_binary_rejects_incompatible_shapes() {
        let a = Tensor::from_vec([3], vec![1, 2, 3]).unwrap();
        let b = Tensor::from_vec([4], vec![1, 2, 3, 4]).unwrap();
        let err = BinaryExpr::new(add, &a, &b).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('4'), "got: {msg}");
    }

    #[test]
    fn test_nested_nodes_compose() {
        let a = Tensor::from_vec([2], vec![1, 2]).unwrap();
        let inner = ScalarRhsExpr::new(add, &a, 10);
        let outer = ScalarLhsExpr::new(add, 100, inner);
        assert_eq!(outer.copy().as_slice(), &[111, 112]);
    }

    #[test]
    fn test_cast() {
        let a = Tensor::from_vec([3], vec![1.9f64, -0.5, 2.0]).unwrap();
        let cast = (&a).cast::<i32>();
        assert_eq!(cast.copy().as_slice(), &[1, 0, 2]);
    }

    #[test]
    fn test_reverse() {
        let a = Tensor::from_fn([2, 3], |[i, j]| (i * 3 + j) as i32);
        let rev = (&a).reverse(1).unwrap();
        assert_eq!(rev.copy().as_slice(), &[2, 1, 0, 5, 4, 3]);
        assert!((&a).reverse(2).is_err());
    }

    #[test]
    fn test_fill() {
        let fill = Fill::new(5, [2, 2]);
        assert_eq!(fill.copy().as_slice(), &[5, 5, 5, 5]);
    }

    #[test]
    fn test_copy_in_col_major() {
        let a = Tensor::from_fn([2, 3], |[i, j]| i * 10 + j);
        let col = (&a).copy_in(Order::ColMajor);
        assert_eq!(col.as_slice(), &[0, 10, 1, 11, 2, 12]);
        assert_eq!(col[[1, 2]], a[[1, 2]]);
    }

    #[test]
    fn test_elements_iterator() {
        let a = Tensor::from_fn([2, 2], |[i, j]| i * 2 + j);
        let collected: Vec<_> = a.view().iter().collect();
        assert_eq!(collected, vec![0, 1, 2, 3]);
        let col: Vec<_> = a.view().iter_in(Order::ColMajor).collect();
        assert_eq!(col, vec![0, 2, 1, 3]);
    }
}
