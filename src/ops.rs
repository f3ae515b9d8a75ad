//! Operator overloads and elementwise helpers.
//!
//! The `std::ops` operators on [`&Tensor`](Tensor), [`View`], and [`Expr`]
//! build lazy nodes instead of computing elements. Shapes are reconciled at
//! the operator call; because `std::ops` signatures cannot return `Result`,
//! an incompatible shape panics there with the same message the fallible
//! constructors report. Code that needs to handle mismatched shapes as a
//! value should go through [`BinaryExpr::new`] or the comparison functions
//! in this module, which do return `Result`.
//!
//! A plain value becomes an operand by wrapping it in [`Scalar`]:
//! `&t * Scalar(2.0)`. Both operand positions are covered.

use crate::dense::Tensor;
use crate::expr::{checked_binary, BinaryExpr, Expr, Scalar, ScalarLhsExpr, ScalarRhsExpr, UnaryExpr};
use crate::view::View;
use crate::{Expression, Result};
use num_complex::Complex;
use num_traits::Num;

macro_rules! impl_binary_op {
    ($($op:ident :: $method:ident),* $(,)?) => {$(
        impl<'a, T, R, const N: usize> ::std::ops::$op<R> for &'a Tensor<T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            R: Expression<N, Elem = T>,
        {
            type Output = Expr<BinaryExpr<&'a Tensor<T, N>, R, T, T, N>, N>;

            fn $method(self, rhs: R) -> Self::Output {
                checked_binary(::std::ops::$op::$method as fn(T, T) -> T, self, rhs)
            }
        }

        impl<'a, T, R, const N: usize> ::std::ops::$op<R> for View<'a, T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            R: Expression<N, Elem = T>,
        {
            type Output = Expr<BinaryExpr<View<'a, T, N>, R, T, T, N>, N>;

            fn $method(self, rhs: R) -> Self::Output {
                checked_binary(::std::ops::$op::$method as fn(T, T) -> T, self, rhs)
            }
        }

        impl<E, T, R, const N: usize> ::std::ops::$op<R> for Expr<E, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            E: Expression<N, Elem = T>,
            R: Expression<N, Elem = T>,
        {
            type Output = Expr<BinaryExpr<Expr<E, N>, R, T, T, N>, N>;

            fn $method(self, rhs: R) -> Self::Output {
                checked_binary(::std::ops::$op::$method as fn(T, T) -> T, self, rhs)
            }
        }

        impl<'a, T, const N: usize> ::std::ops::$op<Scalar<T>> for &'a Tensor<T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<ScalarRhsExpr<&'a Tensor<T, N>, T, T>, N>;

            fn $method(self, rhs: Scalar<T>) -> Self::Output {
                Expr(ScalarRhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self,
                    rhs.0,
                ))
            }
        }

        impl<'a, T, const N: usize> ::std::ops::$op<Scalar<T>> for View<'a, T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<ScalarRhsExpr<View<'a, T, N>, T, T>, N>;

            fn $method(self, rhs: Scalar<T>) -> Self::Output {
                Expr(ScalarRhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self,
                    rhs.0,
                ))
            }
        }

        impl<E, T, const N: usize> ::std::ops::$op<Scalar<T>> for Expr<E, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            E: Expression<N, Elem = T>,
        {
            type Output = Expr<ScalarRhsExpr<Expr<E, N>, T, T>, N>;

            fn $method(self, rhs: Scalar<T>) -> Self::Output {
                Expr(ScalarRhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self,
                    rhs.0,
                ))
            }
        }

        impl<'a, T, const N: usize> ::std::ops::$op<&'a Tensor<T, N>> for Scalar<T>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<ScalarLhsExpr<&'a Tensor<T, N>, T, T>, N>;

            fn $method(self, rhs: &'a Tensor<T, N>) -> Self::Output {
                Expr(ScalarLhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self.0,
                    rhs,
                ))
            }
        }

        impl<'a, T, const N: usize> ::std::ops::$op<View<'a, T, N>> for Scalar<T>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<ScalarLhsExpr<View<'a, T, N>, T, T>, N>;

            fn $method(self, rhs: View<'a, T, N>) -> Self::Output {
                Expr(ScalarLhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self.0,
                    rhs,
                ))
            }
        }

        impl<E, T, const N: usize> ::std::ops::$op<Expr<E, N>> for Scalar<T>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            E: Expression<N, Elem = T>,
        {
            type Output = Expr<ScalarLhsExpr<Expr<E, N>, T, T>, N>;

            fn $method(self, rhs: Expr<E, N>) -> Self::Output {
                Expr(ScalarLhsExpr::new(
                    ::std::ops::$op::$method as fn(T, T) -> T,
                    self.0,
                    rhs,
                ))
            }
        }
    )*};
}

impl_binary_op!(
    Add::add,
    Sub::sub,
    Mul::mul,
    Div::div,
    Rem::rem,
    BitAnd::bitand,
    BitOr::bitor,
    BitXor::bitxor,
    Shl::shl,
    Shr::shr,
);

macro_rules! impl_unary_op {
    ($($op:ident :: $method:ident),* $(,)?) => {$(
        impl<'a, T, const N: usize> ::std::ops::$op for &'a Tensor<T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<UnaryExpr<&'a Tensor<T, N>, T, T>, N>;

            fn $method(self) -> Self::Output {
                Expr(UnaryExpr::new(::std::ops::$op::$method as fn(T) -> T, self))
            }
        }

        impl<'a, T, const N: usize> ::std::ops::$op for View<'a, T, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
        {
            type Output = Expr<UnaryExpr<View<'a, T, N>, T, T>, N>;

            fn $method(self) -> Self::Output {
                Expr(UnaryExpr::new(::std::ops::$op::$method as fn(T) -> T, self))
            }
        }

        impl<E, T, const N: usize> ::std::ops::$op for Expr<E, N>
        where
            T: Copy + ::std::ops::$op<Output = T>,
            E: Expression<N, Elem = T>,
        {
            type Output = Expr<UnaryExpr<Expr<E, N>, T, T>, N>;

            fn $method(self) -> Self::Output {
                Expr(UnaryExpr::new(::std::ops::$op::$method as fn(T) -> T, self))
            }
        }
    )*};
}

impl_unary_op!(Neg::neg, Not::not);

// ============================================================================
// Comparisons
// ============================================================================

macro_rules! comparison_fn {
    ($(#[$doc:meta] $name:ident => $body:expr),* $(,)?) => {$(
        #[$doc]
        ///
        /// Yields a lazy boolean expression over the broadcast shape.
        ///
        /// # Errors
        /// Returns [`crate::NdError::ShapeMismatch`] if the operand shapes
        /// cannot broadcast.
        pub fn $name<L, R, T, const N: usize>(
            lhs: L,
            rhs: R,
        ) -> Result<Expr<BinaryExpr<L, R, T, bool, N>, N>>
        where
            L: Expression<N, Elem = T>,
            R: Expression<N, Elem = T>,
            T: Copy + PartialOrd,
        {
            Ok(Expr(BinaryExpr::new($body, lhs, rhs)?))
        }
    )*};
}

comparison_fn!(
    /// Elementwise `lhs == rhs`.
    eq => |a, b| a == b,
    /// Elementwise `lhs != rhs`.
    ne => |a, b| a != b,
    /// Elementwise `lhs < rhs`.
    lt => |a, b| a < b,
    /// Elementwise `lhs <= rhs`.
    le => |a, b| a <= b,
    /// Elementwise `lhs > rhs`.
    gt => |a, b| a > b,
    /// Elementwise `lhs >= rhs`.
    ge => |a, b| a >= b,
);

// ============================================================================
// Boolean combinators
// ============================================================================

macro_rules! logical_fn {
    ($(#[$doc:meta] $name:ident => $body:expr),* $(,)?) => {$(
        #[$doc]
        ///
        /// # Errors
        /// Returns [`crate::NdError::ShapeMismatch`] if the operand shapes
        /// cannot broadcast.
        pub fn $name<L, R, const N: usize>(
            lhs: L,
            rhs: R,
        ) -> Result<Expr<BinaryExpr<L, R, bool, bool, N>, N>>
        where
            L: Expression<N, Elem = bool>,
            R: Expression<N, Elem = bool>,
        {
            Ok(Expr(BinaryExpr::new($body, lhs, rhs)?))
        }
    )*};
}

logical_fn!(
    /// Elementwise conjunction of two boolean expressions.
    and => |a, b| a && b,
    /// Elementwise disjunction of two boolean expressions.
    or => |a, b| a || b,
    /// Elementwise exclusive-or of two boolean expressions.
    xor => |a, b| a ^ b,
);

// ============================================================================
// Conjugation
// ============================================================================

/// Complex conjugation, a no-op for real element types.
pub trait Conjugate: Copy {
    fn conj(self) -> Self;
}

macro_rules! impl_conjugate_real {
    ($($t:ty),* $(,)?) => {$(
        impl Conjugate for $t {
            #[inline]
            fn conj(self) -> Self {
                self
            }
        }
    )*};
}

impl_conjugate_real!(f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T> Conjugate for Complex<T>
where
    T: Copy + Num + std::ops::Neg<Output = T>,
{
    #[inline]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }
}

/// Lazily conjugate every element of an expression.
pub fn conj<E, const N: usize>(expr: E) -> Expr<UnaryExpr<E, E::Elem, E::Elem>, N>
where
    E: Expression<N>,
    E::Elem: Conjugate,
{
    Expr(UnaryExpr::new(
        <E::Elem as Conjugate>::conj as fn(E::Elem) -> E::Elem,
        expr,
    ))
}
