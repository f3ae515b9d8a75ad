//! End-to-end tests for broadcasting, lazy evaluation, and reductions.

use approx::assert_relative_eq;
use ndexpr::{
    and, broadcast_shapes, broadcast_to, conj, ge, indices, lt, mean, ravel_index, sum,
    unravel_index, var, BinaryExpr, Expr, Expression, NdError, Order, Scalar, Tensor,
};
use num_complex::Complex64;
use std::cell::Cell;

#[test]
fn broadcast_is_commutative_and_associative() {
    let a = [1, 3, 5];
    let b = [4, 1, 5];
    let c = [1, 1, 5];
    assert_eq!(
        broadcast_shapes(&a, &b).unwrap(),
        broadcast_shapes(&b, &a).unwrap()
    );
    let left = broadcast_shapes(&broadcast_shapes(&a, &b).unwrap(), &c).unwrap();
    let right = broadcast_shapes(&a, &broadcast_shapes(&b, &c).unwrap()).unwrap();
    assert_eq!(left, right);
    assert_eq!(left, [4, 3, 5]);
}

#[test]
fn broadcast_view_reads_source_without_copying() {
    let mut row = Tensor::from_vec([1, 3], vec![1, 2, 3]).unwrap();
    {
        let wide = row.broadcast(&[4, 3]).unwrap();
        assert_eq!(wide.strides(), &[0, 1]);
        for i in 0..4 {
            assert_eq!(wide.get([i, 0]), 1);
        }
    }
    // A write to the source is visible through a fresh broadcast view.
    row[[0, 0]] = 42;
    let wide = row.broadcast(&[4, 3]).unwrap();
    for i in 0..4 {
        assert_eq!(wide.get([i, 0]), 42);
    }
}

#[test]
fn broadcast_rejects_non_unit_mismatch() {
    let t = Tensor::from_vec([2, 3], vec![0; 6]).unwrap();
    let err = t.broadcast(&[4, 3]).unwrap_err();
    assert!(matches!(err, NdError::ShapeMismatch { axis: 0, .. }));
}

#[test]
fn ravel_unravel_are_mutual_inverses() {
    let shape = [2, 3, 4];
    for order in [Order::RowMajor, Order::ColMajor] {
        let mut seen = vec![false; 24];
        for coord in indices(shape, order) {
            let flat = ravel_index(&coord, &shape, order);
            assert!(!seen[flat]);
            seen[flat] = true;
            assert_eq!(unravel_index(flat, &shape, order), coord);
        }
        assert!(seen.iter().all(|&s| s));
    }
}

/// Expression that counts how many elements it is asked to produce.
struct CountingExpr<'c> {
    evals: &'c Cell<usize>,
}

impl<'c> Expression<1> for CountingExpr<'c> {
    type Elem = f64;

    fn shape(&self) -> [usize; 1] {
        [8]
    }

    fn eval(&self, index: [usize; 1]) -> f64 {
        self.evals.set(self.evals.get() + 1);
        index[0] as f64
    }
}

#[test]
fn expressions_defer_work_until_materialized() {
    let evals = Cell::new(0);
    let source = CountingExpr { evals: &evals };

    let node = BinaryExpr::new(|a, b| a + b, &source, &source).unwrap();
    let doubled = Expr(node) * Scalar(3.0);
    assert_eq!(doubled.shape(), [8]);
    assert_eq!(doubled.size(), 8);
    assert_eq!(evals.get(), 0, "construction must not touch elements");

    assert_relative_eq!(doubled.eval([2]), 12.0);
    assert_eq!(evals.get(), 2, "single-element evaluation reads each operand once");

    let out = doubled.copy();
    assert_eq!(out.as_slice().len(), 8);
    assert_eq!(evals.get(), 2 + 16, "copy() pays the cost exactly once");
}

#[test]
fn shape_mismatch_reports_both_extents() {
    let a = Tensor::from_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
    let b = Tensor::from_vec([4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let err = BinaryExpr::new(|x: f64, y: f64| x + y, &a, &b).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains('3'), "missing lhs extent in: {msg}");
    assert!(msg.contains('4'), "missing rhs extent in: {msg}");
}

#[test]
#[should_panic(expected = "shape mismatch")]
fn operator_sugar_panics_on_mismatch() {
    let a = Tensor::from_vec([3], vec![1, 2, 3]).unwrap();
    let b = Tensor::from_vec([4], vec![1, 2, 3, 4]).unwrap();
    let _ = &a * &b;
}

#[test]
fn unit_axis_broadcasts_instead_of_failing() {
    let a = Tensor::from_vec([3], vec![1, 2, 3]).unwrap();
    let b = Tensor::from_vec([1], vec![10]).unwrap();
    assert_eq!((&a + &b).copy().as_slice(), &[11, 12, 13]);
}

#[test]
fn chained_scalar_expression_end_to_end() {
    let a = Tensor::from_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
    let b = (&a + Scalar(10.0)) * Scalar(2.0);
    assert_eq!(b.shape(), [3]);
    assert_eq!(b.size(), 3);
    let out = b.copy();
    assert_eq!(out.as_slice(), &[22.0, 24.0, 26.0]);
}

#[test]
fn two_dimensional_outer_sum() {
    let row = Tensor::from_fn([1, 4], |[_, j]| j as i32);
    let col = Tensor::from_fn([3, 1], |[i, _]| (i * 10) as i32);
    let grid = (&row + &col).copy();
    assert_eq!(grid.shape(), &[3, 4]);
    assert_eq!(grid[[2, 3]], 23);
    assert_eq!(grid[[0, 0]], 0);
}

#[test]
fn comparisons_and_logic_compose() {
    let a = Tensor::from_vec([5], vec![1, 4, 2, 8, 5]).unwrap();
    let lo = Tensor::from_elem([5], 2);
    let hi = Tensor::from_elem([5], 5);
    let in_range = and(ge(&a, &lo).unwrap(), lt(&a, &hi).unwrap()).unwrap();
    assert_eq!(
        in_range.copy().as_slice(),
        &[false, true, true, false, false]
    );
    let out_of_range = (!in_range).copy();
    assert_eq!(
        out_of_range.as_slice(),
        &[true, false, false, true, true]
    );
}

#[test]
fn cast_and_reverse_are_lazy_views_of_the_data() {
    let a = Tensor::from_vec([4], vec![1.7f64, 2.2, -0.9, 3.0]).unwrap();
    let truncated = (&a).cast::<i64>().copy();
    assert_eq!(truncated.as_slice(), &[1, 2, 0, 3]);

    let reversed = (&a).reverse(0).unwrap().copy();
    assert_eq!(reversed.as_slice(), &[3.0, -0.9, 2.2, 1.7]);
}

#[test]
fn conjugation_distributes_over_addition() {
    let a = Tensor::from_vec([2], vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -1.0)])
        .unwrap();
    let b = Tensor::from_vec([2], vec![Complex64::new(0.5, 0.5), Complex64::new(-2.0, 4.0)])
        .unwrap();
    let lhs = conj(&a + &b).copy();
    let rhs = (conj(&a) + conj(&b)).copy();
    assert_eq!(lhs.as_slice(), rhs.as_slice());
}

#[test]
fn reductions_over_lazy_expressions() {
    let a = Tensor::from_vec([4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let shifted = &a - Scalar(2.5);
    assert_relative_eq!(sum(&shifted), 0.0);
    assert_relative_eq!(mean(&shifted).unwrap(), 0.0);
    assert_relative_eq!(var(&shifted, 0).unwrap(), var(&a, 0).unwrap());
}

#[test]
fn variance_requires_enough_degrees_of_freedom() {
    let a = Tensor::from_vec([2], vec![1.0, 3.0]).unwrap();
    assert_relative_eq!(var(&a, 1).unwrap(), 2.0);
    let err = var(&a, 2).unwrap_err();
    assert!(matches!(err, NdError::InvalidArgument(_)));
    assert!(err.to_string().contains('2'));
}

#[test]
fn broadcast_to_view_then_operate() {
    let data = vec![1.0, 2.0, 3.0];
    let base = Tensor::from_vec([1, 3], data).unwrap();
    let wide = broadcast_to(base.view(), &[2, 3]).unwrap();
    let doubled = (wide * Scalar(2.0)).copy();
    assert_eq!(doubled.shape(), &[2, 3]);
    assert_eq!(doubled.as_slice(), &[2.0, 4.0, 6.0, 2.0, 4.0, 6.0]);
}

#[test]
fn scalar_on_the_left_respects_operand_order() {
    let a = Tensor::from_vec([3], vec![1.0, 2.0, 4.0]).unwrap();
    let inv = (Scalar(8.0) / &a).copy();
    assert_eq!(inv.as_slice(), &[8.0, 4.0, 2.0]);
}
