//! End-to-end tests for views, slicing, selection, and shape manipulation.

use ndexpr::{
    compress, compress_axis, concatenate, expand_dims, flatten, gt, mask_select, pad, place, put,
    putmask, read_vector, repeat, select, squeeze, stack, take, take_axis, tile, unzip,
    write_tensor, zip, Expression, NdError, Scalar, SliceSpec, Tensor, View,
};
use std::io::Cursor;

#[test]
fn slice_views_alias_the_tensor_buffer() {
    let mut a = Tensor::from_vec([4], vec![1, 2, 3, 4]).unwrap();
    let vals = Tensor::from_vec([2], vec![100, 200]).unwrap();
    a.slice_mut([SliceSpec::from(1..3)])
        .unwrap()
        .assign(&vals)
        .unwrap();
    assert_eq!(a.as_slice(), &[1, 100, 200, 4]);
}

#[test]
fn assign_broadcasts_a_unit_axis_source() {
    let mut grid = Tensor::zeros([3, 4]);
    let row = Tensor::from_vec([1, 4], vec![1, 2, 3, 4]).unwrap();
    grid.view_mut().assign(&row).unwrap();
    assert_eq!(grid[[0, 1]], 2);
    assert_eq!(grid[[2, 3]], 4);

    let wrong = Tensor::from_vec([2, 4], vec![0; 8]).unwrap();
    let err = grid.view_mut().assign(&wrong).unwrap_err();
    assert!(matches!(err, NdError::ShapeMismatch { axis: 0, .. }));
}

#[test]
fn strided_slice_of_a_matrix() {
    let a = Tensor::from_fn([4, 6], |[i, j]| (i * 10 + j) as i32);
    let sub = a
        .slice([SliceSpec::from(1..4), SliceSpec::new(0, 6, 2)])
        .unwrap();
    assert_eq!(sub.shape(), &[3, 3]);
    assert_eq!(sub.get([0, 0]), 10);
    assert_eq!(sub.get([2, 2]), 34);
}

#[test]
fn permute_flip_and_transpose_are_zero_copy() {
    let a = Tensor::from_fn([2, 3], |[i, j]| (i * 3 + j) as i32);
    let t = a.view().t();
    assert_eq!(t.shape(), &[3, 2]);
    assert_eq!(t.get([2, 0]), a[[0, 2]]);

    let flipped = a.view().flip(1).unwrap();
    assert_eq!(flipped.get([0, 0]), a[[0, 2]]);
    assert!(a.view().flip(2).is_err());
}

#[test]
fn select_covers_all_operand_combinations() {
    let a = Tensor::from_vec([4], vec![1.0, -2.0, 3.0, -4.0]).unwrap();
    let zero = Tensor::zeros([4]);
    let positive = gt(&a, &zero).unwrap();

    let relu = select(&positive, &a, Scalar(0.0)).unwrap().copy();
    assert_eq!(relu.as_slice(), &[1.0, 0.0, 3.0, 0.0]);

    let sign = select(&positive, Scalar(1.0), Scalar(-1.0)).unwrap().copy();
    assert_eq!(sign.as_slice(), &[1.0, -1.0, 1.0, -1.0]);

    let abs = select(&positive, &a, -&a).unwrap().copy();
    assert_eq!(abs.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn take_gathers_with_an_index_tensor_of_any_shape() {
    let a = Tensor::from_fn([2, 3], |[i, j]| (i * 3 + j) as i32);
    let idx = Tensor::from_vec([2, 2], vec![5, 0, 1, 4]).unwrap();
    let gathered = take(&a, &idx).unwrap();
    assert_eq!(gathered.shape(), &[2, 2]);
    assert_eq!(gathered.as_slice(), &[5, 0, 1, 4]);

    let oob = Tensor::from_vec([1], vec![6]).unwrap();
    assert!(matches!(
        take(&a, &oob).unwrap_err(),
        NdError::FlatIndexOutOfRange { index: 6, len: 6 }
    ));
}

#[test]
fn take_axis_and_put_round_trip() {
    let a = Tensor::from_fn([3, 2], |[i, j]| (i * 10 + j) as i32);
    let order = Tensor::from_vec([3], vec![2, 1, 0]).unwrap();
    let reversed = take_axis(&a, 0, &order).unwrap();
    assert_eq!(reversed.as_slice(), &[20, 21, 10, 11, 0, 1]);

    let mut b = Tensor::zeros([3, 2]);
    put(&mut b, &[0, 1, 2, 3, 4, 5], a.as_slice()).unwrap();
    assert_eq!(b, a);
}

#[test]
fn compress_then_place_restores_masked_elements() {
    let a = Tensor::from_vec([6], vec![10, 11, 12, 13, 14, 15]).unwrap();
    let mask = [false, true, true, false, true, false];
    let kept = compress(&mask, &a).unwrap();
    assert_eq!(kept.as_slice(), &[11, 12, 14]);

    let mut b = Tensor::zeros([6]);
    let mask_t = Tensor::from_vec([6], mask.to_vec()).unwrap();
    place(&mut b, &mask_t, kept.as_slice()).unwrap();
    assert_eq!(b.as_slice(), &[0, 11, 12, 0, 14, 0]);
}

#[test]
fn putmask_draws_values_by_flat_position() {
    let mut a = Tensor::zeros([5]);
    let mask = Tensor::from_vec([5], vec![true, false, true, false, true]).unwrap();
    putmask(&mut a, &mask, &[1, 2]).unwrap();
    assert_eq!(a.as_slice(), &[1, 0, 1, 0, 1]);
}

#[test]
fn compress_axis_filters_rows() {
    let a = Tensor::from_fn([3, 2], |[i, j]| (i * 10 + j) as i32);
    let kept = compress_axis(&[false, true, true], &a, 0).unwrap();
    assert_eq!(kept.shape(), &[2, 2]);
    assert_eq!(kept.as_slice(), &[10, 11, 20, 21]);
}

#[test]
fn mask_select_flattens_in_row_major_order() {
    let a = Tensor::from_fn([2, 3], |[i, j]| (i * 3 + j) as i32);
    let threshold = Tensor::from_elem([2, 3], 2);
    let big = gt(&a, &threshold).unwrap();
    let picked = mask_select(&big, &a).unwrap();
    assert_eq!(picked.as_slice(), &[3, 4, 5]);
}

#[test]
fn rank_changes_through_expand_and_squeeze() {
    let a = Tensor::from_vec([3], vec![1, 2, 3]).unwrap();
    let col: View<'_, i32, 2> = expand_dims(a.view(), 1).unwrap();
    assert_eq!(col.shape(), &[3, 1]);

    // The inserted axis broadcasts against a row without copying.
    let row = Tensor::from_vec([1, 2], vec![10, 20]).unwrap();
    let outer = (col + &row).copy();
    assert_eq!(outer.shape(), &[3, 2]);
    assert_eq!(outer[[2, 1]], 23);

    let back: View<'_, i32, 1> = squeeze(col, 1).unwrap();
    assert_eq!(back.shape(), &[3]);
}

#[test]
fn joining_and_repetition() {
    let a = Tensor::from_vec([2], vec![1, 2]).unwrap();
    let b = Tensor::from_vec([2], vec![3, 4]).unwrap();

    let joined = concatenate(&[&a, &b], 0).unwrap();
    assert_eq!(joined.as_slice(), &[1, 2, 3, 4]);

    let stacked: Tensor<i32, 2> = stack(&[&a, &b], 0).unwrap();
    assert_eq!(stacked.shape(), &[2, 2]);

    assert_eq!(tile(&a, [2]).as_slice(), &[1, 2, 1, 2]);
    assert_eq!(repeat(&a, 2, 0).unwrap().as_slice(), &[1, 1, 2, 2]);
    assert_eq!(pad(&a, [(1, 1)], 0).as_slice(), &[0, 1, 2, 0]);
}

#[test]
fn zip_unzip_and_flatten() {
    let a = Tensor::from_fn([2, 2], |[i, j]| (i * 2 + j) as i32);
    let b = Tensor::from_fn([2, 2], |[i, j]| (i + j) as f64);
    let pairs = zip(&a, &b).unwrap();
    let (ints, floats) = unzip(&pairs);
    assert_eq!(ints, a);
    assert_eq!(floats, b);

    let flat = flatten(&a);
    assert_eq!(flat.shape(), &[4]);
    assert_eq!(flat.as_slice(), &[0, 1, 2, 3]);
}

#[test]
fn persisted_expression_round_trips_through_a_buffer() {
    let a = Tensor::from_vec([3], vec![1.5f64, -2.5, 3.25]).unwrap();
    let doubled = &a * Scalar(2.0);

    let mut buf = Vec::new();
    write_tensor(&mut buf, doubled).unwrap();
    let back: Tensor<f64, 1> = read_vector(&mut Cursor::new(buf)).unwrap();
    assert_eq!(back.as_slice(), &[3.0, -5.0, 6.5]);
}

#[test]
fn resize_replaces_the_buffer() {
    let mut a = Tensor::from_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
    a.resize([3, 3], 9).unwrap();
    assert_eq!(a.shape(), &[3, 3]);
    assert!(a.as_slice().iter().all(|&x| x == 9));
}
