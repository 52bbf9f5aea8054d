use super::*;
use ndarray::{ArrayView2, ArrayViewMut2, Axis, array};

#[test]
fn gemm_overwrites_with_zero_beta() {
    // [2 x 3] * [3 x 2]
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
    let mut c = [f32::NAN; 4];

    gemm(2, 2, 3, 1.0, &a, 3, &b, 2, 0.0, &mut c, 2).unwrap();

    assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn gemm_accumulates_with_unit_beta() {
    let a = [1.0, 2.0];
    let b = [3.0, 4.0];
    let mut c = [10.0];

    // [1 x 2] * [2 x 1]
    gemm(1, 1, 2, 1.0, &a, 2, &b, 1, 1.0, &mut c, 1).unwrap();
    assert_eq!(c, [21.0]);
}

#[test]
fn gemm_honours_leading_dimensions() {
    // A is the left [2 x 2] block of a [2 x 3] buffer, C writes into a [2 x 4] buffer
    let a = [1.0, 2.0, 99.0, 3.0, 4.0, 99.0];
    let b = [1.0, 0.0, 0.0, 1.0];
    let mut c = [0.0; 8];

    gemm(2, 2, 2, 2.0, &a, 3, &b, 2, 0.0, &mut c, 4).unwrap();

    assert_eq!(c, [2.0, 4.0, 0.0, 0.0, 6.0, 8.0, 0.0, 0.0]);
}

#[test]
fn gemm_rejects_short_operands() {
    let a = [1.0; 3];
    let b = [1.0; 4];
    let mut c = [0.0; 4];

    let result = gemm(2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
    assert!(matches!(result, Err(ModelError::ProcessingError(_))));

    let mut short_c = [0.0; 3];
    let result = gemm(2, 2, 2, 1.0, &[1.0; 4], 2, &b, 2, 0.0, &mut short_c, 2);
    assert!(matches!(result, Err(ModelError::ProcessingError(_))));
}

#[test]
fn gemm_view_on_column_blocks_matches_full_product() {
    let a = array![[1.0f32, 2.0], [3.0, 4.0]];
    let b = array![[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
    let mut full = [0.0f32; 8];
    gemm(2, 4, 2, 1.0, a.as_slice().unwrap(), 2, b.as_slice().unwrap(), 4, 0.0, &mut full, 4)
        .unwrap();

    let mut split = [0.0f32; 8];
    {
        let c = ArrayViewMut2::from_shape((2, 4), &mut split[..]).unwrap();
        let (mut left, mut right) = c.split_at(Axis(1), 3);
        let a_view: ArrayView2<'_, f32> = a.view();
        gemm_view(1.0, &a_view, &b.slice(ndarray::s![.., ..3]), 0.0, &mut left);
        gemm_view(1.0, &a_view, &b.slice(ndarray::s![.., 3..]), 0.0, &mut right);
    }

    assert_eq!(split, full);
}
