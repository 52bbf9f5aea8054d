use super::*;

#[test]
fn elementwise_product_accumulates() {
    let mut dest = [1.0, 1.0, 1.0];
    elementwise_product(&[1.0, 2.0, 3.0], &[0.5, 0.5, -1.0], &mut dest);
    assert_eq!(dest, [1.5, 2.0, -2.0]);
}

#[test]
fn clip_add_bias_variants() {
    let bias = [1.0, -1.0, 0.5];

    let mut values = [2.0, -2.0, 0.0];
    clip_add_bias(Some(2.5), Some(&bias), &mut values);
    assert_eq!(values, [2.5, -2.5, 0.5]);

    let mut values = [2.0, -2.0, 0.0];
    clip_add_bias(None, Some(&bias), &mut values);
    assert_eq!(values, [3.0, -3.0, 0.5]);

    let mut values = [2.0, -2.0, 0.0];
    clip_add_bias(Some(1.0), None, &mut values);
    assert_eq!(values, [1.0, -1.0, 0.0]);

    let mut values = [2.0, -2.0, 0.0];
    clip_add_bias(None, None, &mut values);
    assert_eq!(values, [2.0, -2.0, 0.0]);
}

#[test]
fn merge_gates_into_cell_state() {
    let mut cell = [1.0, -2.0];
    merge_lstm_gates_to_memory(&mut cell, &[0.5, 0.25], &[0.5, 1.0], &[2.0, 4.0]);

    // f * c + i * g
    assert_abs_diff_eq!(cell[0], 1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(cell[1], -1.0, epsilon = 1e-6);
}
