use super::*;

/// Source-order input weights of the single-step scenario: {i, o, f, c} blocks for two units
const SCENARIO_W: [f32; 8] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];

fn build_engine<'a>(
    dims: LstmDimensions,
    direction: Direction,
    weights: DirectionWeights<'a>,
) -> UniDirectionalLstm<'a> {
    UniDirectionalLstm::new(
        dims,
        direction,
        weights,
        GateActivations::default(),
        false,
        None,
        &SingleThreadPartition,
    )
    .unwrap()
}

#[test]
fn single_step_matches_hand_computed_values() {
    let dims = LstmDimensions::new(1, 1, 1, 2).unwrap();
    let recurrent = [0.05f32; 16];
    let weights = DirectionWeights {
        input: &SCENARIO_W,
        recurrent: &recurrent,
        ..Default::default()
    };
    let mut engine = build_engine(dims, Direction::Forward, weights);

    let mut outputs = vec![0.0; 2];
    let mut final_hidden = vec![0.0; 2];
    let mut final_cell = vec![0.0; 2];
    engine
        .compute(&[2.0], &[1], 1, Some(&mut outputs), &mut final_hidden, &mut final_cell)
        .unwrap();

    assert_abs_diff_eq!(final_cell[0], 0.486_796_44, epsilon = 1e-5);
    assert_abs_diff_eq!(final_cell[1], 0.551_791_6, epsilon = 1e-5);
    assert_abs_diff_eq!(outputs[0], 0.291_623_65, epsilon = 1e-5);
    assert_abs_diff_eq!(outputs[1], 0.346_271_8, epsilon = 1e-5);
    assert_eq!(final_hidden, outputs);
}

#[test]
fn repeated_compute_is_bit_identical() {
    let (seq_length, batch_size, input_size, hidden_size) = (5, 3, 4, 3);
    let dims = LstmDimensions::new(seq_length, batch_size, input_size, hidden_size).unwrap();
    let input_weights = random_vec(4 * hidden_size * input_size, 1);
    let recurrent = random_vec(4 * hidden_size * hidden_size, 2);
    let bias = random_vec(8 * hidden_size, 3);
    let peephole = random_vec(3 * hidden_size, 4);
    let initial_hidden = random_vec(batch_size * hidden_size, 5);
    let initial_cell = random_vec(batch_size * hidden_size, 6);
    let inputs = random_vec(dims.input_len(), 7);

    let weights = DirectionWeights {
        input: &input_weights,
        recurrent: &recurrent,
        bias: &bias,
        peephole: &peephole,
        initial_hidden: &initial_hidden,
        initial_cell: &initial_cell,
    };

    for direction in [Direction::Forward, Direction::Reverse] {
        let mut engine = build_engine(dims, direction, weights);
        let run = |engine: &mut UniDirectionalLstm<'_>| {
            let mut outputs = vec![0.0; seq_length * dims.state_len()];
            let mut final_hidden = vec![0.0; dims.state_len()];
            let mut final_cell = vec![0.0; dims.state_len()];
            engine
                .compute(
                    &inputs,
                    &[5, 2, 4],
                    1,
                    Some(&mut outputs),
                    &mut final_hidden,
                    &mut final_cell,
                )
                .unwrap();
            (outputs, final_hidden, final_cell)
        };

        let first = run(&mut engine);
        let second = run(&mut engine);
        assert_eq!(first, second);
    }
}

#[test]
fn reverse_engine_equals_forward_engine_on_reversed_input() {
    let (seq_length, batch_size, input_size, hidden_size) = (4, 2, 3, 2);
    let dims = LstmDimensions::new(seq_length, batch_size, input_size, hidden_size).unwrap();
    let input_weights = random_vec(4 * hidden_size * input_size, 31);
    let recurrent = random_vec(4 * hidden_size * hidden_size, 32);
    let bias = random_vec(8 * hidden_size, 33);
    let inputs = random_vec(dims.input_len(), 34);
    let lengths = [4usize, 3];
    let lengths_i32 = [4, 3];

    let weights = DirectionWeights {
        input: &input_weights,
        recurrent: &recurrent,
        bias: &bias,
        ..Default::default()
    };

    let mut reversed_inputs = vec![0.0; inputs.len()];
    reverse_sequence(&inputs, &mut reversed_inputs, &lengths, seq_length, batch_size, input_size)
        .unwrap();

    let state_len = dims.state_len();
    let mut forward = build_engine(dims, Direction::Forward, weights);
    let mut forward_out = vec![0.0; seq_length * state_len];
    let mut forward_h = vec![0.0; state_len];
    let mut forward_c = vec![0.0; state_len];
    forward
        .compute(
            &reversed_inputs,
            &lengths_i32,
            1,
            Some(&mut forward_out),
            &mut forward_h,
            &mut forward_c,
        )
        .unwrap();

    let mut reverse = build_engine(dims, Direction::Reverse, weights);
    let mut reverse_out = vec![0.0; seq_length * state_len];
    let mut reverse_h = vec![0.0; state_len];
    let mut reverse_c = vec![0.0; state_len];
    reverse
        .compute(
            &inputs,
            &lengths_i32,
            1,
            Some(&mut reverse_out),
            &mut reverse_h,
            &mut reverse_c,
        )
        .unwrap();

    let mut expected_out = vec![0.0; forward_out.len()];
    reverse_sequence(&forward_out, &mut expected_out, &lengths, seq_length, batch_size, hidden_size)
        .unwrap();

    assert_eq!(reverse_out, expected_out);
    assert_eq!(reverse_h, forward_h);
    assert_eq!(reverse_c, forward_c);
}

#[test]
fn missing_output_sequence_still_fills_final_states() {
    let (seq_length, batch_size, input_size, hidden_size) = (3, 2, 2, 2);
    let dims = LstmDimensions::new(seq_length, batch_size, input_size, hidden_size).unwrap();
    let input_weights = random_vec(4 * hidden_size * input_size, 41);
    let recurrent = random_vec(4 * hidden_size * hidden_size, 42);
    let inputs = random_vec(dims.input_len(), 43);
    let weights = DirectionWeights {
        input: &input_weights,
        recurrent: &recurrent,
        ..Default::default()
    };
    let state_len = dims.state_len();

    let mut engine = build_engine(dims, Direction::Forward, weights);
    let mut outputs = vec![0.0; seq_length * state_len];
    let mut with_h = vec![0.0; state_len];
    let mut with_c = vec![0.0; state_len];
    engine
        .compute(&inputs, &[3, 1], 1, Some(&mut outputs), &mut with_h, &mut with_c)
        .unwrap();

    let mut without_h = vec![9.0; state_len];
    let mut without_c = vec![9.0; state_len];
    engine
        .compute(&inputs, &[3, 1], 1, None, &mut without_h, &mut without_c)
        .unwrap();

    assert_eq!(with_h, without_h);
    assert_eq!(with_c, without_c);
}

#[test]
fn invalid_calls_leave_outputs_untouched() {
    let dims = LstmDimensions::new(2, 1, 1, 2).unwrap();
    let recurrent = [0.1f32; 16];
    let weights = DirectionWeights {
        input: &SCENARIO_W,
        recurrent: &recurrent,
        ..Default::default()
    };
    let mut engine = build_engine(dims, Direction::Forward, weights);

    let mut outputs = vec![7.0; 4];
    let mut final_hidden = vec![7.0; 2];
    let mut final_cell = vec![7.0; 2];

    let result = engine.compute(&[1.0], &[], 1, Some(&mut outputs), &mut final_hidden, &mut final_cell);
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));

    let result = engine.compute(&[1.0, 2.0], &[3], 1, Some(&mut outputs), &mut final_hidden, &mut final_cell);
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));

    let result = engine.compute(&[1.0, 2.0], &[], 3, None, &mut final_hidden, &mut final_cell);
    assert!(matches!(result, Err(ModelError::ConfigurationError(_))));

    assert!(outputs.iter().all(|&x| x == 7.0));
    assert!(final_hidden.iter().all(|&x| x == 7.0));
    assert!(final_cell.iter().all(|&x| x == 7.0));
}

#[test]
fn construction_rejects_bad_weight_lengths() {
    let dims = LstmDimensions::new(2, 1, 1, 2).unwrap();
    let recurrent = [0.1f32; 16];
    let bad_bias = [0.0f32; 15];
    let weights = DirectionWeights {
        input: &SCENARIO_W,
        recurrent: &recurrent,
        bias: &bad_bias,
        ..Default::default()
    };

    let result = UniDirectionalLstm::new(
        dims,
        Direction::Forward,
        weights,
        GateActivations::default(),
        false,
        None,
        &SingleThreadPartition,
    );
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));
}

#[test]
fn engine_exposes_fused_weights() {
    let dims = LstmDimensions::new(1, 1, 1, 2).unwrap();
    let recurrent = random_vec(16, 51);
    let weights = DirectionWeights {
        input: &SCENARIO_W,
        recurrent: &recurrent,
        ..Default::default()
    };
    let engine = build_engine(dims, Direction::Forward, weights);

    assert_eq!(
        engine.fused_input_weights(),
        &[0.1, 0.2, 0.5, 0.6, 0.3, 0.4, 0.7, 0.8]
    );
    assert_eq!(
        restore_gate_weights(engine.fused_recurrent_weights(), 2, 2).unwrap(),
        recurrent
    );
    assert!(engine.fused_bias().is_none());
    assert_eq!(engine.plan(), &ThreadPlan::single_threaded());
}
