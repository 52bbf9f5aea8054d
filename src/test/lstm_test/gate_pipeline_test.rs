use super::*;

#[test]
fn default_gates_match_lstm_equations() {
    let hidden_size = 2;
    let pipeline =
        GateActivationPipeline::new(hidden_size, false, None, None, None, &GateActivations::default());

    // fused order {i, f, o, c}
    let pre = vec![0.2, -0.4, 0.6, 0.1, -0.3, 0.9, 0.5, -0.8];
    let prev_cell = vec![0.3, -0.7];

    let mut gates = pre.clone();
    let mut cell = prev_cell.clone();
    let mut hidden = vec![0.0; hidden_size];
    pipeline.compute_row(&mut gates, &mut cell, &mut hidden);

    for k in 0..hidden_size {
        let i = sigmoid(pre[k]);
        let f = sigmoid(pre[hidden_size + k]);
        let o = sigmoid(pre[2 * hidden_size + k]);
        let g = pre[3 * hidden_size + k].tanh();
        let c = f * prev_cell[k] + i * g;

        assert_abs_diff_eq!(cell[k], c, epsilon = 1e-6);
        assert_abs_diff_eq!(hidden[k], o * c.tanh(), epsilon = 1e-6);
        assert_abs_diff_eq!(gates[k], i, epsilon = 1e-6);
        assert_abs_diff_eq!(gates[hidden_size + k], f, epsilon = 1e-6);
    }
}

#[test]
fn input_forget_couples_forget_gate() {
    let hidden_size = 5;
    let bias_source = random_vec(8 * hidden_size, 21);
    let bias = FusedBias::from_source(&bias_source, hidden_size).unwrap();
    let peephole_source = random_vec(3 * hidden_size, 22);
    let peephole = PeepholeWeights::from_source(&peephole_source, hidden_size).unwrap();

    let pipeline = GateActivationPipeline::new(
        hidden_size,
        true,
        Some(3.0),
        Some(&bias),
        Some(peephole),
        &GateActivations::default(),
    );

    for seed in 0..4 {
        let mut gates = random_vec(4 * hidden_size, 100 + seed);
        let mut cell = random_vec(hidden_size, 200 + seed);
        let mut hidden = vec![0.0; hidden_size];
        pipeline.compute_row(&mut gates, &mut cell, &mut hidden);

        for k in 0..hidden_size {
            assert_eq!(gates[hidden_size + k], 1.0 - gates[k]);
        }
    }
}

#[test]
fn clip_bounds_pre_activations_after_bias() {
    let hidden_size = 1;
    let bias = FusedBias::from_source(&[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0], hidden_size).unwrap();
    let pipeline = GateActivationPipeline::new(
        hidden_size,
        false,
        Some(1.0),
        Some(&bias),
        None,
        &GateActivations::default(),
    );

    // i = 10 + 4 clipped to 1, f clipped to -1, o clipped to 1, c clipped to -1
    let mut gates = vec![10.0, -50.0, 50.0, -3.0];
    let mut cell = vec![0.0];
    let mut hidden = vec![0.0];
    pipeline.compute_row(&mut gates, &mut cell, &mut hidden);

    assert_abs_diff_eq!(gates[0], sigmoid(1.0), epsilon = 1e-6);
    assert_abs_diff_eq!(gates[1], sigmoid(-1.0), epsilon = 1e-6);
    assert_abs_diff_eq!(gates[2], sigmoid(1.0), epsilon = 1e-6);
    assert_abs_diff_eq!(gates[3], (-1.0f32).tanh(), epsilon = 1e-6);

    // a non-positive threshold disables clipping
    let unclipped = GateActivationPipeline::new(
        hidden_size,
        false,
        Some(0.0),
        None,
        None,
        &GateActivations::default(),
    );
    let mut gates = vec![0.0, 0.0, 0.0, 3.0];
    let mut cell = vec![0.0];
    unclipped.compute_row(&mut gates, &mut cell, &mut hidden);
    assert_abs_diff_eq!(gates[3], 3.0f32.tanh(), epsilon = 1e-6);
}

#[test]
fn output_peephole_reads_updated_cell() {
    let hidden_size = 1;
    // [P[i], P[o], P[f]]
    let peephole_source = [0.0, 1.0, 0.0];
    let peephole = PeepholeWeights::from_source(&peephole_source, hidden_size).unwrap();
    let pipeline = GateActivationPipeline::new(
        hidden_size,
        false,
        None,
        None,
        Some(peephole),
        &GateActivations::default(),
    );

    let mut gates = vec![0.0; 4];
    let mut cell = vec![1.0];
    let mut hidden = vec![0.0];
    pipeline.compute_row(&mut gates, &mut cell, &mut hidden);

    // i = f = 0.5, g = 0, so the new cell is 0.5 and o = sigmoid(0.5), not sigmoid(1.0)
    assert_abs_diff_eq!(cell[0], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(gates[2], sigmoid(0.5), epsilon = 1e-6);
    assert_abs_diff_eq!(hidden[0], sigmoid(0.5) * 0.5f32.tanh(), epsilon = 1e-6);
}

#[test]
fn custom_activations_are_used_per_gate_group() {
    let activations = GateActivations::new(
        Activation::with_defaults(ActivationKind::HardSigmoid),
        Activation::new(ActivationKind::Affine, 2.0, 0.5),
        Activation::with_defaults(ActivationKind::Relu),
    );
    let pipeline = GateActivationPipeline::new(1, false, None, None, None, &activations);

    let mut gates = vec![0.5, -0.5, 1.0, 0.25];
    let mut cell = vec![2.0];
    let mut hidden = vec![0.0];
    pipeline.compute_row(&mut gates, &mut cell, &mut hidden);

    let i = 0.2f32 * 0.5 + 0.5;
    let f = 0.2f32 * -0.5 + 0.5;
    let o = 0.2f32 * 1.0 + 0.5;
    let g = 2.0f32 * 0.25 + 0.5;
    let c = f * 2.0 + i * g;
    assert_abs_diff_eq!(cell[0], c, epsilon = 1e-6);
    assert_abs_diff_eq!(hidden[0], o * c, epsilon = 1e-6);
}
