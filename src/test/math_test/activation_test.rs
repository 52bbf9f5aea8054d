use super::*;

#[test]
fn registry_is_case_insensitive() {
    assert_eq!(ActivationKind::from_name("Sigmoid").unwrap(), ActivationKind::Sigmoid);
    assert_eq!(ActivationKind::from_name("TANH").unwrap(), ActivationKind::Tanh);
    assert_eq!(ActivationKind::from_name("LeakyRelu").unwrap(), ActivationKind::LeakyRelu);
    assert_eq!(
        ActivationKind::from_name("thresholdedrelu").unwrap(),
        ActivationKind::ThresholdedRelu
    );
    assert_eq!(ActivationKind::from_name("Softplus").unwrap(), ActivationKind::Softplus);
}

#[test]
fn unknown_activation_is_a_configuration_error() {
    let result = ActivationKind::from_name("Swish");
    assert!(matches!(result, Err(ModelError::ConfigurationError(_))));

    let result = Activation::from_name("");
    assert!(matches!(result, Err(ModelError::ConfigurationError(_))));
}

#[test]
fn default_parameters() {
    assert_eq!(ActivationKind::LeakyRelu.default_parameters().0, 0.01);
    assert_eq!(ActivationKind::ThresholdedRelu.default_parameters().0, 1.0);
    assert_eq!(ActivationKind::ScaledTanh.default_parameters(), (1.0, 1.0));
    assert_eq!(ActivationKind::HardSigmoid.default_parameters(), (0.2, 0.5));
    assert_eq!(ActivationKind::Elu.default_parameters().0, 1.0);
    assert_eq!(ActivationKind::Affine.default_parameters(), (1.0, 0.0));

    assert!(ActivationKind::Elu.uses_alpha());
    assert!(!ActivationKind::Elu.uses_beta());
    assert!(!ActivationKind::Sigmoid.uses_alpha());
    assert!(ActivationKind::HardSigmoid.uses_beta());
}

#[test]
fn evaluate_each_kind() {
    let cases = [
        (ActivationKind::Sigmoid, 0.0, 0.0, 0.0, 0.5),
        (ActivationKind::Tanh, 0.5, 0.0, 0.0, 0.5f32.tanh()),
        (ActivationKind::Relu, -2.0, 0.0, 0.0, 0.0),
        (ActivationKind::Relu, 2.0, 0.0, 0.0, 2.0),
        (ActivationKind::Affine, 2.0, 3.0, 1.0, 7.0),
        (ActivationKind::LeakyRelu, -2.0, 0.1, 0.0, -0.2),
        (ActivationKind::ThresholdedRelu, 0.5, 1.0, 0.0, 0.0),
        (ActivationKind::ThresholdedRelu, 1.5, 1.0, 0.0, 1.5),
        (ActivationKind::ScaledTanh, 0.5, 2.0, 3.0, 2.0 * 1.5f32.tanh()),
        (ActivationKind::HardSigmoid, 10.0, 0.2, 0.5, 1.0),
        (ActivationKind::HardSigmoid, 1.0, 0.2, 0.5, 0.7),
        (ActivationKind::Elu, -1.0, 2.0, 0.0, 2.0 * ((-1.0f32).exp() - 1.0)),
        (ActivationKind::Softsign, 3.0, 0.0, 0.0, 0.75),
        (ActivationKind::Softplus, 0.0, 0.0, 0.0, 2.0f32.ln()),
    ];

    for (kind, x, alpha, beta, expected) in cases {
        assert_abs_diff_eq!(kind.evaluate(x, alpha, beta), expected, epsilon = 1e-6);
    }
}

#[test]
fn saturating_inputs_stay_finite() {
    let sigmoid = ActivationKind::Sigmoid;
    assert_abs_diff_eq!(sigmoid.evaluate(-200.0, 0.0, 0.0), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(sigmoid.evaluate(200.0, 0.0, 0.0), 1.0, epsilon = 1e-6);

    let softplus = ActivationKind::Softplus;
    assert_abs_diff_eq!(softplus.evaluate(200.0, 0.0, 0.0), 200.0, epsilon = 1e-3);
    assert!(softplus.evaluate(-200.0, 0.0, 0.0) >= 0.0);
}

#[test]
fn apply_and_merge_gates() {
    let relu = Activation::with_defaults(ActivationKind::Relu);
    let mut values = [-1.0, 0.5, 2.0];
    relu.apply(&mut values);
    assert_eq!(values, [0.0, 0.5, 2.0]);

    let tanh = Activation::with_defaults(ActivationKind::Tanh);
    let cell = [0.3, -1.2];
    let gate = [0.5, 2.0];
    let mut hidden = [0.0; 2];
    tanh.merge_gates(&cell, &gate, &mut hidden);
    assert_abs_diff_eq!(hidden[0], 0.5 * 0.3f32.tanh(), epsilon = 1e-6);
    assert_abs_diff_eq!(hidden[1], 2.0 * (-1.2f32).tanh(), epsilon = 1e-6);
}

#[test]
fn gate_activation_defaults() {
    let defaults = GateActivations::default();
    assert_eq!(defaults.f.kind, ActivationKind::Sigmoid);
    assert_eq!(defaults.g.kind, ActivationKind::Tanh);
    assert_eq!(defaults.h.kind, ActivationKind::Tanh);
}
