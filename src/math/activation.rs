use crate::error::ModelError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Activation function kinds recognised by the LSTM kernel
///
/// The `alpha`/`beta` parameters are only meaningful for the kinds that use them,
/// see [`ActivationKind::uses_alpha`] and [`ActivationKind::uses_beta`].
///
/// # Variants
///
/// - `Sigmoid` - `1 / (1 + e^(-x))`
/// - `Tanh` - `tanh(x)`
/// - `Relu` - `max(0, x)`
/// - `Affine` - `alpha * x + beta`
/// - `LeakyRelu` - `x` if `x >= 0` else `alpha * x`
/// - `ThresholdedRelu` - `x` if `x >= alpha` else `0`
/// - `ScaledTanh` - `alpha * tanh(beta * x)`
/// - `HardSigmoid` - `min(max(alpha * x + beta, 0), 1)`
/// - `Elu` - `x` if `x >= 0` else `alpha * (e^x - 1)`
/// - `Softsign` - `x / (1 + |x|)`
/// - `Softplus` - `ln(1 + e^x)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationKind {
    Sigmoid,
    Tanh,
    Relu,
    Affine,
    LeakyRelu,
    ThresholdedRelu,
    ScaledTanh,
    HardSigmoid,
    Elu,
    Softsign,
    Softplus,
}

/// Case-insensitive name table backing [`ActivationKind::from_name`]
fn registry() -> &'static AHashMap<&'static str, ActivationKind> {
    static REGISTRY: OnceLock<AHashMap<&'static str, ActivationKind>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = AHashMap::new();
        map.insert("sigmoid", ActivationKind::Sigmoid);
        map.insert("tanh", ActivationKind::Tanh);
        map.insert("relu", ActivationKind::Relu);
        map.insert("affine", ActivationKind::Affine);
        map.insert("leakyrelu", ActivationKind::LeakyRelu);
        map.insert("thresholdedrelu", ActivationKind::ThresholdedRelu);
        map.insert("scaledtanh", ActivationKind::ScaledTanh);
        map.insert("hardsigmoid", ActivationKind::HardSigmoid);
        map.insert("elu", ActivationKind::Elu);
        map.insert("softsign", ActivationKind::Softsign);
        map.insert("softplus", ActivationKind::Softplus);
        map
    })
}

impl ActivationKind {
    /// Resolves an activation name against the registry of supported kinds.
    ///
    /// Matching ignores ASCII case, so `"Sigmoid"`, `"sigmoid"` and `"SIGMOID"` are equivalent.
    ///
    /// # Parameters
    ///
    /// - `name` - Activation name, e.g. `"Tanh"` or `"LeakyRelu"`
    ///
    /// # Returns
    ///
    /// - `Ok(ActivationKind)` - The matching activation kind
    /// - `Err(ModelError::ConfigurationError)` - If the name is not registered
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        registry()
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| {
                ModelError::ConfigurationError(format!("unknown activation function '{}'", name))
            })
    }

    /// Whether this activation consumes an `alpha` parameter
    pub fn uses_alpha(&self) -> bool {
        matches!(
            self,
            ActivationKind::Affine
                | ActivationKind::LeakyRelu
                | ActivationKind::ThresholdedRelu
                | ActivationKind::ScaledTanh
                | ActivationKind::HardSigmoid
                | ActivationKind::Elu
        )
    }

    /// Whether this activation consumes a `beta` parameter
    pub fn uses_beta(&self) -> bool {
        matches!(
            self,
            ActivationKind::Affine | ActivationKind::ScaledTanh | ActivationKind::HardSigmoid
        )
    }

    /// Default `(alpha, beta)` used when an activation list does not provide them
    pub fn default_parameters(&self) -> (f32, f32) {
        match self {
            ActivationKind::Affine => (1.0, 0.0),
            ActivationKind::LeakyRelu => (0.01, 0.0),
            ActivationKind::ThresholdedRelu => (1.0, 0.0),
            ActivationKind::ScaledTanh => (1.0, 1.0),
            ActivationKind::HardSigmoid => (0.2, 0.5),
            ActivationKind::Elu => (1.0, 0.0),
            _ => (0.0, 0.0),
        }
    }

    /// Evaluates the activation on a single value.
    ///
    /// # Parameters
    ///
    /// - `x` - Input value
    /// - `alpha` - First activation parameter (ignored by kinds that do not use it)
    /// - `beta` - Second activation parameter (ignored by kinds that do not use it)
    ///
    /// # Returns
    ///
    /// * `f32` - The activated value
    #[inline]
    pub fn evaluate(&self, x: f32, alpha: f32, beta: f32) -> f32 {
        match self {
            ActivationKind::Sigmoid => {
                if x >= 0.0 {
                    1.0 / (1.0 + (-x).exp())
                } else {
                    let e = x.exp();
                    e / (1.0 + e)
                }
            }
            ActivationKind::Tanh => x.tanh(),
            ActivationKind::Relu => x.max(0.0),
            ActivationKind::Affine => alpha * x + beta,
            ActivationKind::LeakyRelu => {
                if x >= 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            ActivationKind::ThresholdedRelu => {
                if x >= alpha {
                    x
                } else {
                    0.0
                }
            }
            ActivationKind::ScaledTanh => alpha * (beta * x).tanh(),
            ActivationKind::HardSigmoid => (alpha * x + beta).clamp(0.0, 1.0),
            ActivationKind::Elu => {
                if x >= 0.0 {
                    x
                } else {
                    alpha * (x.exp() - 1.0)
                }
            }
            ActivationKind::Softsign => x / (1.0 + x.abs()),
            // ln(1 + e^x) without overflowing for large x
            ActivationKind::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
        }
    }
}

/// A resolved activation together with its `alpha`/`beta` parameters
///
/// # Fields
///
/// - `kind` - Which activation function to apply
/// - `alpha` - First activation parameter
/// - `beta` - Second activation parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub kind: ActivationKind,
    pub alpha: f32,
    pub beta: f32,
}

impl Activation {
    /// Creates an activation with explicit parameters.
    ///
    /// # Parameters
    ///
    /// - `kind` - Activation kind
    /// - `alpha` - First activation parameter
    /// - `beta` - Second activation parameter
    ///
    /// # Returns
    ///
    /// * `Activation` - The configured activation
    pub fn new(kind: ActivationKind, alpha: f32, beta: f32) -> Self {
        Activation { kind, alpha, beta }
    }

    /// Creates an activation using the default parameters of `kind`.
    pub fn with_defaults(kind: ActivationKind) -> Self {
        let (alpha, beta) = kind.default_parameters();
        Activation { kind, alpha, beta }
    }

    /// Resolves `name` against the registry and uses its default parameters.
    ///
    /// # Errors
    ///
    /// - `ModelError::ConfigurationError` - If the name is not registered
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        Ok(Self::with_defaults(ActivationKind::from_name(name)?))
    }

    /// Applies the activation in place over `buffer`.
    ///
    /// # Parameters
    ///
    /// - `buffer` - Values to activate, overwritten with the result
    #[inline]
    pub fn apply(&self, buffer: &mut [f32]) {
        for x in buffer.iter_mut() {
            *x = self.kind.evaluate(*x, self.alpha, self.beta);
        }
    }

    /// Merge-gates form of the activation: `hidden[i] = gate[i] * act(cell[i])`.
    ///
    /// Writes straight into the hidden-state slot so no temporary is needed.
    ///
    /// # Parameters
    ///
    /// - `cell` - Cell state values passed through the activation
    /// - `gate` - Output gate values multiplied with the activated cell state
    /// - `hidden` - Destination for the hidden state
    #[inline]
    pub fn merge_gates(&self, cell: &[f32], gate: &[f32], hidden: &mut [f32]) {
        for ((h, &c), &o) in hidden.iter_mut().zip(cell).zip(gate) {
            *h = o * self.kind.evaluate(c, self.alpha, self.beta);
        }
    }
}

/// The three activations of one LSTM direction
///
/// # Fields
///
/// - `f` - Gate activation used for the input, forget and output gates (default sigmoid)
/// - `g` - Cell candidate activation (default tanh)
/// - `h` - Cell state activation used to produce the hidden state (default tanh)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateActivations {
    pub f: Activation,
    pub g: Activation,
    pub h: Activation,
}

impl GateActivations {
    /// Creates a set of gate activations.
    pub fn new(f: Activation, g: Activation, h: Activation) -> Self {
        GateActivations { f, g, h }
    }
}

impl Default for GateActivations {
    fn default() -> Self {
        GateActivations {
            f: Activation::with_defaults(ActivationKind::Sigmoid),
            g: Activation::with_defaults(ActivationKind::Tanh),
            h: Activation::with_defaults(ActivationKind::Tanh),
        }
    }
}
