use super::*;
use crate::math::{Activation, ActivationKind, GateActivations};
use ndarray::{Array, IxDyn};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Direction attribute of an LSTM unit
///
/// # Variants
///
/// - `Forward` - One engine processing timesteps in order
/// - `Reverse` - One engine processing each row's timesteps back to front
/// - `Bidirectional` - A forward and a reverse engine whose outputs share one tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LstmDirection {
    Forward,
    Reverse,
    Bidirectional,
}

impl LstmDirection {
    /// Parses a direction attribute, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// - `ModelError::ConfigurationError` - If the name is not `forward`, `reverse` or `bidirectional`
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        match name.to_ascii_lowercase().as_str() {
            "forward" => Ok(LstmDirection::Forward),
            "reverse" => Ok(LstmDirection::Reverse),
            "bidirectional" => Ok(LstmDirection::Bidirectional),
            _ => Err(ModelError::ConfigurationError(format!(
                "invalid LSTM direction '{}'",
                name
            ))),
        }
    }

    /// Number of directions, 1 or 2
    pub fn num_directions(&self) -> usize {
        match self {
            LstmDirection::Bidirectional => 2,
            _ => 1,
        }
    }
}

fn default_direction() -> String {
    "forward".to_string()
}

fn default_output_sequence() -> bool {
    true
}

/// Attributes of an LSTM operator
///
/// # Fields
///
/// - `direction` - `"forward"`, `"reverse"` or `"bidirectional"`
/// - `hidden_size` - Number of LSTM units
/// - `activations` - Activation names, `f, g, h` per direction; empty for the defaults
/// - `activation_alpha` - Alpha values, consumed in order by the activations that take one
/// - `activation_beta` - Beta values, consumed in order by the activations that take one
/// - `clip` - Optional clip threshold; values `<= 0` disable clipping
/// - `input_forget` - Couples the forget gate to `1 - input gate`
/// - `output_sequence` - Whether the full hidden-state sequence `Y` is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmAttributes {
    #[serde(default = "default_direction")]
    pub direction: String,
    pub hidden_size: usize,
    #[serde(default)]
    pub activations: Vec<String>,
    #[serde(default)]
    pub activation_alpha: Vec<f32>,
    #[serde(default)]
    pub activation_beta: Vec<f32>,
    #[serde(default)]
    pub clip: Option<f32>,
    #[serde(default)]
    pub input_forget: bool,
    #[serde(default = "default_output_sequence")]
    pub output_sequence: bool,
}

impl LstmAttributes {
    /// Creates attributes with default activations, no clipping and sequence output enabled.
    ///
    /// # Parameters
    ///
    /// - `direction` - `"forward"`, `"reverse"` or `"bidirectional"`
    /// - `hidden_size` - Number of LSTM units
    pub fn new(direction: &str, hidden_size: usize) -> Self {
        LstmAttributes {
            direction: direction.to_string(),
            hidden_size,
            activations: Vec::new(),
            activation_alpha: Vec::new(),
            activation_beta: Vec::new(),
            clip: None,
            input_forget: false,
            output_sequence: default_output_sequence(),
        }
    }

    /// Sets the activation names
    pub fn with_activations(mut self, activations: &[&str]) -> Self {
        self.activations = activations.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Sets the alpha and beta lists
    pub fn with_activation_parameters(mut self, alpha: Vec<f32>, beta: Vec<f32>) -> Self {
        self.activation_alpha = alpha;
        self.activation_beta = beta;
        self
    }

    /// Sets the clip threshold
    pub fn with_clip(mut self, clip: f32) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Sets the coupled input/forget flag
    pub fn with_input_forget(mut self, input_forget: bool) -> Self {
        self.input_forget = input_forget;
        self
    }

    /// Sets whether the full hidden-state sequence is produced
    pub fn with_output_sequence(mut self, output_sequence: bool) -> Self {
        self.output_sequence = output_sequence;
        self
    }

    /// Parsed direction attribute
    pub fn parsed_direction(&self) -> Result<LstmDirection, ModelError> {
        LstmDirection::from_name(&self.direction)
    }

    /// Resolves the activation list into one [`GateActivations`] per direction.
    ///
    /// An empty list gives sigmoid, tanh, tanh for every direction. A bidirectional unit
    /// accepts either 3 names (shared by both directions) or 6 names (forward then reverse).
    /// Alpha and beta values are handed out in order to the activations that use them; when a
    /// list runs out, the remaining activations keep their defaults.
    ///
    /// # Parameters
    ///
    /// - `num_directions` - 1 or 2
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<GateActivations>)` - `num_directions` activation sets
    /// - `Err(ModelError::ConfigurationError)` - If a name is unknown or the list has the wrong length
    pub fn resolve_activations(
        &self,
        num_directions: usize,
    ) -> Result<Vec<GateActivations>, ModelError> {
        if self.activations.is_empty() {
            return Ok(vec![GateActivations::default(); num_directions]);
        }

        let per_direction = 3;
        let names_per_unit = self.activations.len();
        if names_per_unit != per_direction * num_directions
            && !(num_directions == 2 && names_per_unit == per_direction)
        {
            return Err(ModelError::ConfigurationError(format!(
                "expected {} activation names for {} direction(s), got {}",
                per_direction * num_directions,
                num_directions,
                names_per_unit
            )));
        }

        let mut alpha = self.activation_alpha.iter().copied();
        let mut beta = self.activation_beta.iter().copied();
        let mut resolved = Vec::with_capacity(names_per_unit);
        for name in &self.activations {
            let kind = ActivationKind::from_name(name)?;
            let (default_alpha, default_beta) = kind.default_parameters();
            let a = if kind.uses_alpha() {
                alpha.next().unwrap_or(default_alpha)
            } else {
                default_alpha
            };
            let b = if kind.uses_beta() {
                beta.next().unwrap_or(default_beta)
            } else {
                default_beta
            };
            resolved.push(Activation::new(kind, a, b));
        }

        let sets: Vec<GateActivations> = resolved
            .chunks(per_direction)
            .map(|set| GateActivations::new(set[0], set[1], set[2]))
            .collect();

        if sets.len() < num_directions {
            return Ok(vec![sets[0]; num_directions]);
        }
        Ok(sets)
    }
}

/// Element-typed input tensor
///
/// Only single precision is computed; other precisions are rejected before any work starts.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(Tensor),
    Float64(ArrayD<f64>),
}

impl TensorData {
    /// Name of the element type
    pub fn element_type(&self) -> &'static str {
        match self {
            TensorData::Float32(_) => "f32",
            TensorData::Float64(_) => "f64",
        }
    }
}

impl From<Tensor> for TensorData {
    fn from(tensor: Tensor) -> Self {
        TensorData::Float32(tensor)
    }
}

impl From<ArrayD<f64>> for TensorData {
    fn from(tensor: ArrayD<f64>) -> Self {
        TensorData::Float64(tensor)
    }
}

/// Input tensors of one operator call
///
/// # Fields
///
/// - `x` - `[seq_length, batch_size, input_size]`
/// - `w` - `[num_directions, 4 * hidden_size, input_size]`
/// - `r` - `[num_directions, 4 * hidden_size, hidden_size]`
/// - `b` - Optional `[num_directions, 8 * hidden_size]`
/// - `sequence_lens` - Optional `[batch_size]`
/// - `initial_h` - Optional `[num_directions, batch_size, hidden_size]`
/// - `initial_c` - Optional `[num_directions, batch_size, hidden_size]`
/// - `p` - Optional `[num_directions, 3 * hidden_size]`
#[derive(Debug, Clone)]
pub struct LstmInputs {
    pub x: TensorData,
    pub w: Tensor,
    pub r: Tensor,
    pub b: Option<Tensor>,
    pub sequence_lens: Option<ArrayD<i32>>,
    pub initial_h: Option<Tensor>,
    pub initial_c: Option<Tensor>,
    pub p: Option<Tensor>,
}

impl LstmInputs {
    /// Creates the required inputs; every optional input starts absent
    pub fn new(x: impl Into<TensorData>, w: Tensor, r: Tensor) -> Self {
        LstmInputs {
            x: x.into(),
            w,
            r,
            b: None,
            sequence_lens: None,
            initial_h: None,
            initial_c: None,
            p: None,
        }
    }

    /// Sets the bias
    pub fn with_bias(mut self, b: Tensor) -> Self {
        self.b = Some(b);
        self
    }

    /// Sets the per-row sequence lengths
    pub fn with_sequence_lens(mut self, sequence_lens: ArrayD<i32>) -> Self {
        self.sequence_lens = Some(sequence_lens);
        self
    }

    /// Sets the initial hidden state
    pub fn with_initial_h(mut self, initial_h: Tensor) -> Self {
        self.initial_h = Some(initial_h);
        self
    }

    /// Sets the initial cell state
    pub fn with_initial_c(mut self, initial_c: Tensor) -> Self {
        self.initial_c = Some(initial_c);
        self
    }

    /// Sets the peephole weights
    pub fn with_peephole(mut self, p: Tensor) -> Self {
        self.p = Some(p);
        self
    }
}

/// Outputs of one operator call
///
/// # Fields
///
/// - `y` - `[seq_length, num_directions, batch_size, hidden_size]`, present when sequence output is enabled
/// - `y_h` - `[num_directions, batch_size, hidden_size]` final hidden state
/// - `y_c` - `[num_directions, batch_size, hidden_size]` final cell state
#[derive(Debug, Clone, PartialEq)]
pub struct LstmOutputs {
    pub y: Option<Tensor>,
    pub y_h: Tensor,
    pub y_c: Tensor,
}

/// Borrows a tensor's data in logical order, copying only when it is not contiguous
fn contiguous<T: Clone>(tensor: &ArrayD<T>) -> Cow<'_, [T]> {
    match tensor.as_slice() {
        Some(data) => Cow::Borrowed(data),
        None => Cow::Owned(tensor.iter().cloned().collect()),
    }
}

/// Borrows an optional tensor, using an empty view when it is absent
fn optional_contiguous(tensor: Option<&Tensor>) -> Cow<'_, [f32]> {
    match tensor {
        Some(tensor) => contiguous(tensor),
        None => Cow::Borrowed(&[]),
    }
}

/// The LSTM operator: validates tensors, builds one engine per direction and runs them
///
/// Each call builds fresh engines from the call's weights, so the operator holds only its
/// configuration and can be shared across threads.
///
/// # Example
/// ```rust
/// use lstm_kernel::lstm::*;
/// use ndarray::{Array, IxDyn};
///
/// let hidden_size = 2;
/// let attributes = LstmAttributes::new("forward", hidden_size);
/// let operator = LstmOperator::new(attributes).unwrap();
///
/// let x = Array::from_elem(IxDyn(&[3, 1, 4]), 0.5f32);
/// let w = Array::from_elem(IxDyn(&[1, 4 * hidden_size, 4]), 0.1f32);
/// let r = Array::from_elem(IxDyn(&[1, 4 * hidden_size, hidden_size]), 0.1f32);
///
/// let outputs = operator.compute(&LstmInputs::new(x, w, r)).unwrap();
/// assert_eq!(outputs.y_h.shape(), &[1, 1, hidden_size]);
/// ```
pub struct LstmOperator {
    attributes: LstmAttributes,
    direction: LstmDirection,
    activations: Vec<GateActivations>,
    partition: Box<dyn PartitionStrategy>,
    thread_pool: Option<Arc<ThreadPool>>,
}

impl std::fmt::Debug for LstmOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LstmOperator")
            .field("attributes", &self.attributes)
            .field("direction", &self.direction)
            .field("activations", &self.activations)
            .field("thread_pool", &self.thread_pool.is_some())
            .finish()
    }
}

impl LstmOperator {
    /// Validates the attributes and resolves the activations.
    ///
    /// # Parameters
    ///
    /// - `attributes` - Operator attributes
    ///
    /// # Returns
    ///
    /// - `Ok(LstmOperator)` - The configured operator using the heuristic thread plan
    /// - `Err(ModelError::ConfigurationError)` - If the direction, hidden size or activations are invalid
    pub fn new(attributes: LstmAttributes) -> Result<Self, ModelError> {
        let direction = attributes.parsed_direction()?;
        validate_dimension_greater_than_zero(attributes.hidden_size, "hidden_size")?;
        let activations = attributes.resolve_activations(direction.num_directions())?;

        Ok(LstmOperator {
            attributes,
            direction,
            activations,
            partition: Box::new(HeuristicPartition::<SystemConcurrency>::default()),
            thread_pool: None,
        })
    }

    /// Replaces the thread-plan policy
    pub fn with_partition_strategy(mut self, partition: Box<dyn PartitionStrategy>) -> Self {
        self.partition = partition;
        self
    }

    /// Runs every call inside the given rayon pool instead of the global one
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.thread_pool = Some(pool);
        self
    }

    /// Operator attributes
    pub fn attributes(&self) -> &LstmAttributes {
        &self.attributes
    }

    get_field!(direction, direction, LstmDirection);

    /// Resolved activations, one set per direction
    pub fn activations(&self) -> &[GateActivations] {
        &self.activations
    }

    /// Runs the operator.
    ///
    /// Every tensor shape is checked before any output is allocated.
    ///
    /// # Parameters
    ///
    /// - `inputs` - Input, weight and optional tensors
    ///
    /// # Returns
    ///
    /// - `Ok(LstmOutputs)` - `Y` (when enabled), `Y_h` and `Y_c`
    /// - `Err(ModelError::ConfigurationError)` - If `X` is not single precision or a dimension is 0
    /// - `Err(ModelError::ShapeMismatch)` - If any tensor disagrees with the dimensions
    pub fn compute(&self, inputs: &LstmInputs) -> Result<LstmOutputs, ModelError> {
        let x = match &inputs.x {
            TensorData::Float32(x) => x,
            other => {
                return Err(ModelError::ConfigurationError(format!(
                    "LSTM input of element type {} is not supported, only f32 is",
                    other.element_type()
                )));
            }
        };

        if x.ndim() != 3 {
            return Err(ModelError::ShapeMismatch(format!(
                "Input X must have 3 dimensions [seq_length, batch_size, input_size]. Actual: {:?}",
                x.shape()
            )));
        }
        let (seq_length, batch_size, input_size) = (x.shape()[0], x.shape()[1], x.shape()[2]);
        let h = self.attributes.hidden_size;
        let d = self.direction.num_directions();

        validate_tensor_shape(&inputs.w, &[d, GATE_COUNT * h, input_size], "W")?;
        validate_tensor_shape(&inputs.r, &[d, GATE_COUNT * h, h], "R")?;
        if let Some(b) = &inputs.b {
            validate_tensor_shape(b, &[d, 2 * GATE_COUNT * h], "B")?;
        }
        if let Some(sequence_lens) = &inputs.sequence_lens {
            validate_tensor_shape(sequence_lens, &[batch_size], "sequence_lens")?;
        }
        if let Some(initial_h) = &inputs.initial_h {
            validate_tensor_shape(initial_h, &[d, batch_size, h], "initial_h")?;
        }
        if let Some(initial_c) = &inputs.initial_c {
            validate_tensor_shape(initial_c, &[d, batch_size, h], "initial_c")?;
        }
        if let Some(p) = &inputs.p {
            validate_tensor_shape(p, &[d, 3 * h], "P")?;
        }

        let dims = LstmDimensions::new(seq_length, batch_size, input_size, h)?;

        let x_data = contiguous(x);
        let w_data = contiguous(&inputs.w);
        let r_data = contiguous(&inputs.r);
        let b_data = optional_contiguous(inputs.b.as_ref());
        let p_data = optional_contiguous(inputs.p.as_ref());
        let h0_data = optional_contiguous(inputs.initial_h.as_ref());
        let c0_data = optional_contiguous(inputs.initial_c.as_ref());
        let sequence_lengths: Cow<'_, [i32]> = match &inputs.sequence_lens {
            Some(sequence_lens) => contiguous(sequence_lens),
            None => Cow::Borrowed(&[]),
        };

        let direction_weights = |index: usize| DirectionWeights {
            input: direction_slice(&w_data, index, d),
            recurrent: direction_slice(&r_data, index, d),
            bias: direction_slice(&b_data, index, d),
            peephole: direction_slice(&p_data, index, d),
            initial_hidden: direction_slice(&h0_data, index, d),
            initial_cell: direction_slice(&c0_data, index, d),
        };

        let partition = self.partition.as_ref();
        let build_engine = |index: usize, direction: Direction| {
            UniDirectionalLstm::new(
                dims,
                direction,
                direction_weights(index),
                self.activations[index],
                self.attributes.input_forget,
                self.attributes.clip,
                partition,
            )
        };

        let mut orchestrator = match self.direction {
            LstmDirection::Forward => {
                DirectionalOrchestrator::unidirectional(build_engine(0, Direction::Forward)?)
            }
            LstmDirection::Reverse => {
                DirectionalOrchestrator::unidirectional(build_engine(0, Direction::Reverse)?)
            }
            LstmDirection::Bidirectional => DirectionalOrchestrator::bidirectional(
                build_engine(0, Direction::Forward)?,
                build_engine(1, Direction::Reverse)?,
            )?,
        };

        let state_len = d * dims.state_len();
        let mut y = if self.attributes.output_sequence {
            Some(vec![0.0f32; seq_length * state_len])
        } else {
            None
        };
        let mut y_h = vec![0.0f32; state_len];
        let mut y_c = vec![0.0f32; state_len];

        debug!(
            direction = ?self.direction,
            seq_length,
            batch_size,
            input_size,
            hidden_size = h,
            "running LSTM operator"
        );

        let mut run = || {
            orchestrator.compute(
                &x_data,
                &sequence_lengths,
                y.as_deref_mut(),
                &mut y_h,
                &mut y_c,
            )
        };
        match &self.thread_pool {
            Some(pool) => pool.install(run)?,
            None => run()?,
        }

        let y = match y {
            Some(y) => Some(Array::from_shape_vec(
                IxDyn(&[seq_length, d, batch_size, h]),
                y,
            )?),
            None => None,
        };
        Ok(LstmOutputs {
            y,
            y_h: Array::from_shape_vec(IxDyn(&[d, batch_size, h]), y_h)?,
            y_c: Array::from_shape_vec(IxDyn(&[d, batch_size, h]), y_c)?,
        })
    }
}

/// The `index`-th of `num_directions` equal parts of `data`, or an empty view when `data` is empty
fn direction_slice(data: &[f32], index: usize, num_directions: usize) -> &[f32] {
    if data.is_empty() {
        return data;
    }
    let part = data.len() / num_directions;
    &data[index * part..(index + 1) * part]
}
