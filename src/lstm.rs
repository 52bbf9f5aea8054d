use crate::error::ModelError;
use ndarray::ArrayD;

/// Gate-order permutation and transposition of the weight matrices
pub mod weight_layout;
/// Working buffers owned by one single-direction engine
pub mod scratch;
/// Thread-count heuristics and the partition strategy seam
pub mod thread_plan;
/// Sequence lengths, per-timestep output views and sequence reversal
pub mod sequence;
/// Per-row elementwise gate math
pub mod gate_pipeline;
/// Input-to-gates affine transform for every timestep
pub mod input_projection;
/// Time-sequential, batch/column-parallel recurrence
pub mod recurrent;
/// A single-direction LSTM engine
pub mod unidirectional;
/// Forward / reverse / bidirectional orchestration
pub mod orchestrator;
/// Full operator surface: attributes, tensor validation and dispatch
pub mod operator;
/// Serializable attributes and weights
pub mod serialize;
/// Input validation functions for the LSTM operator and engines
mod input_validation_function;

pub use gate_pipeline::GateActivationPipeline;
pub use input_projection::InputProjectionStage;
pub use operator::*;
pub use orchestrator::DirectionalOrchestrator;
pub use recurrent::{RecurrentStage, RecurrentState};
pub use scratch::{FusedBias, PeepholeWeights, ScratchBufferSet};
pub use sequence::*;
pub use serialize::*;
pub use thread_plan::*;
pub use unidirectional::{DirectionWeights, UniDirectionalLstm};
pub use weight_layout::{restore_gate_weights, transpose_gate_weights};

use input_validation_function::*;

/// Type alias for n-dimensional arrays used as operator tensors
pub type Tensor = ArrayD<f32>;

/// Number of gates in an LSTM cell (input, forget, output, cell candidate)
pub const GATE_COUNT: usize = 4;

/// Processing direction of a single-direction engine
///
/// A bidirectional unit is two engines, one of each direction, whose outputs are
/// interleaved along the direction axis of a shared output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Problem dimensions fixed for the lifetime of an engine
///
/// # Fields
///
/// - `seq_length` - Number of (padded) timesteps in the input
/// - `batch_size` - Number of sequences processed together
/// - `input_size` - Features per timestep of the input
/// - `hidden_size` - Number of LSTM units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LstmDimensions {
    pub seq_length: usize,
    pub batch_size: usize,
    pub input_size: usize,
    pub hidden_size: usize,
}

impl LstmDimensions {
    /// Creates a dimension set, rejecting zero-sized dimensions.
    ///
    /// # Parameters
    ///
    /// - `seq_length` - Number of timesteps
    /// - `batch_size` - Number of batch rows
    /// - `input_size` - Input features per timestep
    /// - `hidden_size` - Number of LSTM units
    ///
    /// # Returns
    ///
    /// - `Ok(LstmDimensions)` - If every dimension is positive
    /// - `Err(ModelError::ConfigurationError)` - If any dimension is 0
    pub fn new(
        seq_length: usize,
        batch_size: usize,
        input_size: usize,
        hidden_size: usize,
    ) -> Result<Self, ModelError> {
        validate_dimension_greater_than_zero(seq_length, "seq_length")?;
        validate_dimension_greater_than_zero(batch_size, "batch_size")?;
        validate_dimension_greater_than_zero(input_size, "input_size")?;
        validate_dimension_greater_than_zero(hidden_size, "hidden_size")?;

        Ok(LstmDimensions {
            seq_length,
            batch_size,
            input_size,
            hidden_size,
        })
    }

    /// Elements in one `[batch_size x hidden_size]` state buffer
    pub fn state_len(&self) -> usize {
        self.batch_size * self.hidden_size
    }

    /// Elements in the `[seq_length x batch_size x input_size]` input
    pub fn input_len(&self) -> usize {
        self.seq_length * self.batch_size * self.input_size
    }

    /// Width of one fused gate row, `4 * hidden_size`
    pub fn gate_width(&self) -> usize {
        GATE_COUNT * self.hidden_size
    }
}
