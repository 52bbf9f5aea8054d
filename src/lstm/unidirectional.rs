use super::input_projection::InputProjectionStage;
use super::recurrent::{RecurrentStage, RecurrentState};
use super::weight_layout::transpose_gate_weights;
use super::*;
use crate::math::GateActivations;
use tracing::{debug, debug_span, trace};

/// Flat weight and initial-state views of one direction, in the source layout
///
/// Optional tensors are passed as empty slices.
///
/// # Fields
///
/// - `input` - Input weights `W`, `[4 * hidden_size x input_size]`, gate order {i, o, f, c}
/// - `recurrent` - Recurrent weights `R`, `[4 * hidden_size x hidden_size]`, gate order {i, o, f, c}
/// - `bias` - `[Wb, Rb]`, `8 * hidden_size`, or empty
/// - `peephole` - `[P[i], P[o], P[f]]`, `3 * hidden_size`, or empty
/// - `initial_hidden` - `[batch_size x hidden_size]`, or empty for zeros
/// - `initial_cell` - `[batch_size x hidden_size]`, or empty for zeros
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionWeights<'a> {
    pub input: &'a [f32],
    pub recurrent: &'a [f32],
    pub bias: &'a [f32],
    pub peephole: &'a [f32],
    pub initial_hidden: &'a [f32],
    pub initial_cell: &'a [f32],
}

/// A single-direction LSTM engine
///
/// Construction performs the expensive, one-time work: the weight layout transform, bias
/// fusion, scratch allocation and thread planning. [`compute`](UniDirectionalLstm::compute)
/// can then be called any number of times; every call starts again from the initial state
/// given at construction, so identical inputs give identical outputs.
///
/// The peephole weights are borrowed, so the peephole tensor must outlive the engine.
#[derive(Debug)]
pub struct UniDirectionalLstm<'a> {
    dims: LstmDimensions,
    direction: Direction,
    input_forget: bool,
    clip: Option<f32>,
    activations: GateActivations,
    input_weights: Vec<f32>,
    recurrent_weights: Vec<f32>,
    bias: Option<FusedBias>,
    peephole: Option<PeepholeWeights<'a>>,
    scratch: ScratchBufferSet,
    plan: ThreadPlan,
}

impl<'a> UniDirectionalLstm<'a> {
    /// Builds an engine for one direction.
    ///
    /// # Parameters
    ///
    /// - `dims` - Problem dimensions fixed for the engine's lifetime
    /// - `direction` - Forward or reverse processing
    /// - `weights` - Weights, optional bias/peephole and optional initial state
    /// - `activations` - The `f`, `g` and `h` activations
    /// - `input_forget` - Couples the forget gate to `1 - input gate`
    /// - `clip` - Clip threshold; `None` or a value `<= 0` disables clipping
    /// - `partition` - Thread-plan policy
    ///
    /// # Returns
    ///
    /// - `Ok(UniDirectionalLstm)` - The ready-to-run engine
    /// - `Err(ModelError::ShapeMismatch)` - If any weight or state view has the wrong length
    pub fn new(
        dims: LstmDimensions,
        direction: Direction,
        weights: DirectionWeights<'a>,
        activations: GateActivations,
        input_forget: bool,
        clip: Option<f32>,
        partition: &dyn PartitionStrategy,
    ) -> Result<Self, ModelError> {
        let h = dims.hidden_size;
        validate_view_len(weights.input, dims.gate_width() * dims.input_size, "input weights")?;
        validate_view_len(weights.recurrent, dims.gate_width() * h, "recurrent weights")?;
        validate_optional_view_len(weights.bias, 2 * dims.gate_width(), "bias")?;
        validate_optional_view_len(weights.peephole, 3 * h, "peephole weights")?;
        validate_optional_view_len(weights.initial_hidden, dims.state_len(), "initial hidden state")?;
        validate_optional_view_len(weights.initial_cell, dims.state_len(), "initial cell state")?;

        let input_weights = transpose_gate_weights(weights.input, h, dims.input_size)?;
        let recurrent_weights = transpose_gate_weights(weights.recurrent, h, h)?;

        let bias = if weights.bias.is_empty() {
            None
        } else {
            Some(FusedBias::from_source(weights.bias, h)?)
        };
        let peephole = if weights.peephole.is_empty() {
            None
        } else {
            Some(PeepholeWeights::from_source(weights.peephole, h)?)
        };

        let mut scratch = ScratchBufferSet::new(&dims, direction);
        scratch.set_initial_state(weights.initial_hidden, weights.initial_cell)?;

        let plan = partition.plan(dims.batch_size, h);
        let clip = clip.filter(|threshold| *threshold > 0.0);

        debug!(
            ?direction,
            seq_length = dims.seq_length,
            batch_size = dims.batch_size,
            input_size = dims.input_size,
            hidden_size = h,
            has_bias = bias.is_some(),
            has_peephole = peephole.is_some(),
            ?clip,
            input_forget,
            "constructed LSTM engine"
        );

        Ok(UniDirectionalLstm {
            dims,
            direction,
            input_forget,
            clip,
            activations,
            input_weights,
            recurrent_weights,
            bias,
            peephole,
            scratch,
            plan,
        })
    }

    /// Runs the engine, writing into the direction's slot of a shared output tensor.
    ///
    /// A forward engine writes direction slot 0 and a reverse engine writes the last slot,
    /// so a reverse engine inside a bidirectional unit fills slot 1.
    ///
    /// # Parameters
    ///
    /// - `inputs` - `[seq_length x batch_size x input_size]`
    /// - `sequence_lengths` - One length per batch row, or empty for `seq_length` everywhere
    /// - `num_directions` - 1 or 2, the direction count of the output tensor
    /// - `outputs` - Optional `[seq_length x num_directions x batch_size x hidden_size]` output
    /// - `final_hidden` - `[batch_size x hidden_size]` final hidden state
    /// - `final_cell` - `[batch_size x hidden_size]` final cell state
    ///
    /// # Returns
    ///
    /// - `Ok(())` - If all outputs were populated
    /// - `Err(ModelError::ConfigurationError)` - If `num_directions` is not 1 or 2
    /// - `Err(ModelError::ShapeMismatch)` - If any view disagrees with the dimensions
    pub fn compute(
        &mut self,
        inputs: &[f32],
        sequence_lengths: &[i32],
        num_directions: usize,
        outputs: Option<&mut [f32]>,
        final_hidden: &mut [f32],
        final_cell: &mut [f32],
    ) -> Result<(), ModelError> {
        if !(1..=2).contains(&num_directions) {
            return Err(ModelError::ConfigurationError(format!(
                "num_directions must be 1 or 2, got {}",
                num_directions
            )));
        }

        let output_view = match outputs {
            Some(buffer) => {
                let slot = match self.direction {
                    Direction::Forward => 0,
                    Direction::Reverse => num_directions - 1,
                };
                let views = SequenceOutput::interleaved(
                    buffer,
                    self.dims.seq_length,
                    num_directions,
                    self.dims.state_len(),
                )?;
                views.into_iter().nth(slot)
            }
            None => None,
        };

        self.compute_into(inputs, sequence_lengths, output_view, final_hidden, final_cell)
    }

    /// Runs the engine with an already-split per-timestep output view.
    ///
    /// # Parameters
    ///
    /// - `inputs` - `[seq_length x batch_size x input_size]`
    /// - `sequence_lengths` - One length per batch row, or empty for `seq_length` everywhere
    /// - `outputs` - Optional per-timestep output, `seq_length` steps of `batch_size * hidden_size`
    /// - `final_hidden` - `[batch_size x hidden_size]` final hidden state
    /// - `final_cell` - `[batch_size x hidden_size]` final cell state
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If any view disagrees with the dimensions, checked before anything is written
    pub fn compute_into(
        &mut self,
        inputs: &[f32],
        sequence_lengths: &[i32],
        outputs: Option<SequenceOutput<'_>>,
        final_hidden: &mut [f32],
        final_cell: &mut [f32],
    ) -> Result<(), ModelError> {
        let dims = self.dims;
        let state_len = dims.state_len();

        validate_view_len(inputs, dims.input_len(), "input")?;
        validate_view_len(final_hidden, state_len, "final hidden state")?;
        validate_view_len(final_cell, state_len, "final cell state")?;
        if let Some(outputs) = &outputs {
            if outputs.len() != dims.seq_length
                || (0..outputs.len()).any(|t| outputs.step(t).len() != state_len)
            {
                return Err(ModelError::ShapeMismatch(format!(
                    "output sequence must have {} timesteps of {} elements",
                    dims.seq_length, state_len
                )));
            }
        }
        let bounds = SequenceBounds::new(sequence_lengths, dims.seq_length, dims.batch_size)?;

        let span = debug_span!(
            "lstm_compute",
            direction = ?self.direction,
            batch_size = dims.batch_size,
            max_sequence_length = bounds.max
        );
        let _guard = span.enter();

        self.scratch.reset_cell_state();

        let pipeline = GateActivationPipeline::new(
            dims.hidden_size,
            self.input_forget,
            self.clip,
            self.bias.as_ref(),
            self.peephole,
            &self.activations,
        );
        let projection =
            InputProjectionStage::new(&self.input_weights, dims.input_size, dims.gate_width())?;
        let recurrence = RecurrentStage::new(&self.recurrent_weights, pipeline)?;

        let ScratchBufferSet {
            gates,
            hidden0,
            cell,
            inputs_reverse,
            outputs_reverse,
            ..
        } = &mut self.scratch;
        let active_rows = bounds.max * dims.batch_size;
        let state = RecurrentState {
            cell: cell.as_mut_slice(),
            hidden0: hidden0.as_slice(),
            final_hidden,
            final_cell,
        };

        match self.direction {
            Direction::Forward => {
                projection.project(inputs, gates, active_rows, self.plan.input_threads)?;
                trace!("input projection complete");
                recurrence.run(gates, state, outputs, &bounds, &self.plan)
            }
            Direction::Reverse => {
                reverse_sequence(
                    inputs,
                    inputs_reverse,
                    &bounds.lengths,
                    dims.seq_length,
                    dims.batch_size,
                    dims.input_size,
                )?;
                projection.project(inputs_reverse, gates, active_rows, self.plan.input_threads)?;
                trace!("input projection complete");

                match outputs {
                    Some(mut outputs) => {
                        let reversed =
                            SequenceOutput::contiguous(outputs_reverse, dims.seq_length, state_len)?;
                        recurrence.run(gates, state, Some(reversed), &bounds, &self.plan)?;

                        let reversed_steps: Vec<&[f32]> =
                            outputs_reverse.chunks(state_len).collect();
                        reverse_steps(
                            &reversed_steps,
                            outputs.steps_mut(),
                            &bounds.lengths,
                            dims.hidden_size,
                        )
                    }
                    None => recurrence.run(gates, state, None, &bounds, &self.plan),
                }
            }
        }
    }

    /// Problem dimensions
    pub fn dims(&self) -> &LstmDimensions {
        &self.dims
    }

    /// Processing direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Thread plan chosen at construction
    pub fn plan(&self) -> &ThreadPlan {
        &self.plan
    }

    /// Fused, transposed input weights, `[input_size x 4 * hidden_size]`
    pub fn fused_input_weights(&self) -> &[f32] {
        &self.input_weights
    }

    /// Fused, transposed recurrent weights, `[hidden_size x 4 * hidden_size]`
    pub fn fused_recurrent_weights(&self) -> &[f32] {
        &self.recurrent_weights
    }

    /// Fused biases, if the engine has a bias
    pub fn fused_bias(&self) -> Option<&FusedBias> {
        self.bias.as_ref()
    }

    /// Working buffers
    pub fn scratch(&self) -> &ScratchBufferSet {
        &self.scratch
    }
}
