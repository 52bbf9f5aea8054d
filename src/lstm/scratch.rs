use super::*;

/// Allocates a zero-initialised scratch buffer.
///
/// # Parameters
///
/// - `count` - Number of elements
///
/// # Returns
///
/// * `Vec<T>` - `count` copies of `T::default()`
pub fn allocate<T: Default + Clone>(count: usize) -> Vec<T> {
    vec![T::default(); count]
}

/// Per-gate sums of the input-side and recurrent-side bias vectors
///
/// Built once at engine construction and never mutated afterwards.
///
/// # Fields
///
/// - `input` - `Wb[i] + Rb[i]`
/// - `forget` - `Wb[f] + Rb[f]`
/// - `output` - `Wb[o] + Rb[o]`
/// - `cell` - `Wb[c] + Rb[c]`
#[derive(Debug, Clone, PartialEq)]
pub struct FusedBias {
    pub input: Vec<f32>,
    pub forget: Vec<f32>,
    pub output: Vec<f32>,
    pub cell: Vec<f32>,
}

impl FusedBias {
    /// Fuses an `8 * hidden_size` bias source laid out as
    /// `[Wb[i], Wb[o], Wb[f], Wb[c], Rb[i], Rb[o], Rb[f], Rb[c]]`.
    ///
    /// # Parameters
    ///
    /// - `source` - Concatenated input-side and recurrent-side biases
    /// - `hidden_size` - Number of LSTM units
    ///
    /// # Returns
    ///
    /// - `Ok(FusedBias)` - The per-gate fused biases
    /// - `Err(ModelError::ShapeMismatch)` - If `source` is not `8 * hidden_size` long
    pub fn from_source(source: &[f32], hidden_size: usize) -> Result<Self, ModelError> {
        validate_view_len(source, 2 * GATE_COUNT * hidden_size, "bias")?;

        let recurrent_offset = GATE_COUNT * hidden_size;
        let fuse = |gate: usize| -> Vec<f32> {
            let start = gate * hidden_size;
            source[start..start + hidden_size]
                .iter()
                .zip(&source[recurrent_offset + start..recurrent_offset + start + hidden_size])
                .map(|(wb, rb)| wb + rb)
                .collect()
        };

        Ok(FusedBias {
            input: fuse(0),
            output: fuse(1),
            forget: fuse(2),
            cell: fuse(3),
        })
    }
}

/// Borrowed peephole weights
///
/// The views point into the caller's `[3 * hidden_size]` peephole tensor, ordered
/// `[P[i], P[o], P[f]]`, which must outlive the engine that holds them.
///
/// # Fields
///
/// - `input` - Peephole weights for the input gate
/// - `output` - Peephole weights for the output gate
/// - `forget` - Peephole weights for the forget gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeepholeWeights<'a> {
    pub input: &'a [f32],
    pub output: &'a [f32],
    pub forget: &'a [f32],
}

impl<'a> PeepholeWeights<'a> {
    /// Splits a `3 * hidden_size` peephole source into per-gate views without copying.
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If `source` is not `3 * hidden_size` long
    pub fn from_source(source: &'a [f32], hidden_size: usize) -> Result<Self, ModelError> {
        validate_view_len(source, 3 * hidden_size, "peephole weights")?;

        let (input, rest) = source.split_at(hidden_size);
        let (output, forget) = rest.split_at(hidden_size);
        Ok(PeepholeWeights {
            input,
            output,
            forget,
        })
    }
}

/// Working buffers of one single-direction engine
///
/// Every buffer is its own allocation, so live ranges never overlap; the engine hands out
/// disjoint mutable views of them during `compute`.
///
/// # Fields
///
/// - `gates` - Gate pre-activations, `[seq_length x batch_size x 4 * hidden_size]`
/// - `hidden0` - Initial hidden state, `[batch_size x hidden_size]`
/// - `cell0` - Initial cell state, `[batch_size x hidden_size]`
/// - `cell` - Running cell state (previous cell on entry to a step, current cell on exit)
/// - `inputs_reverse` - Time-reversed inputs, only allocated for the reverse direction
/// - `outputs_reverse` - Reverse-direction output before un-reversal, only allocated for the reverse direction
#[derive(Debug, Clone)]
pub struct ScratchBufferSet {
    pub(crate) gates: Vec<f32>,
    pub(crate) hidden0: Vec<f32>,
    pub(crate) cell0: Vec<f32>,
    pub(crate) cell: Vec<f32>,
    pub(crate) inputs_reverse: Vec<f32>,
    pub(crate) outputs_reverse: Vec<f32>,
}

impl ScratchBufferSet {
    /// Allocates every buffer for the given dimensions and direction.
    ///
    /// # Parameters
    ///
    /// - `dims` - Engine dimensions
    /// - `direction` - Reverse engines additionally get the reversal buffers
    ///
    /// # Returns
    ///
    /// * `ScratchBufferSet` - Zero-filled buffers
    pub fn new(dims: &LstmDimensions, direction: Direction) -> Self {
        let state_len = dims.state_len();
        let (inputs_reverse, outputs_reverse) = match direction {
            Direction::Forward => (Vec::new(), Vec::new()),
            Direction::Reverse => (
                allocate(dims.input_len()),
                allocate(dims.seq_length * state_len),
            ),
        };

        ScratchBufferSet {
            gates: allocate(dims.seq_length * dims.batch_size * dims.gate_width()),
            hidden0: allocate(state_len),
            cell0: allocate(state_len),
            cell: allocate(state_len),
            inputs_reverse,
            outputs_reverse,
        }
    }

    /// Stores the caller's initial states; empty views leave the zero defaults in place.
    ///
    /// # Parameters
    ///
    /// - `initial_hidden` - Initial hidden state or an empty view
    /// - `initial_cell` - Initial cell state or an empty view
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If a non-empty view is not `batch_size * hidden_size` long
    pub fn set_initial_state(
        &mut self,
        initial_hidden: &[f32],
        initial_cell: &[f32],
    ) -> Result<(), ModelError> {
        validate_optional_view_len(initial_hidden, self.hidden0.len(), "initial hidden state")?;
        validate_optional_view_len(initial_cell, self.cell0.len(), "initial cell state")?;

        if initial_hidden.is_empty() {
            self.hidden0.fill(0.0);
        } else {
            self.hidden0.copy_from_slice(initial_hidden);
        }

        if initial_cell.is_empty() {
            self.cell0.fill(0.0);
        } else {
            self.cell0.copy_from_slice(initial_cell);
        }
        Ok(())
    }

    /// Resets the running cell state to the initial cell state before a new `compute`
    pub fn reset_cell_state(&mut self) {
        self.cell.copy_from_slice(&self.cell0);
    }

    /// Address ranges of every allocated buffer, labelled by name
    pub fn live_ranges(&self) -> Vec<(&'static str, std::ops::Range<*const f32>)> {
        [
            ("gates", &self.gates),
            ("hidden0", &self.hidden0),
            ("cell0", &self.cell0),
            ("cell", &self.cell),
            ("inputs_reverse", &self.inputs_reverse),
            ("outputs_reverse", &self.outputs_reverse),
        ]
        .into_iter()
        .filter(|(_, buffer)| !buffer.is_empty())
        .map(|(name, buffer)| (name, buffer.as_ptr_range()))
        .collect()
    }

    /// Gate pre-activation buffer
    pub fn gates(&self) -> &[f32] {
        &self.gates
    }

    /// Running cell state buffer
    pub fn cell(&self) -> &[f32] {
        &self.cell
    }
}
