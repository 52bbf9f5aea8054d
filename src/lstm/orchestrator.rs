use super::*;
use tracing::debug;

/// The engines driven by a [`DirectionalOrchestrator`]
#[derive(Debug)]
enum DirectionEngines<'a> {
    Single(UniDirectionalLstm<'a>),
    Pair {
        forward: UniDirectionalLstm<'a>,
        reverse: UniDirectionalLstm<'a>,
    },
}

/// Drives one engine (forward or reverse) or a forward/reverse pair
///
/// A bidirectional pair runs both engines concurrently. They share no mutable state and
/// write disjoint direction slots of the caller's output tensors, so no merge copy is needed.
#[derive(Debug)]
pub struct DirectionalOrchestrator<'a> {
    engines: DirectionEngines<'a>,
}

impl<'a> DirectionalOrchestrator<'a> {
    /// Wraps a single forward or reverse engine
    pub fn unidirectional(engine: UniDirectionalLstm<'a>) -> Self {
        DirectionalOrchestrator {
            engines: DirectionEngines::Single(engine),
        }
    }

    /// Pairs a forward and a reverse engine into a bidirectional unit.
    ///
    /// # Parameters
    ///
    /// - `forward` - Engine built with [`Direction::Forward`]
    /// - `reverse` - Engine built with [`Direction::Reverse`]
    ///
    /// # Returns
    ///
    /// - `Ok(DirectionalOrchestrator)` - The bidirectional unit
    /// - `Err(ModelError::ConfigurationError)` - If the directions are wrong or the dimensions differ
    pub fn bidirectional(
        forward: UniDirectionalLstm<'a>,
        reverse: UniDirectionalLstm<'a>,
    ) -> Result<Self, ModelError> {
        if forward.direction() != Direction::Forward || reverse.direction() != Direction::Reverse {
            return Err(ModelError::ConfigurationError(format!(
                "bidirectional unit needs a forward and a reverse engine, got {:?} and {:?}",
                forward.direction(),
                reverse.direction()
            )));
        }
        if forward.dims() != reverse.dims() {
            return Err(ModelError::ConfigurationError(format!(
                "bidirectional engines must share dimensions, got {:?} and {:?}",
                forward.dims(),
                reverse.dims()
            )));
        }

        debug!("paired forward and reverse LSTM engines");
        Ok(DirectionalOrchestrator {
            engines: DirectionEngines::Pair { forward, reverse },
        })
    }

    /// Number of directions, 1 or 2
    pub fn num_directions(&self) -> usize {
        match &self.engines {
            DirectionEngines::Single(_) => 1,
            DirectionEngines::Pair { .. } => 2,
        }
    }

    /// Dimensions shared by every engine
    pub fn dims(&self) -> &LstmDimensions {
        match &self.engines {
            DirectionEngines::Single(engine) => engine.dims(),
            DirectionEngines::Pair { forward, .. } => forward.dims(),
        }
    }

    /// Runs every direction.
    ///
    /// # Parameters
    ///
    /// - `inputs` - `[seq_length x batch_size x input_size]`
    /// - `sequence_lengths` - One length per batch row, or empty for `seq_length` everywhere
    /// - `outputs` - Optional `[seq_length x num_directions x batch_size x hidden_size]` output
    /// - `final_hidden` - `[num_directions x batch_size x hidden_size]`
    /// - `final_cell` - `[num_directions x batch_size x hidden_size]`
    ///
    /// # Returns
    ///
    /// - `Ok(())` - If every direction populated its outputs
    /// - `Err(ModelError::ShapeMismatch)` - If any view disagrees with the dimensions
    pub fn compute(
        &mut self,
        inputs: &[f32],
        sequence_lengths: &[i32],
        outputs: Option<&mut [f32]>,
        final_hidden: &mut [f32],
        final_cell: &mut [f32],
    ) -> Result<(), ModelError> {
        match &mut self.engines {
            DirectionEngines::Single(engine) => {
                engine.compute(inputs, sequence_lengths, 1, outputs, final_hidden, final_cell)
            }
            DirectionEngines::Pair { forward, reverse } => {
                let dims = *forward.dims();
                let state_len = dims.state_len();
                validate_view_len(final_hidden, 2 * state_len, "final hidden state")?;
                validate_view_len(final_cell, 2 * state_len, "final cell state")?;

                let (forward_output, reverse_output) = match outputs {
                    Some(buffer) => {
                        let mut views =
                            SequenceOutput::interleaved(buffer, dims.seq_length, 2, state_len)?;
                        let reverse_view = views.pop();
                        (views.pop(), reverse_view)
                    }
                    None => (None, None),
                };

                let (forward_hidden, reverse_hidden) = final_hidden.split_at_mut(state_len);
                let (forward_cell, reverse_cell) = final_cell.split_at_mut(state_len);

                let (forward_result, reverse_result) = rayon::join(
                    || {
                        forward.compute_into(
                            inputs,
                            sequence_lengths,
                            forward_output,
                            forward_hidden,
                            forward_cell,
                        )
                    },
                    || {
                        reverse.compute_into(
                            inputs,
                            sequence_lengths,
                            reverse_output,
                            reverse_hidden,
                            reverse_cell,
                        )
                    },
                );
                forward_result?;
                reverse_result
            }
        }
    }
}
