use super::scratch::{FusedBias, PeepholeWeights};
use crate::math::{
    GateActivations, clip_add_bias, elementwise_product, merge_lstm_gates_to_memory,
};

/// Per-row elementwise gate math of one LSTM direction
///
/// Operates on one batch row at a time: the `4 * hidden_size` fused gate pre-activations
/// laid out `{input, forget, output, cell}`, the row's cell state, and the row's hidden-state
/// output slot. The gate segments are overwritten with their activated values and the cell
/// state is updated in place.
///
/// # Fields
///
/// - `hidden_size` - Length of each gate segment
/// - `input_forget` - Couples the forget gate to `1 - input gate`
/// - `clip` - Clip threshold, `None` when clipping is disabled
/// - `bias` - Fused per-gate biases, if the unit has a bias
/// - `peephole` - Peephole weights, if the unit has them
/// - `activations` - The `f`, `g` and `h` activations
#[derive(Debug, Clone, Copy)]
pub struct GateActivationPipeline<'a> {
    hidden_size: usize,
    input_forget: bool,
    clip: Option<f32>,
    bias: Option<&'a FusedBias>,
    peephole: Option<PeepholeWeights<'a>>,
    activations: GateActivations,
}

impl<'a> GateActivationPipeline<'a> {
    /// Creates a pipeline for one direction.
    ///
    /// # Parameters
    ///
    /// - `hidden_size` - Number of LSTM units
    /// - `input_forget` - Whether the forget gate is `1 - input gate`
    /// - `clip` - Clip threshold; `None` or a value `<= 0` disables clipping
    /// - `bias` - Fused biases, `None` when the unit has no bias
    /// - `peephole` - Peephole weights, `None` when the unit has no peepholes
    /// - `activations` - Gate, candidate and cell-state activations
    ///
    /// # Returns
    ///
    /// * `GateActivationPipeline` - The configured pipeline
    pub fn new(
        hidden_size: usize,
        input_forget: bool,
        clip: Option<f32>,
        bias: Option<&'a FusedBias>,
        peephole: Option<PeepholeWeights<'a>>,
        activations: &GateActivations,
    ) -> Self {
        GateActivationPipeline {
            hidden_size,
            input_forget,
            clip: clip.filter(|threshold| *threshold > 0.0),
            bias,
            peephole,
            activations: *activations,
        }
    }

    /// Length of each gate segment
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Runs the gate math for one batch row.
    ///
    /// On exit the gate segments hold the activated `i`, `f`, `o` and `g` values, `cell`
    /// holds `f * cell_prev + i * g` and `hidden` holds `o * h(cell)`.
    ///
    /// # Parameters
    ///
    /// - `gates` - Fused pre-activations of this row, `4 * hidden_size` elements
    /// - `cell` - Previous cell state on entry, new cell state on exit
    /// - `hidden` - Destination for the new hidden state
    pub fn compute_row(&self, gates: &mut [f32], cell: &mut [f32], hidden: &mut [f32]) {
        let h = self.hidden_size;
        let (input, rest) = gates.split_at_mut(h);
        let (forget, rest) = rest.split_at_mut(h);
        let (output, candidate) = rest.split_at_mut(h);
        let candidate = &mut candidate[..h];
        let f = &self.activations.f;

        if let Some(peephole) = &self.peephole {
            elementwise_product(cell, peephole.input, input);
        }
        clip_add_bias(self.clip, self.bias.map(|b| b.input.as_slice()), input);
        f.apply(input);

        if self.input_forget {
            for (fg, &ig) in forget.iter_mut().zip(input.iter()) {
                *fg = 1.0 - ig;
            }
        } else {
            if let Some(peephole) = &self.peephole {
                elementwise_product(cell, peephole.forget, forget);
            }
            clip_add_bias(self.clip, self.bias.map(|b| b.forget.as_slice()), forget);
            f.apply(forget);
        }

        clip_add_bias(self.clip, self.bias.map(|b| b.cell.as_slice()), candidate);
        self.activations.g.apply(candidate);

        merge_lstm_gates_to_memory(cell, input, forget, candidate);

        // output peephole sees the updated cell state
        if let Some(peephole) = &self.peephole {
            elementwise_product(cell, peephole.output, output);
        }
        clip_add_bias(self.clip, self.bias.map(|b| b.output.as_slice()), output);
        f.apply(output);

        self.activations.h.merge_gates(cell, output, hidden);
    }
}
