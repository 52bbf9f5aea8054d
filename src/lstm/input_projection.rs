use super::*;
use crate::math::gemm;
use rayon::prelude::*;
use tracing::trace;

/// Input-to-gates affine transform for every `(timestep, batch row)` pair
///
/// Has no recurrent dependency, so the flattened `seq x batch` rows are split into
/// contiguous ranges that run as independent tasks.
///
/// # Fields
///
/// - `weights` - Fused input weights, `[input_size x 4 * hidden_size]`
/// - `input_size` - Features per timestep
/// - `gate_width` - `4 * hidden_size`
#[derive(Debug, Clone, Copy)]
pub struct InputProjectionStage<'a> {
    weights: &'a [f32],
    input_size: usize,
    gate_width: usize,
}

impl<'a> InputProjectionStage<'a> {
    /// Creates the stage over fused input weights.
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If `weights` is not `input_size * gate_width` long
    pub fn new(weights: &'a [f32], input_size: usize, gate_width: usize) -> Result<Self, ModelError> {
        validate_view_len(weights, input_size * gate_width, "fused input weights")?;
        Ok(InputProjectionStage {
            weights,
            input_size,
            gate_width,
        })
    }

    /// Overwrites `gates[row] = inputs[row] * W` for the first `total_rows` flattened rows.
    ///
    /// Row ranges hold `ceil(total_rows / input_threads)` rows; the last range takes the remainder.
    ///
    /// # Parameters
    ///
    /// - `inputs` - Flattened `[rows x input_size]` input, at least `total_rows` rows
    /// - `gates` - Flattened `[rows x gate_width]` pre-activations, at least `total_rows` rows
    /// - `total_rows` - Number of rows to project
    /// - `input_threads` - Number of row ranges
    ///
    /// # Returns
    ///
    /// - `Ok(())` - If every range was projected
    /// - `Err(ModelError)` - If a buffer is too short or a gemm view cannot be built
    pub fn project(
        &self,
        inputs: &[f32],
        gates: &mut [f32],
        total_rows: usize,
        input_threads: usize,
    ) -> Result<(), ModelError> {
        if total_rows == 0 {
            return Ok(());
        }

        let input_span = total_rows * self.input_size;
        let gate_span = total_rows * self.gate_width;
        if inputs.len() < input_span || gates.len() < gate_span {
            return Err(ModelError::ShapeMismatch(format!(
                "input projection of {} rows needs {} input and {} gate elements, got {} and {}",
                total_rows,
                input_span,
                gate_span,
                inputs.len(),
                gates.len()
            )));
        }

        let rows_per_task = total_rows.div_ceil(input_threads.max(1));
        trace!(total_rows, rows_per_task, "projecting inputs");

        gates[..gate_span]
            .par_chunks_mut(rows_per_task * self.gate_width)
            .zip(inputs[..input_span].par_chunks(rows_per_task * self.input_size))
            .try_for_each(|(gate_rows, input_rows)| {
                let rows = input_rows.len() / self.input_size;
                gemm(
                    rows,
                    self.gate_width,
                    self.input_size,
                    1.0,
                    input_rows,
                    self.input_size,
                    self.weights,
                    self.gate_width,
                    0.0,
                    gate_rows,
                    self.gate_width,
                )
            })
    }
}
