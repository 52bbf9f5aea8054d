use super::*;
use crate::math::{gemm, gemm_view};
use ndarray::{ArrayView2, ArrayViewMut2, Axis, s};
use rayon::prelude::*;
use tracing::trace;

/// Recurrent state buffers handed to [`RecurrentStage::run`]
///
/// # Fields
///
/// - `cell` - Running cell state, initialised to the initial cell state by the caller
/// - `hidden0` - Initial hidden state
/// - `final_hidden` - Destination for each row's last active hidden state
/// - `final_cell` - Destination for each row's last active cell state
#[derive(Debug)]
pub struct RecurrentState<'s> {
    pub cell: &'s mut [f32],
    pub hidden0: &'s [f32],
    pub final_hidden: &'s mut [f32],
    pub final_cell: &'s mut [f32],
}

/// Sequential-in-time recurrence of one direction
///
/// For every timestep below the longest sequence, adds `hidden_prev * R` into the
/// timestep's gate pre-activations and runs the gate pipeline for every row that is still
/// active. Finished rows are skipped, so their cell and hidden state stay frozen, and their
/// output slot for the timestep is zeroed.
#[derive(Debug, Clone, Copy)]
pub struct RecurrentStage<'a> {
    weights: &'a [f32],
    pipeline: GateActivationPipeline<'a>,
    hidden_size: usize,
    gate_width: usize,
}

impl<'a> RecurrentStage<'a> {
    /// Creates the stage over fused recurrent weights.
    ///
    /// # Parameters
    ///
    /// - `weights` - Fused recurrent weights, `[hidden_size x 4 * hidden_size]`
    /// - `pipeline` - Gate math applied to each active row
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If `weights` does not match the pipeline's hidden size
    pub fn new(weights: &'a [f32], pipeline: GateActivationPipeline<'a>) -> Result<Self, ModelError> {
        let hidden_size = pipeline.hidden_size();
        let gate_width = GATE_COUNT * hidden_size;
        validate_view_len(weights, hidden_size * gate_width, "fused recurrent weights")?;
        Ok(RecurrentStage {
            weights,
            pipeline,
            hidden_size,
            gate_width,
        })
    }

    /// Runs the recurrence over every timestep.
    ///
    /// Batch-parallel plans give each task a contiguous slice of rows for the whole sequence.
    /// Column-parallel plans walk the rows as one block and split the gate columns of each
    /// timestep's recurrent transform across tasks.
    ///
    /// # Parameters
    ///
    /// - `gates` - Projected pre-activations, `[seq_length x batch_size x 4 * hidden_size]`
    /// - `state` - Recurrent state and final-state destinations
    /// - `outputs` - Optional per-timestep hidden-state output
    /// - `bounds` - Per-row sequence lengths
    /// - `plan` - Task split for the hidden phase
    ///
    /// # Returns
    ///
    /// - `Ok(())` - If every timestep completed
    /// - `Err(ModelError)` - If a buffer has the wrong length or a gemm view cannot be built
    pub fn run<'s>(
        &self,
        gates: &'s mut [f32],
        state: RecurrentState<'s>,
        outputs: Option<SequenceOutput<'s>>,
        bounds: &SequenceBounds,
        plan: &ThreadPlan,
    ) -> Result<(), ModelError> {
        let batch_size = bounds.lengths.len();
        let state_len = batch_size * self.hidden_size;
        let step_gates = batch_size * self.gate_width;
        if step_gates == 0 {
            return Ok(());
        }
        let seq_length = gates.len() / step_gates;

        validate_view_len(gates, seq_length * step_gates, "gate pre-activations")?;
        validate_view_len(state.cell, state_len, "cell state")?;
        validate_view_len(state.hidden0, state_len, "initial hidden state")?;
        validate_view_len(state.final_hidden, state_len, "final hidden state")?;
        validate_view_len(state.final_cell, state_len, "final cell state")?;
        if let Some(outputs) = &outputs {
            if outputs.len() != seq_length {
                return Err(ModelError::ShapeMismatch(format!(
                    "output sequence must have {} timesteps, got {}",
                    seq_length,
                    outputs.len()
                )));
            }
        }

        let gate_steps: Vec<&'s mut [f32]> = gates.chunks_mut(step_gates).collect();
        let output_steps = outputs.map(SequenceOutput::into_steps);

        match plan.hidden_parallelism {
            HiddenParallelism::BatchParallel => {
                let rows_per_task = batch_size.div_ceil(plan.hidden_threads.max(1));
                let blocks = self.distribute(gate_steps, output_steps, state, rows_per_task);
                trace!(blocks = blocks.len(), rows_per_task, "running batch-parallel recurrence");
                blocks
                    .into_par_iter()
                    .try_for_each(|block| block.run(self, bounds, 1))
            }
            HiddenParallelism::ColumnParallel => {
                let mut blocks = self.distribute(gate_steps, output_steps, state, batch_size);
                trace!(column_tasks = plan.hidden_threads, "running column-parallel recurrence");
                match blocks.pop() {
                    Some(block) => block.run(self, bounds, plan.hidden_threads),
                    None => Ok(()),
                }
            }
        }
    }

    /// Splits every per-step and per-row buffer into blocks of `rows_per_task` batch rows
    fn distribute<'s>(
        &self,
        gate_steps: Vec<&'s mut [f32]>,
        output_steps: Option<Vec<&'s mut [f32]>>,
        state: RecurrentState<'s>,
        rows_per_task: usize,
    ) -> Vec<RowBlock<'s>> {
        let h = self.hidden_size;
        let state_chunk = rows_per_task * h;
        let has_outputs = output_steps.is_some();

        let mut blocks: Vec<RowBlock<'s>> = state
            .cell
            .chunks_mut(state_chunk)
            .zip(state.hidden0.chunks(state_chunk))
            .zip(state.final_hidden.chunks_mut(state_chunk))
            .zip(state.final_cell.chunks_mut(state_chunk))
            .enumerate()
            .map(|(index, (((cell, hidden0), final_hidden), final_cell))| RowBlock {
                first_row: index * rows_per_task,
                rows: cell.len() / h,
                gates: Vec::with_capacity(gate_steps.len()),
                outputs: has_outputs.then(|| Vec::with_capacity(gate_steps.len())),
                cell,
                hidden0,
                final_hidden,
                final_cell,
            })
            .collect();

        for step in gate_steps {
            for (block, piece) in blocks
                .iter_mut()
                .zip(step.chunks_mut(rows_per_task * self.gate_width))
            {
                block.gates.push(piece);
            }
        }

        if let Some(output_steps) = output_steps {
            for step in output_steps {
                for (block, piece) in blocks.iter_mut().zip(step.chunks_mut(state_chunk)) {
                    if let Some(outputs) = &mut block.outputs {
                        outputs.push(piece);
                    }
                }
            }
        }

        blocks
    }

    /// Adds `prev * R` into one timestep's gate rows, optionally splitting the gate columns
    fn recurrent_transform(
        &self,
        prev: &[f32],
        gates: &mut [f32],
        rows: usize,
        column_tasks: usize,
    ) -> Result<(), ModelError> {
        if column_tasks <= 1 {
            return gemm(
                rows,
                self.gate_width,
                self.hidden_size,
                1.0,
                prev,
                self.hidden_size,
                self.weights,
                self.gate_width,
                1.0,
                gates,
                self.gate_width,
            );
        }

        let a = ArrayView2::from_shape((rows, self.hidden_size), prev)?;
        let b = ArrayView2::from_shape((self.hidden_size, self.gate_width), self.weights)?;
        let c = ArrayViewMut2::from_shape((rows, self.gate_width), gates)?;

        let tasks = column_tasks.min(self.gate_width);
        let local_cols = self.gate_width / tasks;

        let mut column_blocks = Vec::with_capacity(tasks);
        let mut rest = c;
        for _ in 1..tasks {
            let (head, tail) = rest.split_at(Axis(1), local_cols);
            column_blocks.push(head);
            rest = tail;
        }
        // last block takes the remainder columns
        column_blocks.push(rest);

        column_blocks
            .into_par_iter()
            .enumerate()
            .for_each(|(task, mut block)| {
                let start = task * local_cols;
                let weights = b.slice(s![.., start..start + block.ncols()]);
                gemm_view(1.0, &a, &weights, 1.0, &mut block);
            });
        Ok(())
    }

    /// Gate math for one block's rows at timestep `t`
    fn apply_gates(&self, block: GateStep<'_>, lengths: &[usize], t: usize) {
        let h = self.hidden_size;
        let GateStep {
            first_row,
            gates,
            cell,
            hidden,
            final_cell,
            zero_finished,
        } = block;

        for (r, ((gate_row, cell_row), (hidden_row, final_cell_row))) in gates
            .chunks_mut(self.gate_width)
            .zip(cell.chunks_mut(h))
            .zip(hidden.chunks_mut(h).zip(final_cell.chunks_mut(h)))
            .enumerate()
        {
            let len = lengths[first_row + r];
            if t >= len {
                if zero_finished {
                    hidden_row.fill(0.0);
                }
                continue;
            }

            self.pipeline.compute_row(gate_row, cell_row, hidden_row);

            if t + 1 == len {
                final_cell_row.copy_from_slice(cell_row);
            }
        }
    }
}

/// Buffers of one block of rows at a single timestep
struct GateStep<'b> {
    first_row: usize,
    gates: &'b mut [f32],
    cell: &'b mut [f32],
    hidden: &'b mut [f32],
    final_cell: &'b mut [f32],
    zero_finished: bool,
}

/// A contiguous range of batch rows and every buffer slice those rows own
///
/// Blocks never share a row, so they run as independent tasks.
struct RowBlock<'s> {
    first_row: usize,
    rows: usize,
    gates: Vec<&'s mut [f32]>,
    outputs: Option<Vec<&'s mut [f32]>>,
    cell: &'s mut [f32],
    hidden0: &'s [f32],
    final_hidden: &'s mut [f32],
    final_cell: &'s mut [f32],
}

impl<'s> RowBlock<'s> {
    /// Walks every timestep for this block's rows, then writes their final states.
    fn run(
        self,
        stage: &RecurrentStage<'_>,
        bounds: &SequenceBounds,
        column_tasks: usize,
    ) -> Result<(), ModelError> {
        let RowBlock {
            first_row,
            rows,
            mut gates,
            mut outputs,
            cell,
            hidden0,
            final_hidden,
            final_cell,
        } = self;
        let h = stage.hidden_size;

        for t in 0..bounds.max {
            let gate_step = &mut *gates[t];
            match outputs.as_mut() {
                Some(outputs) => {
                    let (done, rest) = outputs.split_at_mut(t);
                    let prev: &[f32] = if t == 0 { hidden0 } else { &*done[t - 1] };
                    stage.recurrent_transform(prev, gate_step, rows, column_tasks)?;
                    stage.apply_gates(
                        GateStep {
                            first_row,
                            gates: gate_step,
                            cell: &mut *cell,
                            hidden: &mut *rest[0],
                            final_cell: &mut *final_cell,
                            zero_finished: true,
                        },
                        &bounds.lengths,
                        t,
                    );
                }
                None => {
                    let prev: &[f32] = if t == 0 { hidden0 } else { &*final_hidden };
                    stage.recurrent_transform(prev, gate_step, rows, column_tasks)?;
                    stage.apply_gates(
                        GateStep {
                            first_row,
                            gates: gate_step,
                            cell: &mut *cell,
                            hidden: &mut *final_hidden,
                            final_cell: &mut *final_cell,
                            zero_finished: false,
                        },
                        &bounds.lengths,
                        t,
                    );
                }
            }
        }

        let lengths = &bounds.lengths[first_row..first_row + rows];
        for (r, &len) in lengths.iter().enumerate() {
            let row = r * h..(r + 1) * h;
            if len == 0 {
                final_hidden[row.clone()].fill(0.0);
                final_cell[row].fill(0.0);
            } else if let Some(outputs) = &outputs {
                final_hidden[row.clone()].copy_from_slice(&outputs[len - 1][row]);
            }
        }

        if let Some(outputs) = &mut outputs {
            for step in outputs.iter_mut().skip(bounds.max) {
                step.fill(0.0);
            }
        }

        Ok(())
    }
}
