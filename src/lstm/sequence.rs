use super::*;

/// Validated per-row sequence lengths for one `compute` call
///
/// Timesteps `< min` are active for every row; timesteps in `[min, max)` are active
/// only for rows whose length exceeds the timestep.
///
/// # Fields
///
/// - `lengths` - One length per batch row, each in `[0, seq_length]`
/// - `min` - `min(seq_length, min(lengths))`
/// - `max` - `max(lengths)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBounds {
    pub lengths: Vec<usize>,
    pub min: usize,
    pub max: usize,
}

impl SequenceBounds {
    /// Validates caller-supplied lengths, defaulting every row to `seq_length` when empty.
    ///
    /// # Parameters
    ///
    /// - `sequence_lengths` - One length per batch row, or an empty view
    /// - `seq_length` - Padded sequence length of the input
    /// - `batch_size` - Number of batch rows
    ///
    /// # Returns
    ///
    /// - `Ok(SequenceBounds)` - The lengths with derived bounds
    /// - `Err(ModelError::ShapeMismatch)` - If the count is not `batch_size` or a length is outside `[0, seq_length]`
    pub fn new(
        sequence_lengths: &[i32],
        seq_length: usize,
        batch_size: usize,
    ) -> Result<Self, ModelError> {
        let lengths = if sequence_lengths.is_empty() {
            vec![seq_length; batch_size]
        } else {
            if sequence_lengths.len() != batch_size {
                return Err(ModelError::ShapeMismatch(format!(
                    "sequence_lens must have {} entries, got {}",
                    batch_size,
                    sequence_lengths.len()
                )));
            }
            sequence_lengths
                .iter()
                .map(|&len| match usize::try_from(len) {
                    Ok(len) if len <= seq_length => Ok(len),
                    _ => Err(ModelError::ShapeMismatch(format!(
                        "sequence length {} is outside [0, {}]",
                        len, seq_length
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let max = lengths.iter().copied().max().unwrap_or(0);
        let min = lengths.iter().copied().min().unwrap_or(0).min(seq_length);

        Ok(SequenceBounds { lengths, min, max })
    }

    /// Whether `row` has already finished by timestep `step`
    #[inline]
    pub fn is_finished(&self, row: usize, step: usize) -> bool {
        step >= self.min && step >= self.lengths[row]
    }
}

/// Per-timestep mutable views into an output sequence
///
/// Each step is a `[batch_size x hidden_size]` slice. When two directions share one
/// `[seq_length x 2 x batch_size x hidden_size]` tensor, each direction gets its own
/// `SequenceOutput` whose steps skip over the other direction's slot, so both can be
/// written concurrently without a merge copy.
#[derive(Debug)]
pub struct SequenceOutput<'a> {
    steps: Vec<&'a mut [f32]>,
}

impl<'a> SequenceOutput<'a> {
    /// Views a `[seq_length x batch_size x hidden_size]` buffer one timestep at a time.
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If `buffer` is not `seq_length * step_len` long
    pub fn contiguous(
        buffer: &'a mut [f32],
        seq_length: usize,
        step_len: usize,
    ) -> Result<Self, ModelError> {
        validate_view_len(buffer, seq_length * step_len, "output sequence")?;
        Ok(SequenceOutput {
            steps: buffer.chunks_mut(step_len).collect(),
        })
    }

    /// Splits a `[seq_length x num_directions x step_len]` buffer into one view per direction.
    ///
    /// # Parameters
    ///
    /// - `buffer` - The shared output tensor
    /// - `seq_length` - Number of timesteps
    /// - `num_directions` - 1 or 2
    /// - `step_len` - `batch_size * hidden_size`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<SequenceOutput>)` - `num_directions` views, index 0 for forward
    /// - `Err(ModelError::ShapeMismatch)` - If `buffer` has the wrong length
    pub fn interleaved(
        buffer: &'a mut [f32],
        seq_length: usize,
        num_directions: usize,
        step_len: usize,
    ) -> Result<Vec<Self>, ModelError> {
        validate_view_len(
            buffer,
            seq_length * num_directions * step_len,
            "output sequence",
        )?;

        let mut views: Vec<SequenceOutput<'a>> = (0..num_directions)
            .map(|_| SequenceOutput {
                steps: Vec::with_capacity(seq_length),
            })
            .collect();

        for step in buffer.chunks_mut(num_directions * step_len) {
            for (view, slot) in views.iter_mut().zip(step.chunks_mut(step_len)) {
                view.steps.push(slot);
            }
        }
        Ok(views)
    }

    /// Number of timesteps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no timesteps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Read-only view of timestep `t`
    pub fn step(&self, t: usize) -> &[f32] {
        self.steps[t]
    }

    /// Mutable view of every timestep
    pub fn steps_mut(&mut self) -> &mut [&'a mut [f32]] {
        &mut self.steps
    }

    /// Consumes the view, returning the per-timestep slices
    pub fn into_steps(self) -> Vec<&'a mut [f32]> {
        self.steps
    }

    /// Zeros every timestep in `[from, len)`
    pub fn zero_from(&mut self, from: usize) {
        for step in self.steps.iter_mut().skip(from) {
            step.fill(0.0);
        }
    }
}

/// Reverses each row of a contiguous `[seq_length x batch_size x feature_size]` tensor in time.
///
/// Only the first `lengths[row]` timesteps of each row are reversed; timesteps at or beyond a
/// row's length are copied unchanged, so applying the reversal twice restores the input.
///
/// # Parameters
///
/// - `source` - Tensor to reverse
/// - `reversed` - Destination with the same length as `source`
/// - `lengths` - Per-row sequence lengths
/// - `seq_length` - Number of timesteps
/// - `batch_size` - Number of batch rows
/// - `feature_size` - Elements per row per timestep
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - If a buffer or the length list has the wrong size
pub fn reverse_sequence(
    source: &[f32],
    reversed: &mut [f32],
    lengths: &[usize],
    seq_length: usize,
    batch_size: usize,
    feature_size: usize,
) -> Result<(), ModelError> {
    let step_len = batch_size * feature_size;
    validate_view_len(source, seq_length * step_len, "sequence to reverse")?;
    validate_view_len(reversed, seq_length * step_len, "reversed sequence")?;

    let source_steps: Vec<&[f32]> = source.chunks(step_len).collect();
    let mut reversed_steps: Vec<&mut [f32]> = reversed.chunks_mut(step_len).collect();
    reverse_steps(&source_steps, &mut reversed_steps, lengths, feature_size)
}

/// Per-timestep form of [`reverse_sequence`].
///
/// For row `b` and `t < lengths[b]`, `destination[lengths[b] - 1 - t][b] = source[t][b]`;
/// for `t >= lengths[b]`, `destination[t][b] = source[t][b]`.
///
/// # Parameters
///
/// - `source` - Source timesteps, each `batch_size * feature_size` long
/// - `destination` - Destination timesteps, same count and size as `source`
/// - `lengths` - Per-row sequence lengths, one per batch row
/// - `feature_size` - Elements per row per timestep
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - If step counts, step sizes or lengths disagree
pub fn reverse_steps(
    source: &[&[f32]],
    destination: &mut [&mut [f32]],
    lengths: &[usize],
    feature_size: usize,
) -> Result<(), ModelError> {
    let seq_length = source.len();
    let step_len = lengths.len() * feature_size;

    if destination.len() != seq_length
        || source.iter().any(|step| step.len() != step_len)
        || destination.iter().any(|step| step.len() != step_len)
    {
        return Err(ModelError::ShapeMismatch(format!(
            "sequence reversal needs {} steps of {} elements on both sides",
            seq_length, step_len
        )));
    }
    if let Some(&len) = lengths.iter().find(|&&len| len > seq_length) {
        return Err(ModelError::ShapeMismatch(format!(
            "sequence length {} is outside [0, {}]",
            len, seq_length
        )));
    }

    for (row, &len) in lengths.iter().enumerate() {
        let cols = row * feature_size..(row + 1) * feature_size;
        for t in 0..seq_length {
            let target = if t < len { len - 1 - t } else { t };
            destination[target][cols.clone()].copy_from_slice(&source[t][cols.clone()]);
        }
    }
    Ok(())
}
