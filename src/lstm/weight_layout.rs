use super::*;

/// For each fused gate slot {input, forget, output, cell}, the index of the same gate
/// in the source order {input, output, forget, cell}.
const SOURCE_GATE_FOR_FUSED_SLOT: [usize; GATE_COUNT] = [0, 2, 1, 3];

/// Reorders and transposes a gate weight matrix into the fused row-major layout.
///
/// The source is `[4 * hidden_size x feature_size]` with gate blocks ordered
/// {input, output, forget, cell}. The result is `[feature_size x 4 * hidden_size]` where,
/// for feature row `r`, the four gate segments of length `hidden_size` appear contiguously
/// in the order {input, forget, output, cell} and
/// `fused[r * 4H + slot * H + c] == source[(gate * H + c) * feature_size + r]`.
///
/// The same transform is used for the input weights (`feature_size == input_size`) and the
/// recurrent weights (`feature_size == hidden_size`).
///
/// # Parameters
///
/// - `source` - Weights in source order, `4 * hidden_size * feature_size` elements
/// - `hidden_size` - Number of LSTM units
/// - `feature_size` - Number of columns of each source gate block
///
/// # Returns
///
/// - `Ok(Vec<f32>)` - The fused, transposed weights
/// - `Err(ModelError::ShapeMismatch)` - If `source` has the wrong length
pub fn transpose_gate_weights(
    source: &[f32],
    hidden_size: usize,
    feature_size: usize,
) -> Result<Vec<f32>, ModelError> {
    validate_view_len(
        source,
        GATE_COUNT * hidden_size * feature_size,
        "gate weights",
    )?;

    let block = hidden_size * feature_size;
    let fused_width = GATE_COUNT * hidden_size;
    let mut fused = vec![0.0; source.len()];

    for (row, fused_row) in fused.chunks_mut(fused_width).enumerate() {
        for (slot, segment) in fused_row.chunks_mut(hidden_size).enumerate() {
            let gate_block = &source[SOURCE_GATE_FOR_FUSED_SLOT[slot] * block..];
            for (c, value) in segment.iter_mut().enumerate() {
                *value = gate_block[c * feature_size + row];
            }
        }
    }

    Ok(fused)
}

/// Inverse of [`transpose_gate_weights`]: recovers the source-order matrix from fused weights.
///
/// # Parameters
///
/// - `fused` - Fused weights, `feature_size x 4 * hidden_size`
/// - `hidden_size` - Number of LSTM units
/// - `feature_size` - Number of columns of each source gate block
///
/// # Returns
///
/// - `Ok(Vec<f32>)` - Weights in the source layout, `[4 * hidden_size x feature_size]`
/// - `Err(ModelError::ShapeMismatch)` - If `fused` has the wrong length
pub fn restore_gate_weights(
    fused: &[f32],
    hidden_size: usize,
    feature_size: usize,
) -> Result<Vec<f32>, ModelError> {
    validate_view_len(
        fused,
        GATE_COUNT * hidden_size * feature_size,
        "fused gate weights",
    )?;

    let block = hidden_size * feature_size;
    let fused_width = GATE_COUNT * hidden_size;
    let mut source = vec![0.0; fused.len()];

    for (row, fused_row) in fused.chunks(fused_width).enumerate() {
        for (slot, segment) in fused_row.chunks(hidden_size).enumerate() {
            let gate_block = &mut source[SOURCE_GATE_FOR_FUSED_SLOT[slot] * block..];
            for (c, &value) in segment.iter().enumerate() {
                gate_block[c * feature_size + row] = value;
            }
        }
    }

    Ok(source)
}
