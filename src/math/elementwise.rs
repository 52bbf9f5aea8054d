/// Accumulates an elementwise product: `dest[i] += a[i] * b[i]`.
///
/// Used for peephole connections, where the cell state is multiplied by the peephole
/// weights and added onto a gate pre-activation.
///
/// # Parameters
///
/// - `a` - First factor
/// - `b` - Second factor
/// - `dest` - Accumulator, must be at least as long as the shorter factor
#[inline]
pub fn elementwise_product(a: &[f32], b: &[f32], dest: &mut [f32]) {
    for ((d, &x), &y) in dest.iter_mut().zip(a).zip(b) {
        *d += x * y;
    }
}

/// Adds an optional bias and then clips into `[-threshold, threshold]`.
///
/// With `clip == None` only the bias is added; with `bias == None` only the clip is applied.
///
/// # Parameters
///
/// - `clip` - Optional clip threshold, always positive when present
/// - `bias` - Optional bias vector added before clipping
/// - `values` - Gate pre-activations, updated in place
#[inline]
pub fn clip_add_bias(clip: Option<f32>, bias: Option<&[f32]>, values: &mut [f32]) {
    match (clip, bias) {
        (Some(threshold), Some(bias)) => {
            for (v, &b) in values.iter_mut().zip(bias) {
                *v = (*v + b).clamp(-threshold, threshold);
            }
        }
        (Some(threshold), None) => {
            for v in values.iter_mut() {
                *v = v.clamp(-threshold, threshold);
            }
        }
        (None, Some(bias)) => {
            for (v, &b) in values.iter_mut().zip(bias) {
                *v += b;
            }
        }
        (None, None) => {}
    }
}

/// Merges the gates into the cell state: `cell[i] = forget[i] * cell[i] + input[i] * candidate[i]`.
///
/// The previous cell state is read and overwritten in place.
///
/// # Parameters
///
/// - `cell` - Previous cell state on entry, new cell state on exit
/// - `input` - Activated input gate
/// - `forget` - Activated forget gate
/// - `candidate` - Activated cell candidate
#[inline]
pub fn merge_lstm_gates_to_memory(
    cell: &mut [f32],
    input: &[f32],
    forget: &[f32],
    candidate: &[f32],
) {
    for (((c, &i), &f), &g) in cell.iter_mut().zip(input).zip(forget).zip(candidate) {
        *c = *c * f + i * g;
    }
}
