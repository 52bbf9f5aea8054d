use crate::error::ModelError;
use ndarray::linalg::general_mat_mul;
use ndarray::{ArrayView2, ArrayViewMut2, ShapeBuilder};

/// Number of elements a row-major `rows x cols` matrix with leading dimension `ld` spans
#[inline]
fn matrix_span(rows: usize, cols: usize, ld: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * ld + cols
    }
}

/// Builds a strided read-only matrix view over a flat slice
fn matrix_view<'a>(
    data: &'a [f32],
    rows: usize,
    cols: usize,
    ld: usize,
    name: &str,
) -> Result<ArrayView2<'a, f32>, ModelError> {
    let span = matrix_span(rows, cols, ld);
    if ld < cols || data.len() < span {
        return Err(ModelError::ProcessingError(format!(
            "gemm operand {} needs {} elements with leading dimension {}, got {}",
            name,
            span,
            ld,
            data.len()
        )));
    }
    Ok(ArrayView2::from_shape(
        (rows, cols).strides((ld, 1)),
        &data[..span],
    )?)
}

/// Single-precision general matrix multiply over flat row-major slices.
///
/// Computes `C = alpha * A * B + beta * C` where `A` is `m x k`, `B` is `k x n` and `C` is `m x n`.
/// With `beta == 0.0` the previous contents of `C` are overwritten rather than scaled.
///
/// # Parameters
///
/// - `m` - Rows of `A` and `C`
/// - `n` - Columns of `B` and `C`
/// - `k` - Columns of `A`, rows of `B`
/// - `alpha` - Scale applied to the product
/// - `a` - Left operand
/// - `lda` - Leading dimension (row stride) of `a`
/// - `b` - Right operand
/// - `ldb` - Leading dimension (row stride) of `b`
/// - `beta` - Scale applied to the existing contents of `c`
/// - `c` - Accumulator / destination
/// - `ldc` - Leading dimension (row stride) of `c`
///
/// # Returns
///
/// - `Ok(())` - If the product was written into `c`
/// - `Err(ModelError::ProcessingError)` - If any slice is too short for its declared shape
pub fn gemm(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) -> Result<(), ModelError> {
    if m == 0 || n == 0 {
        return Ok(());
    }

    let a = matrix_view(a, m, k, lda, "A")?;
    let b = matrix_view(b, k, n, ldb, "B")?;

    let span = matrix_span(m, n, ldc);
    if ldc < n || c.len() < span {
        return Err(ModelError::ProcessingError(format!(
            "gemm operand C needs {} elements with leading dimension {}, got {}",
            span,
            ldc,
            c.len()
        )));
    }
    let mut c = ArrayViewMut2::from_shape((m, n).strides((ldc, 1)), &mut c[..span])?;

    gemm_view(alpha, &a, &b, beta, &mut c);
    Ok(())
}

/// View-level form of [`gemm`], used when `C` is a column block split out of a larger matrix.
///
/// # Parameters
///
/// - `alpha` - Scale applied to the product
/// - `a` - Left operand, `m x k`
/// - `b` - Right operand, `k x n`
/// - `beta` - Scale applied to the existing contents of `c`
/// - `c` - Destination, `m x n`
///
/// # Panics
///
/// - If the operand shapes are incompatible
#[inline]
pub fn gemm_view(
    alpha: f32,
    a: &ArrayView2<'_, f32>,
    b: &ArrayView2<'_, f32>,
    beta: f32,
    c: &mut ArrayViewMut2<'_, f32>,
) {
    general_mat_mul(alpha, a, b, beta, c);
}
