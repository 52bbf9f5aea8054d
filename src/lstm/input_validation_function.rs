use super::*;

/// Validates that a dimension value is greater than 0
///
/// # Parameters
///
/// - `value` - The dimension value to validate
/// - `name` - The name of the dimension for error messages
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError::ConfigurationError)` if validation fails
pub(super) fn validate_dimension_greater_than_zero(
    value: usize,
    name: &str,
) -> Result<(), ModelError> {
    if value == 0 {
        return Err(ModelError::ConfigurationError(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Validates the length of a required flat view
///
/// # Parameters
///
/// - `data` - The flat view to check
/// - `expected` - Required number of elements
/// - `name` - Name of the view for error messages
///
/// # Returns
///
/// * `Ok(())` if `data.len() == expected`
/// * `Err(ModelError::ShapeMismatch)` otherwise
pub(super) fn validate_view_len(data: &[f32], expected: usize, name: &str) -> Result<(), ModelError> {
    if data.len() != expected {
        return Err(ModelError::ShapeMismatch(format!(
            "{} must have {} elements, got {}",
            name,
            expected,
            data.len()
        )));
    }
    Ok(())
}

/// Validates the length of an optional flat view, where an empty view means "absent"
///
/// # Parameters
///
/// - `data` - The flat view to check, empty when the tensor was not supplied
/// - `expected` - Required number of elements when present
/// - `name` - Name of the view for error messages
///
/// # Returns
///
/// * `Ok(())` if the view is empty or has exactly `expected` elements
/// * `Err(ModelError::ShapeMismatch)` otherwise
pub(super) fn validate_optional_view_len(
    data: &[f32],
    expected: usize,
    name: &str,
) -> Result<(), ModelError> {
    if data.is_empty() {
        return Ok(());
    }
    validate_view_len(data, expected, name)
}

/// Validates that a tensor has exactly the expected shape
///
/// # Parameters
///
/// - `tensor` - The tensor to check
/// - `expected` - Required shape
/// - `name` - Name of the tensor for error messages
///
/// # Returns
///
/// * `Ok(())` if the shapes match
/// * `Err(ModelError::ShapeMismatch)` otherwise
pub(super) fn validate_tensor_shape<T>(
    tensor: &ArrayD<T>,
    expected: &[usize],
    name: &str,
) -> Result<(), ModelError> {
    if tensor.shape() != expected {
        return Err(ModelError::ShapeMismatch(format!(
            "Input {} must have shape {:?}. Actual: {:?}",
            name,
            expected,
            tensor.shape()
        )));
    }
    Ok(())
}
