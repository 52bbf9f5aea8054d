use std::fs::File;
use std::io::BufReader;

/// Error types that can occur while configuring or running the LSTM kernel
///
/// # Variants
///
/// - `ConfigurationError` - Indicates an unsupported configuration, such as an unknown activation name, an unsupported numeric precision or an invalid direction
/// - `ShapeMismatch` - Indicates that a tensor or flat view disagrees with the dimensions implied by `hidden_size`, `batch_size` or `num_directions`
/// - `ProcessingError` - Indicates that something went wrong while building internal views during computation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    ConfigurationError(String),
    ShapeMismatch(String),
    ProcessingError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ndarray::ShapeError> for ModelError {
    fn from(err: ndarray::ShapeError) -> Self {
        ModelError::ProcessingError(err.to_string())
    }
}

/// Input/Output error types that can occur while loading or saving attributes and weights
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors when working with JSON data formats
#[derive(Debug)]
pub enum IoError {
    StdIoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl IoError {
    /// Opens `path` and wraps it in a buffered reader.
    ///
    /// # Parameters
    ///
    /// - `path` - Path of the file to open
    ///
    /// # Returns
    ///
    /// - `Ok(BufReader<File>)` - A buffered reader over the file
    /// - `Err(IoError::StdIoError)` - If the file cannot be opened
    pub fn load_in_buf_reader(path: &str) -> Result<BufReader<File>, IoError> {
        let file = File::open(path).map_err(IoError::StdIoError)?;
        Ok(BufReader::new(file))
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::StdIoError(e) => write!(f, "IO error: {}", e),
            IoError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for IoError {}
