use super::*;
use crate::error::IoError;
use ndarray::{Array, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Writes `value` to `path` as pretty-printed JSON
fn save_json<T: Serialize>(value: &T, path: &str) -> Result<(), IoError> {
    let file = File::create(path).map_err(IoError::StdIoError)?;
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, value).map_err(IoError::JsonError)?;
    writer.flush().map_err(IoError::StdIoError)?;
    Ok(())
}

/// Reads a JSON value from `path`
fn load_json<T: for<'de> Deserialize<'de>>(path: &str) -> Result<T, IoError> {
    let reader = IoError::load_in_buf_reader(path)?;
    from_reader(reader).map_err(IoError::JsonError)
}

impl LstmAttributes {
    /// Saves the attributes to a JSON file.
    ///
    /// # Parameters
    ///
    /// * `path` - File path to write, created or overwritten
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Attributes written
    /// - `Err(IoError::StdIoError)` - File creation or write failed
    /// - `Err(IoError::JsonError)` - Serialization failed
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        save_json(self, path)
    }

    /// Loads attributes from a JSON file written by [`LstmAttributes::save_to_path`].
    ///
    /// Missing optional fields take their defaults.
    ///
    /// # Returns
    ///
    /// - `Ok(LstmAttributes)` - The loaded attributes
    /// - `Err(IoError::StdIoError)` - File not found or read failed
    /// - `Err(IoError::JsonError)` - Deserialization failed
    pub fn load_from_path(path: &str) -> Result<Self, IoError> {
        load_json(path)
    }
}

/// Flat, serializable weights of an LSTM unit in the source layout
///
/// # Fields
///
/// - `num_directions` - 1 or 2
/// - `hidden_size` - Number of LSTM units
/// - `input_size` - Input features per timestep
/// - `w` - Input weights, `num_directions * 4 * hidden_size * input_size` elements
/// - `r` - Recurrent weights, `num_directions * 4 * hidden_size * hidden_size` elements
/// - `b` - Optional bias, `num_directions * 8 * hidden_size` elements
/// - `p` - Optional peephole weights, `num_directions * 3 * hidden_size` elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableLstmWeights {
    pub num_directions: usize,
    pub hidden_size: usize,
    pub input_size: usize,
    pub w: Vec<f32>,
    pub r: Vec<f32>,
    #[serde(default)]
    pub b: Option<Vec<f32>>,
    #[serde(default)]
    pub p: Option<Vec<f32>>,
}

/// Weight tensors rebuilt from [`SerializableLstmWeights`]
///
/// # Fields
///
/// - `w` - `[num_directions, 4 * hidden_size, input_size]`
/// - `r` - `[num_directions, 4 * hidden_size, hidden_size]`
/// - `b` - `[num_directions, 8 * hidden_size]` if present
/// - `p` - `[num_directions, 3 * hidden_size]` if present
#[derive(Debug, Clone, PartialEq)]
pub struct LstmWeightTensors {
    pub w: Tensor,
    pub r: Tensor,
    pub b: Option<Tensor>,
    pub p: Option<Tensor>,
}

impl SerializableLstmWeights {
    /// Captures weight tensors in logical order.
    ///
    /// # Parameters
    ///
    /// - `w` - `[num_directions, 4 * hidden_size, input_size]`
    /// - `r` - `[num_directions, 4 * hidden_size, hidden_size]`
    /// - `b` - Optional `[num_directions, 8 * hidden_size]`
    /// - `p` - Optional `[num_directions, 3 * hidden_size]`
    ///
    /// # Returns
    ///
    /// - `Ok(SerializableLstmWeights)` - The flattened weights
    /// - `Err(ModelError::ShapeMismatch)` - If the tensors disagree with each other
    pub fn from_tensors(
        w: &Tensor,
        r: &Tensor,
        b: Option<&Tensor>,
        p: Option<&Tensor>,
    ) -> Result<Self, ModelError> {
        if w.ndim() != 3 {
            return Err(ModelError::ShapeMismatch(format!(
                "Input W must have 3 dimensions. Actual: {:?}",
                w.shape()
            )));
        }
        let num_directions = w.shape()[0];
        let hidden_size = w.shape()[1] / GATE_COUNT;
        let input_size = w.shape()[2];

        validate_tensor_shape(w, &[num_directions, GATE_COUNT * hidden_size, input_size], "W")?;
        validate_tensor_shape(r, &[num_directions, GATE_COUNT * hidden_size, hidden_size], "R")?;
        if let Some(b) = b {
            validate_tensor_shape(b, &[num_directions, 2 * GATE_COUNT * hidden_size], "B")?;
        }
        if let Some(p) = p {
            validate_tensor_shape(p, &[num_directions, 3 * hidden_size], "P")?;
        }

        Ok(SerializableLstmWeights {
            num_directions,
            hidden_size,
            input_size,
            w: w.iter().copied().collect(),
            r: r.iter().copied().collect(),
            b: b.map(|b| b.iter().copied().collect()),
            p: p.map(|p| p.iter().copied().collect()),
        })
    }

    /// Rebuilds the weight tensors.
    ///
    /// # Errors
    ///
    /// - `ModelError::ProcessingError` - If a flat vector does not match the stored dimensions
    pub fn to_tensors(&self) -> Result<LstmWeightTensors, ModelError> {
        let d = self.num_directions;
        let gates = GATE_COUNT * self.hidden_size;

        Ok(LstmWeightTensors {
            w: Array::from_shape_vec(IxDyn(&[d, gates, self.input_size]), self.w.clone())?,
            r: Array::from_shape_vec(IxDyn(&[d, gates, self.hidden_size]), self.r.clone())?,
            b: match &self.b {
                Some(b) => Some(Array::from_shape_vec(IxDyn(&[d, 2 * gates]), b.clone())?),
                None => None,
            },
            p: match &self.p {
                Some(p) => Some(Array::from_shape_vec(
                    IxDyn(&[d, 3 * self.hidden_size]),
                    p.clone(),
                )?),
                None => None,
            },
        })
    }

    /// Saves the weights to a JSON file.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Weights written
    /// - `Err(IoError::StdIoError)` - File creation or write failed
    /// - `Err(IoError::JsonError)` - Serialization failed
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        save_json(self, path)
    }

    /// Loads weights from a JSON file written by [`SerializableLstmWeights::save_to_path`].
    ///
    /// # Returns
    ///
    /// - `Ok(SerializableLstmWeights)` - The loaded weights
    /// - `Err(IoError::StdIoError)` - File not found or read failed
    /// - `Err(IoError::JsonError)` - Deserialization failed
    pub fn load_from_path(path: &str) -> Result<Self, IoError> {
        load_json(path)
    }
}
