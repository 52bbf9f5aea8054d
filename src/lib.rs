/// Error types returned by the LSTM kernel
pub mod error;

pub use error::{IoError, ModelError};

/// A macro that generates a getter method for any field.
///
/// This macro creates a public getter method that returns the value of the specified
/// field. The generated method includes documentation describing the field being accessed.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., direction)
/// - `$field_name` - The name of the field to access (e.g., direction)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// Module `math` contains the numeric primitives the LSTM kernel is built on.
///
/// # Core Functions
///
/// ## Matrix Multiply
/// - `gemm` - Single-precision `C = alpha * A * B + beta * C` over flat row-major slices with leading dimensions
/// - `gemm_view` - The same product over `ndarray` views, used for column-split transforms
///
/// ## Activations
/// - `ActivationKind` - The eleven supported activation functions and the case-insensitive name registry
/// - `Activation` - An activation kind with its `alpha`/`beta` parameters
/// - `GateActivations` - The `f`, `g` and `h` activations of one direction
///
/// ## Elementwise Gate Helpers
/// - `elementwise_product` - Accumulating product used for peephole connections
/// - `clip_add_bias` - Bias addition followed by optional clipping
/// - `merge_lstm_gates_to_memory` - Cell state update `c = f * c + i * g`
///
/// # Example
/// ```rust
/// use lstm_kernel::math::{Activation, gemm};
///
/// let a = [1.0f32, 2.0, 3.0, 4.0];
/// let b = [1.0f32, 0.0, 0.0, 1.0];
/// let mut c = [0.0f32; 4];
/// gemm(2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2).unwrap();
/// assert_eq!(c, a);
///
/// let mut values = [0.0f32, 1.0];
/// Activation::from_name("Sigmoid").unwrap().apply(&mut values);
/// assert_eq!(values[0], 0.5);
/// ```
pub mod math;

/// Module `lstm` is the multi-threaded LSTM forward pass.
///
/// # Components
///
/// - **Weight layout**: `transpose_gate_weights` reorders `{i, o, f, c}` gate blocks into the fused, transposed `{i, f, o, c}` layout; `restore_gate_weights` inverts it
/// - **ScratchBufferSet**: per-engine working buffers, fused biases and borrowed peephole weights
/// - **ThreadPlan**: task counts for the input and hidden phases, behind the `PartitionStrategy` trait
/// - **InputProjectionStage**: the input-to-gates transform for every timestep, split over row ranges
/// - **RecurrentStage**: the time-sequential recurrence, batch-parallel or column-parallel
/// - **GateActivationPipeline**: per-row gate math with peepholes, bias, clipping and coupled gates
/// - **UniDirectionalLstm**: one forward or reverse engine
/// - **DirectionalOrchestrator**: forward, reverse and bidirectional execution
/// - **LstmOperator**: tensor-level operator with attribute parsing and shape validation
///
/// # Ragged Batches
///
/// Every row may have its own sequence length. Output timesteps at or beyond a row's length are
/// zero, and the final hidden and cell states of a row come from its own last timestep.
///
/// # Examples
/// ```rust
/// use lstm_kernel::lstm::*;
/// use ndarray::{Array, IxDyn};
///
/// let attributes = LstmAttributes::new("bidirectional", 3).with_clip(5.0);
/// let operator = LstmOperator::new(attributes).unwrap();
///
/// let x = Array::from_elem(IxDyn(&[4, 2, 5]), 0.25f32);
/// let w = Array::from_elem(IxDyn(&[2, 12, 5]), 0.05f32);
/// let r = Array::from_elem(IxDyn(&[2, 12, 3]), 0.05f32);
/// let lens = Array::from_shape_vec(IxDyn(&[2]), vec![4, 2]).unwrap();
///
/// let outputs = operator
///     .compute(&LstmInputs::new(x, w, r).with_sequence_lens(lens))
///     .unwrap();
/// assert_eq!(outputs.y.unwrap().shape(), &[4, 2, 2, 3]);
/// ```
pub mod lstm;

/// A convenience module that re-exports the most commonly used types from this crate.
///
/// # Examples
/// ```rust
/// use lstm_kernel::prelude::*;
///
/// let attributes = LstmAttributes::new("forward", 8);
/// assert!(LstmOperator::new(attributes).is_ok());
/// ```
pub mod prelude;
