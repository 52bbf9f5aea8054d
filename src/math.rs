/// Activation functions and the activation registry
pub mod activation;
/// Elementwise gate helpers (peephole product, bias + clip, gate merge)
pub mod elementwise;
/// Matrix multiply used for the input and recurrent affine transforms
pub mod gemm;

pub use activation::*;
pub use elementwise::*;
pub use gemm::*;
