pub use crate::error::{IoError, ModelError};
pub use crate::lstm::*;
pub use crate::math::{Activation, ActivationKind, GateActivations};
