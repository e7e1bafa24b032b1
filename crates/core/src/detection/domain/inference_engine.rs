use crate::shared::error::{BoxedError, DetectionError};
use crate::shared::tensor::{NamedTensorOutput, Tensor};

/// Domain interface for the external neural-network runtime.
///
/// A single instance is assumed to serve one call at a time, hence `&mut self`.
pub trait InferenceEngine: Send {
    /// Name of the single input the model declares.
    fn input_name(&self) -> &str;

    fn is_ready(&self) -> bool {
        true
    }

    /// Run the model on `tensor` bound to `input_name`.
    ///
    /// The returned outputs are owned; anything the runtime itself holds for
    /// the call is released before this returns.
    fn run(&mut self, input_name: &str, tensor: Tensor)
        -> Result<NamedTensorOutput, DetectionError>;
}

/// Outcome of a readiness bootstrap.
#[derive(Debug, Default)]
pub struct ReadinessOutcome {
    pub success: bool,
    pub error: Option<BoxedError>,
}

impl ReadinessOutcome {
    pub fn ready() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<BoxedError>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Brings an inference runtime to a usable state and hands out engines.
pub trait EngineProvider {
    fn is_ready(&self) -> bool;

    /// Perform whatever setup the runtime needs (loading the model, picking
    /// execution providers). Idempotent once it has succeeded.
    fn ensure_ready(&mut self) -> ReadinessOutcome;

    fn create_engine(&mut self) -> Result<Box<dyn InferenceEngine>, DetectionError>;
}
