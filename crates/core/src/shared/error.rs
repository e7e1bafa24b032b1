use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error from an external collaborator (inference engine, bootstrap).
pub type BoxedError = Box<dyn StdError + Send + Sync>;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("resource unavailable: {reason}")]
    UnavailableResource {
        reason: String,
        #[source]
        source: Option<BoxedError>,
    },
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),
    #[error("inference failed: {0}")]
    Inference(#[source] BoxedError),
}

impl DetectionError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unavailable(reason: impl Into<String>, source: Option<BoxedError>) -> Self {
        Self::UnavailableResource {
            reason: reason.into(),
            source,
        }
    }

    pub fn inference<E>(err: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Inference(err.into())
    }
}
