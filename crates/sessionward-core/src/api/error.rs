use serde_json::Value;
use thiserror::Error;

/// Failure propagated to the caller of a pipeline request.
///
/// By the time a caller sees one of these, the matching notification (and,
/// for `Unauthorized`, the redirect) has already been emitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Server unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Application(String),
}

/// Classification of one completed request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Success(Value),
    ApplicationError(String),
    Unauthorized(String),
    NetworkUnreachable,
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success(_))
    }

    /// Unwrap the payload or turn the failure into an [`ApiError`]
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            ResponseOutcome::Success(payload) => Ok(payload),
            ResponseOutcome::ApplicationError(message) => Err(ApiError::Application(message)),
            ResponseOutcome::Unauthorized(message) => Err(ApiError::Unauthorized(message)),
            ResponseOutcome::NetworkUnreachable => Err(ApiError::NetworkUnreachable(
                "no response received".to_string(),
            )),
        }
    }
}
