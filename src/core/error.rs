use serde::Serialize;
use thiserror::Error;

use crate::eric::{EricError, ServerErrorMessage};

/// Errors that can occur while building, dispatching or reading an ELSTER submission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ElsterError {
    /// The native ERiC library reported a failure.
    #[error(transparent)]
    Eric(#[from] EricError),

    /// Caller supplied XML or a procedure that cannot be dispatched.
    /// Raised before any native call happens.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A response or result document could not be parsed.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Field data does not fit the field tree it is encoded against.
    #[error("encoding error: {0}")]
    Encode(String),

    /// One or more input validation rules failed.
    #[error("input validation failed: {}", join_problems(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The Bundesfinanzamt number is unknown or not accepted in this environment.
    #[error("the BuFa number '{0}' is invalid")]
    InvalidBufaNumber(String),

    /// Settings could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

fn join_problems(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ElsterError {
    /// Public error code reported to callers.
    pub fn error_code(&self) -> i32 {
        match self {
            Self::Eric(e) => e.error_code(),
            Self::InvalidBufaNumber(_) => 12,
            _ => -1,
        }
    }

    /// Replace a raw ERiC process failure with its specific variant.
    pub fn classified(self) -> Self {
        match self {
            Self::Eric(e) => Self::Eric(e.classify()),
            other => other,
        }
    }

    /// JSON envelope describing this error to the caller.
    pub fn to_error_response(&self, include_responses: bool) -> ErrorResponse {
        match self {
            Self::Eric(e) => e.to_error_response(include_responses),
            Self::InvalidBufaNumber(_) => ErrorResponse::new(self.error_code(), "INVALID_BUFA_NUMBER"),
            other => ErrorResponse::new(other.error_code(), other.to_string()),
        }
    }
}

/// A single validation error with field name and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending input field (e.g. "steuernummer").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error representation handed to callers outside the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_problems: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_err_msg: Option<ServerErrorMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eric_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_response: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            validation_problems: None,
            server_err_msg: None,
            eric_response: None,
            server_response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_lists_every_problem() {
        let err = ElsterError::InvalidInput(vec![
            ValidationError::new("steuernummer", "must be 10 or 11 numbers long"),
            ValidationError::new("bufa_nr", "must be 4 numbers long for new admission"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("steuernummer: must be 10 or 11 numbers long"));
        assert!(msg.contains("bufa_nr: must be 4 numbers long"));
    }

    #[test]
    fn invalid_bufa_has_its_own_code() {
        let err = ElsterError::InvalidBufaNumber("0000".into());
        assert_eq!(err.error_code(), 12);
        let response = err.to_error_response(false);
        assert_eq!(response.message, "INVALID_BUFA_NUMBER");
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("validation_problems").is_none());
    }
}
