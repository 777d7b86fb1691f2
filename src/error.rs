use std::fmt;

use serde::Serialize;
use ts_rs::TS;

use crate::expression::error::{CompileError, CompileErrorKind};

/// Structured error type for the crate. The serialized form carries a stable
/// `code` so a host application can match on it.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum StyleError {
    /// A required constructor argument is absent or unusable.
    InvalidArgument { message: String },
    /// An accessor was called against the wrong backing.
    UnsupportedState { message: String },
    /// An expression array does not start with an operator name.
    MalformedExpression { path: String, message: String },
    /// An expression element has a kind the compiler cannot translate.
    UnsupportedConversion { path: String, found: String },
    /// Expression nesting exceeds the configured limit.
    DepthLimitExceeded { path: String, limit: usize },
    SerializationError { message: String },
    IoError { message: String },
}

impl StyleError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StyleError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unsupported_state(message: impl Into<String>) -> Self {
        StyleError::UnsupportedState {
            message: message.into(),
        }
    }
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::InvalidArgument { message } => write!(f, "Invalid argument: {message}"),
            StyleError::UnsupportedState { message } => write!(f, "Unsupported state: {message}"),
            StyleError::MalformedExpression { path, message } => {
                write!(f, "Malformed expression at {path}: {message}")
            }
            StyleError::UnsupportedConversion { path, found } => {
                write!(f, "Unsupported conversion at {path}: cannot convert {found}")
            }
            StyleError::DepthLimitExceeded { path, limit } => {
                write!(f, "Expression at {path} exceeds the nesting limit of {limit}")
            }
            StyleError::SerializationError { message } => {
                write!(f, "Serialization error: {message}")
            }
            StyleError::IoError { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for StyleError {}

impl From<CompileError> for StyleError {
    fn from(e: CompileError) -> Self {
        let path = e.path.to_string();
        match e.kind {
            CompileErrorKind::Malformed => StyleError::MalformedExpression {
                path,
                message: e.message,
            },
            CompileErrorKind::UnsupportedConversion => StyleError::UnsupportedConversion {
                path,
                found: e.message,
            },
            CompileErrorKind::DepthLimit { limit } => StyleError::DepthLimitExceeded { path, limit },
        }
    }
}

impl From<std::io::Error> for StyleError {
    fn from(e: std::io::Error) -> Self {
        StyleError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StyleError {
    fn from(e: serde_json::Error) -> Self {
        StyleError::SerializationError {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expression::error::ExpressionPath;

    #[test]
    fn serializes_with_code_tag() {
        let err = StyleError::invalid_argument("stops are required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "InvalidArgument");
        assert_eq!(json["detail"]["message"], "stops are required");
    }

    #[test]
    fn compile_error_maps_to_flat_variant() {
        let mut path = ExpressionPath::root();
        path.push(2);
        let err: StyleError = CompileError::unsupported("null", path).into();
        assert_eq!(
            err,
            StyleError::UnsupportedConversion {
                path: "[2]".to_string(),
                found: "null".to_string(),
            }
        );
        assert_eq!(err.to_string(), "Unsupported conversion at [2]: cannot convert null");
    }

    #[test]
    fn io_error_keeps_its_own_code() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = StyleError::from(io);
        assert_eq!(
            err,
            StyleError::IoError {
                message: "read-only".to_string(),
            }
        );
        assert_eq!(err.to_string(), "I/O error: read-only");
        assert_eq!(serde_json::to_value(&err).unwrap()["code"], "IoError");
    }
}
