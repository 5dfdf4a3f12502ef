//! Structured error types for the YARA diversity engine.

use thiserror::Error;

/// Unified error type for all engine operations.
///
/// Every error is scoped to the call that produced it; no shared state is
/// touched on the way out, so a later independent call is unaffected.
#[derive(Debug, Error)]
pub enum YaraError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required file, column, or sample was not found.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Parse failure, non-numeric data in a numeric column, or inconsistent
    /// matrix dimensions.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Too few observations for the requested computation.
    #[error("insufficient samples: {0}")]
    InsufficientSamples(String),

    /// A numeric routine failed to converge or produced an undefined result.
    #[error("computation failed: {0}")]
    Computation(String),
}

/// Coarse error category, for hosts that branch on the kind of failure
/// rather than on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    MissingData,
    MalformedInput,
    InsufficientSample,
    Computation,
}

impl YaraError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::MissingData(_) => ErrorKind::MissingData,
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::InsufficientSamples(_) => ErrorKind::InsufficientSample,
            Self::Computation(_) => ErrorKind::Computation,
        }
    }

    /// Whether the host can reasonably retry with different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingData | ErrorKind::InsufficientSample
        )
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, YaraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            YaraError::MissingData("x".into()).kind(),
            ErrorKind::MissingData
        );
        assert_eq!(
            YaraError::Computation("x".into()).kind(),
            ErrorKind::Computation
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(YaraError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn display_includes_context() {
        let err = YaraError::MalformedInput("row 3, column 'shannon'".into());
        assert_eq!(err.to_string(), "malformed input: row 3, column 'shannon'");
    }

    #[test]
    fn recoverable_kinds() {
        assert!(YaraError::MissingData("a".into()).is_recoverable());
        assert!(YaraError::InsufficientSamples("a".into()).is_recoverable());
        assert!(!YaraError::MalformedInput("a".into()).is_recoverable());
    }
}
