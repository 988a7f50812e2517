//! Error types for photometric parsing, evaluation and layout search.

/// Result type for lighting operations
pub type LightingResult<T> = Result<T, LightingError>;

/// Error type for lighting operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LightingError {
    /// Malformed or truncated IES LM-63 input.
    #[error("Format error: {0}")]
    FormatError(String),

    /// Invalid design inputs (target, area, fixtures).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LightingError {
    pub(crate) fn format_at(line: usize, message: impl std::fmt::Display) -> Self {
        LightingError::FormatError(format!("line {}: {}", line, message))
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        LightingError::ConfigurationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_carries_line() {
        let err = LightingError::format_at(12, "expected 10 vertical angles, found 7");
        assert_eq!(
            err.to_string(),
            "Format error: line 12: expected 10 vertical angles, found 7"
        );
    }

    #[test]
    fn test_configuration_error_display() {
        let err = LightingError::configuration("target PPFD must be positive");
        assert!(matches!(err, LightingError::ConfigurationError(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: target PPFD must be positive"
        );
    }
}
