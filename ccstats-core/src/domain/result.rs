//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date '{input}': {source}")]
    DateParse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid amount: {0}")]
    Amount(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Malformed statement file: {0}")]
    Format(String),

    #[error("Unreadable statement: {0}")]
    Statement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a decryption error
    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::Decryption(msg.into())
    }

    /// Create a malformed store document error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an unreadable statement error
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// True when the failure came from a wrong password or a tampered block
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }

    /// Short label for the variant; carries no statement contents
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DateParse { .. } => "date_parse",
            Self::Amount(_) => "amount",
            Self::Encryption(_) => "encryption",
            Self::Decryption(_) => "decryption",
            Self::Format(_) => "format",
            Self::Statement(_) => "statement",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::validation("key length must be a power of two");
        assert!(err.to_string().starts_with("Validation error"));

        let err = Error::decryption("bad padding");
        assert!(err.is_decryption());
        assert_eq!(err.to_string(), "Decryption failed: bad padding");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_decryption());
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_category_hides_contents() {
        let err = Error::Amount("$1,234.56".to_string());
        assert_eq!(err.category(), "amount");
        assert!(!err.category().contains("1,234"));
    }
}
