//! CLI error types and result alias.

use miette::Diagnostic;
use notekeep_mongodb::NoteError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(notekeep::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(notekeep::config))]
    Config(String),

    /// Could not reach the database
    #[error("Connection error: {0}")]
    #[diagnostic(
        code(notekeep::connection),
        help("check that MongoDB is running and --uri / NOTEKEEP_URI is correct")
    )]
    Connection(String),

    /// Malformed note id
    #[error("Invalid id: {0}")]
    #[diagnostic(code(notekeep::invalid_id), help("note ids are 24 hexadecimal characters"))]
    InvalidId(String),

    /// No note with the given id
    #[error("Not found: {0}")]
    #[diagnostic(code(notekeep::not_found))]
    NotFound(String),

    /// Database operation error
    #[error("Database error: {0}")]
    #[diagnostic(code(notekeep::database))]
    Database(String),

    /// Operation ran past its deadline
    #[error("Timed out: {0}")]
    #[diagnostic(code(notekeep::timeout), help("raise the limit with --timeout"))]
    Timeout(String),

    /// Operation interrupted
    #[error("Interrupted: {0}")]
    #[diagnostic(code(notekeep::cancelled))]
    Cancelled(String),

    /// Command error
    #[error("Command error: {0}")]
    #[diagnostic(code(notekeep::command))]
    Command(String),
}

impl From<NoteError> for CliError {
    fn from(err: NoteError) -> Self {
        let message = err.to_string();
        match err {
            NoteError::Connection(_) => CliError::Connection(message),
            NoteError::Config(_) => CliError::Config(message),
            NoteError::InvalidId { .. } => CliError::InvalidId(message),
            NoteError::NotFound { .. } => CliError::NotFound(message),
            NoteError::Timeout { .. } => CliError::Timeout(message),
            NoteError::Cancelled { .. } => CliError::Cancelled(message),
            NoteError::Write { .. } | NoteError::Query { .. } | NoteError::Mapping { .. } => {
                CliError::Database(message)
            }
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Command(format!("Failed to render JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notekeep_mongodb::{NoteId, Operation};

    #[test]
    fn test_from_note_error() {
        let err: CliError = NoteError::not_found(Operation::FindById, NoteId::new()).into();
        assert!(matches!(err, CliError::NotFound(_)));

        let err: CliError = NoteError::invalid_id("xyz", "bad length").into();
        assert!(matches!(err, CliError::InvalidId(_)));

        let err: CliError = NoteError::cancelled(Operation::FindAll).into();
        assert!(matches!(err, CliError::Cancelled(_)));

        let err: CliError = NoteError::write(Operation::InsertOne, None, "E11000").into();
        assert!(matches!(err, CliError::Database(_)));
        assert!(err.to_string().contains("E11000"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = CliError::Connection("refused".into());
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("notekeep::connection"));
    }
}
