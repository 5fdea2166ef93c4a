//! Error types for note store operations.

use std::fmt;

use thiserror::Error;

use crate::backend::{BackendError, BackendErrorKind};
use crate::id::NoteId;

/// Result type for note store operations.
pub type NoteResult<T> = Result<T, NoteError>;

/// The store operation an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Establishing the connection.
    Connect,
    /// Inserting a single note.
    InsertOne,
    /// Inserting a batch of notes.
    InsertMany,
    /// Updating a note by id.
    UpdateById,
    /// Deleting a note by id.
    DeleteById,
    /// Looking up a note by id.
    FindById,
    /// Iterating over matching notes.
    FindAll,
    /// Counting matching notes.
    Count,
}

impl Operation {
    /// Get the operation name as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::InsertOne => "insert_one",
            Self::InsertMany => "insert_many",
            Self::UpdateById => "update_by_id",
            Self::DeleteById => "delete_by_id",
            Self::FindById => "find_by_id",
            Self::FindAll => "find_all",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during note store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoteError {
    /// The store could not be reached, or the URI is malformed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The identifier string is not a valid object id.
    #[error("{}invalid note id '{value}': {reason}", describe_operation(.operation))]
    InvalidId {
        /// The operation the id was passed to, once known.
        operation: Option<Operation>,
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No note matches the identifier.
    #[error("{operation}: note not found: {id}")]
    NotFound {
        /// The lookup that came back empty.
        operation: Operation,
        /// The identifier that was looked up.
        id: NoteId,
    },

    /// An insert, update, or delete failed.
    #[error("{operation} failed{}: {message}", describe_id(.id))]
    Write {
        /// The failing operation.
        operation: Operation,
        /// The note the write targeted, when known.
        id: Option<NoteId>,
        /// The underlying cause.
        message: String,
    },

    /// A read failed or the filter was rejected.
    #[error("{operation} failed: {message}")]
    Query {
        /// The failing operation.
        operation: Operation,
        /// The underlying cause.
        message: String,
    },

    /// A stored document could not be mapped to a note.
    #[error("{}mapping error{}: {message}", describe_operation(.operation), describe_id(.id))]
    Mapping {
        /// The operation that read or wrote the document, once known.
        operation: Option<Operation>,
        /// The note the document belongs to, when known.
        id: Option<NoteId>,
        /// What did not map.
        message: String,
    },

    /// The deadline passed before the operation completed.
    #[error("{operation} timed out: {message}")]
    Timeout {
        /// The operation that timed out.
        operation: Operation,
        /// Details from the deadline or the driver.
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("{operation} was cancelled")]
    Cancelled {
        /// The cancelled operation.
        operation: Operation,
    },
}

fn describe_operation(operation: &Option<Operation>) -> String {
    match operation {
        Some(operation) => format!("{}: ", operation),
        None => String::new(),
    }
}

fn describe_id(id: &Option<NoteId>) -> String {
    match id {
        Some(id) => format!(" for note {}", id),
        None => String::new(),
    }
}

impl NoteError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid id error.
    pub fn invalid_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            operation: None,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(operation: Operation, id: NoteId) -> Self {
        Self::NotFound { operation, id }
    }

    /// Create a write error.
    pub fn write(operation: Operation, id: Option<NoteId>, message: impl Into<String>) -> Self {
        Self::Write {
            operation,
            id,
            message: message.into(),
        }
    }

    /// Create a query error.
    pub fn query(operation: Operation, message: impl Into<String>) -> Self {
        Self::Query {
            operation,
            message: message.into(),
        }
    }

    /// Create a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            operation: None,
            id: None,
            message: message.into(),
        }
    }

    /// Attach the note a mapping error belongs to, unless it already names one.
    pub(crate) fn for_note(self, note: Option<NoteId>) -> Self {
        match self {
            Self::Mapping {
                operation,
                id: None,
                message,
            } => Self::Mapping {
                operation,
                id: note,
                message,
            },
            other => other,
        }
    }

    /// Tag an error raised outside a round trip with the operation it
    /// happened in, and the note involved when known.
    pub(crate) fn in_operation(self, operation: Operation, note: Option<NoteId>) -> Self {
        match self {
            Self::Mapping {
                operation: None,
                id,
                message,
            } => Self::Mapping {
                operation: Some(operation),
                id: id.or(note),
                message,
            },
            Self::InvalidId {
                operation: None,
                value,
                reason,
            } => Self::InvalidId {
                operation: Some(operation),
                value,
                reason,
            },
            other => other,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: Operation, message: impl Into<String>) -> Self {
        Self::Timeout {
            operation,
            message: message.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(operation: Operation) -> Self {
        Self::Cancelled { operation }
    }

    /// Turn a backend failure into a typed error for `operation`.
    ///
    /// Connect failures always surface as connection errors; reads surface as
    /// query errors and writes as write errors, except for driver timeouts.
    pub(crate) fn from_backend(operation: Operation, id: Option<NoteId>, err: BackendError) -> Self {
        if err.kind == BackendErrorKind::Timeout {
            return Self::timeout(operation, err.to_string());
        }

        match operation {
            Operation::Connect => Self::connection(err.to_string()),
            Operation::FindById | Operation::FindAll | Operation::Count => {
                Self::query(operation, err.to_string())
            }
            Operation::InsertOne
            | Operation::InsertMany
            | Operation::UpdateById
            | Operation::DeleteById => Self::write(operation, id, err.to_string()),
        }
    }

    /// The operation this error came from, if it is tied to one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Write { operation, .. }
            | Self::Query { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Cancelled { operation }
            | Self::NotFound { operation, .. } => Some(*operation),
            Self::Mapping { operation, .. } | Self::InvalidId { operation, .. } => *operation,
            Self::Connection(_) => Some(Operation::Connect),
            Self::Config(_) => None,
        }
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is an invalid id error.
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a write error.
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Check if this is a query error.
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a cancellation error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
