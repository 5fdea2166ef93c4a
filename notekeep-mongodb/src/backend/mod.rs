//! Storage backends.
//!
//! A backend performs raw document round trips against one collection. The
//! store owns everything typed (ids, mapping, timestamps, error context) and
//! only hands backends BSON documents.

mod matcher;
mod memory;
mod mongo;

use std::fmt;

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use thiserror::Error;

pub use memory::MemoryBackend;
pub use mongo::MongoBackend;

/// Result type for backend round trips.
pub type BackendResult<T> = Result<T, BackendError>;

/// A lazily fetched sequence of documents.
pub type DocumentStream = BoxStream<'static, BackendResult<Document>>;

/// Broad classes of backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// The server could not be reached or the link dropped.
    Connectivity,
    /// A document with the same `_id` already exists.
    DuplicateKey,
    /// The filter or update document was rejected.
    InvalidFilter,
    /// The driver gave up waiting on the server.
    Timeout,
    /// Anything else.
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connectivity => "connectivity",
            Self::DuplicateKey => "duplicate key",
            Self::InvalidFilter => "invalid filter",
            Self::Timeout => "timeout",
            Self::Other => "backend error",
        };
        f.write_str(s)
    }
}

/// A failed backend round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BackendError {
    /// What went wrong, broadly.
    pub kind: BackendErrorKind,
    /// Details from the driver or backend.
    pub message: String,
}

impl BackendError {
    /// Create a backend error.
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connectivity, message)
    }

    /// Create a duplicate key error.
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::DuplicateKey, message)
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InvalidFilter, message)
    }

    /// Create an uncategorised error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }
}

/// Outcome of an update round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
}

/// Raw document access to a single collection.
///
/// Implementations must be safe to share between tasks; the store does no
/// locking of its own.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Name of the database the collection lives in.
    fn database_name(&self) -> &str;

    /// Name of the collection.
    fn collection_name(&self) -> &str;

    /// Round trip to check the server is reachable.
    async fn ping(&self) -> BackendResult<()>;

    /// Insert one document.
    async fn insert_one(&self, doc: Document) -> BackendResult<()>;

    /// Insert a batch in order.
    ///
    /// All or nothing: when an error is returned, none of the batch may remain
    /// visible in the collection.
    async fn insert_many(&self, docs: Vec<Document>) -> BackendResult<()>;

    /// Apply `update` to the first document matching `filter`.
    async fn update_one(&self, filter: Document, update: Document) -> BackendResult<UpdateOutcome>;

    /// Delete the first document matching `filter`, returning the count removed.
    async fn delete_one(&self, filter: Document) -> BackendResult<u64>;

    /// Delete every document matching `filter`, returning the count removed.
    async fn delete_many(&self, filter: Document) -> BackendResult<u64>;

    /// Fetch the first document matching `filter`.
    async fn find_one(&self, filter: Document) -> BackendResult<Option<Document>>;

    /// Stream every document matching `filter`.
    async fn find(&self, filter: Document) -> BackendResult<DocumentStream>;

    /// Count documents matching `filter`.
    async fn count(&self, filter: Document) -> BackendResult<u64>;

    /// Release the connection. Further round trips fail.
    async fn shutdown(&self);
}
