//! MongoDB backend with built-in connection pooling.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::InsertManyOptions;
use mongodb::{Client, Collection, Database};
use tracing::{debug, info, warn};

use super::{BackendError, BackendErrorKind, BackendResult, DocumentStream, NoteBackend, UpdateOutcome};
use crate::config::StoreConfig;
use crate::error::{NoteError, NoteResult};

/// Server error code for a duplicate key.
const DUPLICATE_KEY: i32 = 11000;
/// Server error code for a malformed argument.
const BAD_VALUE: i32 = 2;
/// Server error code for an unparseable query.
const FAILED_TO_PARSE: i32 = 9;

/// A MongoDB collection backend.
///
/// The MongoDB driver handles connection pooling internally, so this wraps
/// the driver's `Client` together with the one collection notes live in.
/// Cloning is cheap and clones share the pool.
#[derive(Clone)]
pub struct MongoBackend {
    client: Client,
    database: Database,
    collection: Collection<Document>,
}

impl MongoBackend {
    /// Create a backend from configuration.
    ///
    /// The driver connects lazily; nothing is sent to the server until the
    /// first round trip.
    pub async fn new(config: StoreConfig) -> NoteResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| NoteError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);
        let collection = database.collection::<Document>(&config.collection);

        info!(
            uri = %config.redacted_uri(),
            database = %config.database,
            collection = %config.collection,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            collection,
        })
    }

    /// Remove documents from a failed batch that the server did commit.
    async fn roll_back(&self, ids: &[Bson]) {
        if ids.is_empty() {
            return;
        }

        debug!(count = ids.len(), "Rolling back partially inserted batch");
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        if let Err(e) = self.delete_many(filter).await {
            warn!(error = %e, count = ids.len(), "Failed to roll back partial insert_many");
        }
    }
}

/// Sort a driver error into a backend error kind.
fn classify(err: &mongodb::error::Error) -> BackendErrorKind {
    match err.kind.as_ref() {
        ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => BackendErrorKind::Timeout,
        ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::DnsResolve { .. } => BackendErrorKind::Connectivity,
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY => {
            BackendErrorKind::DuplicateKey
        }
        ErrorKind::BulkWrite(failure)
            if failure
                .write_errors
                .iter()
                .flatten()
                .any(|e| e.code == DUPLICATE_KEY) =>
        {
            BackendErrorKind::DuplicateKey
        }
        ErrorKind::Command(e) if e.code == BAD_VALUE || e.code == FAILED_TO_PARSE => {
            BackendErrorKind::InvalidFilter
        }
        ErrorKind::InvalidArgument { .. } => BackendErrorKind::InvalidFilter,
        _ => BackendErrorKind::Other,
    }
}

impl From<mongodb::error::Error> for BackendError {
    fn from(err: mongodb::error::Error) -> Self {
        BackendError::new(classify(&err), err.to_string())
    }
}

/// How many documents of an ordered batch of `total` the server committed
/// before `err`. Ordered inserts stop at the first failing index.
fn committed_prefix(err: &mongodb::error::Error, total: usize) -> usize {
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .iter()
            .flatten()
            .map(|e| e.index)
            .min()
            .unwrap_or(total),
        _ => total,
    }
}

#[async_trait]
impl NoteBackend for MongoBackend {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    fn database_name(&self) -> &str {
        self.database.name()
    }

    fn collection_name(&self) -> &str {
        self.collection.name()
    }

    async fn ping(&self) -> BackendResult<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn insert_one(&self, doc: Document) -> BackendResult<()> {
        self.collection.insert_one(doc, None).await?;
        Ok(())
    }

    async fn insert_many(&self, docs: Vec<Document>) -> BackendResult<()> {
        let ids: Vec<Bson> = docs
            .iter()
            .filter_map(|doc| doc.get("_id").cloned())
            .collect();

        let options = InsertManyOptions::builder().ordered(true).build();
        match self.collection.insert_many(docs, options).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let committed = committed_prefix(&e, ids.len()).min(ids.len());
                self.roll_back(&ids[..committed]).await;
                Err(e.into())
            }
        }
    }

    async fn update_one(&self, filter: Document, update: Document) -> BackendResult<UpdateOutcome> {
        let result = self.collection.update_one(filter, update, None).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, filter: Document) -> BackendResult<u64> {
        let result = self.collection.delete_one(filter, None).await?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, filter: Document) -> BackendResult<u64> {
        let result = self.collection.delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }

    async fn find_one(&self, filter: Document) -> BackendResult<Option<Document>> {
        let doc = self.collection.find_one(filter, None).await?;
        Ok(doc)
    }

    async fn find(&self, filter: Document) -> BackendResult<DocumentStream> {
        let cursor = self.collection.find(filter, None).await?;
        Ok(cursor.map_err(BackendError::from).boxed())
    }

    async fn count(&self, filter: Document) -> BackendResult<u64> {
        let count = self.collection.count_documents(filter, None).await?;
        Ok(count)
    }

    async fn shutdown(&self) {
        info!(database = %self.database.name(), "Shutting down MongoDB client");
        self.client.clone().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    // Bulk write failures cannot be built outside the driver. Rollback of a
    // partially committed batch is covered by `test_properties_live`.

    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_new_is_lazy() {
        // No server is needed until the first round trip.
        let config = StoreConfig::new("mongodb://127.0.0.1:1", "glottery", "notes");
        let backend = MongoBackend::new(config).await.unwrap();
        assert_eq!(backend.database_name(), "glottery");
        assert_eq!(backend.collection_name(), "notes");
        assert_eq!(backend.name(), "mongodb");
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_uri() {
        let config = StoreConfig::new("postgres://localhost", "glottery", "notes");
        let err = match MongoBackend::new(config).await {
            Ok(_) => panic!("malformed URI accepted"),
            Err(err) => err,
        };
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_classify_io_errors() {
        let timed_out = mongodb::error::Error::from(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(classify(&timed_out), BackendErrorKind::Timeout);

        let refused = mongodb::error::Error::from(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(classify(&refused), BackendErrorKind::Connectivity);

        let err = BackendError::from(refused);
        assert_eq!(err.kind, BackendErrorKind::Connectivity);
    }

    #[test]
    fn test_classify_unknown_is_other() {
        let err = mongodb::error::Error::custom("something odd");
        assert_eq!(classify(&err), BackendErrorKind::Other);
    }

    #[test]
    fn test_committed_prefix_without_write_errors() {
        // Anything other than a bulk write failure may have committed the
        // whole batch.
        let err = mongodb::error::Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(committed_prefix(&err, 3), 3);
        assert_eq!(committed_prefix(&err, 0), 0);
    }
}
