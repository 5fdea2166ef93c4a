//! In-process backend.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use futures::StreamExt;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::matcher::Predicate;
use super::{BackendError, BackendResult, DocumentStream, NoteBackend, UpdateOutcome};

/// A collection held in memory, in insertion order.
///
/// Follows the server's semantics for the operations notes use: `_id` is a
/// unique key, `find` returns documents in insertion order, and updates only
/// support `$set`. Handy for tests and for running without a server.
pub struct MemoryBackend {
    database: String,
    collection: String,
    docs: RwLock<IndexMap<ObjectId, Document>>,
    closed: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty collection.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            docs: RwLock::new(IndexMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Check whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn ensure_open(&self) -> BackendResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BackendError::connectivity("backend has been shut down"));
        }
        Ok(())
    }

    fn key_of(doc: &Document) -> BackendResult<ObjectId> {
        match doc.get("_id") {
            Some(Bson::ObjectId(oid)) => Ok(*oid),
            Some(_) => Err(BackendError::other("_id must be an ObjectId")),
            None => Err(BackendError::other("document has no _id")),
        }
    }

    fn duplicate(&self, oid: &ObjectId) -> BackendError {
        BackendError::duplicate_key(format!(
            "E11000 duplicate key error collection: {}.{} index: _id_ dup key: {{ _id: ObjectId('{}') }}",
            self.database,
            self.collection,
            oid.to_hex()
        ))
    }
}

fn apply_update(doc: &mut Document, update: &Document) -> BackendResult<bool> {
    let mut changed = false;
    for (operator, fields) in update {
        let fields = match (operator.as_str(), fields) {
            ("$set", Bson::Document(fields)) => fields,
            ("$set", _) => return Err(BackendError::invalid_filter("$set needs a document")),
            (other, _) => {
                return Err(BackendError::invalid_filter(format!(
                    "unsupported update operator: {}",
                    other
                )));
            }
        };

        for (key, value) in fields {
            if key == "_id" {
                return Err(BackendError::other("the _id field cannot be modified"));
            }
            if doc.get(key) != Some(value) {
                doc.insert(key.clone(), value.clone());
                changed = true;
            }
        }
    }
    Ok(changed)
}

#[async_trait]
impl NoteBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn ping(&self) -> BackendResult<()> {
        self.ensure_open()
    }

    async fn insert_one(&self, doc: Document) -> BackendResult<()> {
        self.ensure_open()?;
        let oid = Self::key_of(&doc)?;

        let mut docs = self.docs.write();
        if docs.contains_key(&oid) {
            return Err(self.duplicate(&oid));
        }
        docs.insert(oid, doc);
        Ok(())
    }

    async fn insert_many(&self, batch: Vec<Document>) -> BackendResult<()> {
        self.ensure_open()?;

        let mut docs = self.docs.write();
        let mut keys = Vec::with_capacity(batch.len());
        for doc in &batch {
            let oid = Self::key_of(doc)?;
            if docs.contains_key(&oid) || keys.contains(&oid) {
                return Err(self.duplicate(&oid));
            }
            keys.push(oid);
        }

        for (oid, doc) in keys.into_iter().zip(batch) {
            docs.insert(oid, doc);
        }
        Ok(())
    }

    async fn update_one(&self, filter: Document, update: Document) -> BackendResult<UpdateOutcome> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let mut docs = self.docs.write();
        let Some(doc) = docs.values_mut().find(|doc| predicate.matches(doc)) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = doc.clone();
        let changed = apply_update(&mut updated, &update)?;
        *doc = updated;

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(changed),
        })
    }

    async fn delete_one(&self, filter: Document) -> BackendResult<u64> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let mut docs = self.docs.write();
        let position = docs.values().position(|doc| predicate.matches(doc));
        match position {
            Some(index) => {
                docs.shift_remove_index(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: Document) -> BackendResult<u64> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|_, doc| !predicate.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn find_one(&self, filter: Document) -> BackendResult<Option<Document>> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let docs = self.docs.read();
        Ok(docs.values().find(|doc| predicate.matches(doc)).cloned())
    }

    async fn find(&self, filter: Document) -> BackendResult<DocumentStream> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let matching: Vec<Document> = self
            .docs
            .read()
            .values()
            .filter(|doc| predicate.matches(doc))
            .cloned()
            .collect();

        debug!(count = matching.len(), "Memory find snapshot taken");
        Ok(futures::stream::iter(matching.into_iter().map(Ok)).boxed())
    }

    async fn count(&self, filter: Document) -> BackendResult<u64> {
        self.ensure_open()?;
        let predicate = Predicate::compile(&filter)?;

        let docs = self.docs.read();
        Ok(docs.values().filter(|doc| predicate.matches(doc)).count() as u64)
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
