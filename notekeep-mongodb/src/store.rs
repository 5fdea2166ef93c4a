//! The typed note store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::backend::{DocumentStream, MongoBackend, NoteBackend, UpdateOutcome};
use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::document::{datetime_to_bson, decode, encode};
use crate::error::{NoteError, NoteResult, Operation};
use crate::filter::NoteFilter;
use crate::id::{IntoNoteId, NoteId};
use crate::note::{NewNote, Note, NoteField, NoteUpdate};

/// Bound on the cleanup that follows an interrupted `insert_many`.
const DISCARD_TIMEOUT: Duration = Duration::from_secs(10);

/// CRUD access to one collection of notes.
///
/// Cloning is cheap; clones share the backend connection and the write clock.
///
/// # Example
///
/// ```rust,ignore
/// use notekeep_mongodb::{NewNote, NoteStore, OpContext, StoreConfig};
///
/// let ctx = OpContext::background();
/// let config = StoreConfig::new("mongodb://127.0.0.1:27017", "glottery", "notes");
/// let store = NoteStore::connect(&ctx, config).await?;
///
/// let id = store.insert_one(&ctx, NewNote::new("First note", "Some spam text")).await?;
/// let note = store.find_by_id(&ctx, id).await?;
///
/// store.close().await;
/// ```
#[derive(Clone)]
pub struct NoteStore {
    backend: Arc<dyn NoteBackend>,
    clock: Arc<Clock>,
    default_timeout: Option<Duration>,
}

impl NoteStore {
    /// Connect to MongoDB and verify the server answers a ping.
    ///
    /// The configured connect timeout bounds the ping when `ctx` carries no
    /// deadline. The client is shut down again if the ping fails.
    pub async fn connect(ctx: &OpContext, config: StoreConfig) -> NoteResult<Self> {
        let default_timeout = config.operation_timeout;
        let connect_ctx = ctx.or_timeout(config.connect_timeout);

        let backend = MongoBackend::new(config).await?;
        let ping = connect_ctx
            .run(Operation::Connect, async {
                backend
                    .ping()
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::Connect, None, e))
            })
            .await;

        if let Err(err) = ping {
            backend.shutdown().await;
            return Err(match err {
                NoteError::Timeout { message, .. } => {
                    NoteError::connection(format!("server did not answer ping: {}", message))
                }
                other => other,
            });
        }

        info!(
            database = %backend.database_name(),
            collection = %backend.collection_name(),
            "Connected to note store"
        );

        Ok(Self::with_backend(backend).default_timeout(default_timeout))
    }

    /// Build a store over an existing backend.
    pub fn with_backend(backend: impl NoteBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            clock: Arc::new(Clock::new()),
            default_timeout: None,
        }
    }

    /// Deadline applied to operations whose context has none.
    pub fn default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Name of the database.
    pub fn database_name(&self) -> &str {
        self.backend.database_name()
    }

    /// Name of the notes collection.
    pub fn collection_name(&self) -> &str {
        self.backend.collection_name()
    }

    fn context(&self, ctx: &OpContext) -> OpContext {
        ctx.or_timeout(self.default_timeout)
    }

    /// Insert one note, returning its id.
    ///
    /// An id is generated when the note has none. Both timestamps are set to
    /// the same instant.
    pub async fn insert_one(&self, ctx: &OpContext, note: NewNote) -> NoteResult<NoteId> {
        let note = note.stamp(self.clock.now());
        let id = note.id;
        let doc = encode(&note).map_err(|e| e.in_operation(Operation::InsertOne, Some(id)))?;

        self.context(ctx)
            .run(Operation::InsertOne, async {
                self.backend
                    .insert_one(doc)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::InsertOne, Some(id), e))
            })
            .await?;

        debug!(id = %id, "Inserted note");
        Ok(id)
    }

    /// Insert a batch of notes, returning their ids in input order.
    ///
    /// On failure none of the batch remains stored. When the deadline passes
    /// or `ctx` is cancelled mid-batch, whatever reached the backend is
    /// deleted again under a fresh deadline before the error is returned.
    pub async fn insert_many(&self, ctx: &OpContext, notes: Vec<NewNote>) -> NoteResult<Vec<NoteId>> {
        if notes.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let notes: Vec<Note> = notes.into_iter().map(|note| note.stamp(now)).collect();
        let ids: Vec<NoteId> = notes.iter().map(|note| note.id).collect();
        let docs = notes
            .iter()
            .map(encode)
            .collect::<NoteResult<Vec<_>>>()
            .map_err(|e| e.in_operation(Operation::InsertMany, None))?;

        let result = self
            .context(ctx)
            .run(Operation::InsertMany, async {
                self.backend
                    .insert_many(docs)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::InsertMany, None, e))
            })
            .await;

        if let Err(err) = result {
            if err.is_timeout() || err.is_cancelled() {
                self.discard_batch(&ids, now).await;
            }
            return Err(err);
        }

        debug!(count = ids.len(), "Inserted notes");
        Ok(ids)
    }

    /// Delete the notes of an interrupted batch.
    ///
    /// Notes of one batch share their `created_at`, which keeps an older note
    /// that happens to reuse one of the ids out of the cleanup.
    async fn discard_batch(&self, ids: &[NoteId], created_at: DateTime<Utc>) {
        let filter = NoteFilter::all()
            .id_in(ids.iter().copied())
            .field_eq(NoteField::CreatedAt, datetime_to_bson(created_at))
            .into_document();
        let removed = OpContext::background()
            .with_timeout(DISCARD_TIMEOUT)
            .run(Operation::InsertMany, async {
                self.backend
                    .delete_many(filter)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::InsertMany, None, e))
            })
            .await;

        match removed {
            Ok(removed) => debug!(removed, "Discarded interrupted batch"),
            Err(e) => warn!(error = %e, count = ids.len(), "Failed to discard interrupted batch"),
        }
    }

    /// Apply `changes` to the note with `id` and refresh its `updated_at`.
    ///
    /// A missing note is not an error; the outcome reports zero matches.
    pub async fn update_by_id(
        &self,
        ctx: &OpContext,
        id: impl IntoNoteId,
        changes: NoteUpdate,
    ) -> NoteResult<UpdateOutcome> {
        let id = parse_id(id, Operation::UpdateById)?;
        let filter = NoteFilter::by_id(id).into_document();
        let fields = changes.changed_fields();
        let update = changes.to_update_document(self.clock.now());

        let outcome = self
            .context(ctx)
            .run(Operation::UpdateById, async {
                self.backend
                    .update_one(filter, update)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::UpdateById, Some(id), e))
            })
            .await?;

        debug!(
            id = %id,
            fields = ?fields,
            matched = outcome.matched,
            modified = outcome.modified,
            "Updated note"
        );
        Ok(outcome)
    }

    /// Delete the note with `id`, returning how many were removed (0 or 1).
    pub async fn delete_by_id(&self, ctx: &OpContext, id: impl IntoNoteId) -> NoteResult<u64> {
        let id = parse_id(id, Operation::DeleteById)?;
        let filter = NoteFilter::by_id(id).into_document();

        let deleted = self
            .context(ctx)
            .run(Operation::DeleteById, async {
                self.backend
                    .delete_one(filter)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::DeleteById, Some(id), e))
            })
            .await?;

        debug!(id = %id, deleted, "Deleted note");
        Ok(deleted)
    }

    /// Fetch the note with `id`.
    pub async fn find_by_id(&self, ctx: &OpContext, id: impl IntoNoteId) -> NoteResult<Note> {
        let id = parse_id(id, Operation::FindById)?;
        let filter = NoteFilter::by_id(id).into_document();

        let doc = self
            .context(ctx)
            .run(Operation::FindById, async {
                self.backend
                    .find_one(filter)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::FindById, Some(id), e))
            })
            .await?;

        debug!(id = %id, found = doc.is_some(), "Looked up note");
        match doc {
            Some(doc) => decode(doc).map_err(|e| e.in_operation(Operation::FindById, Some(id))),
            None => Err(NoteError::not_found(Operation::FindById, id)),
        }
    }

    /// Start iterating over the notes matching `filter`.
    ///
    /// Notes are fetched lazily as the cursor is advanced. Issue the call
    /// again to start over.
    pub async fn find_all(&self, ctx: &OpContext, filter: NoteFilter) -> NoteResult<NoteCursor> {
        let op_ctx = self.context(ctx);
        let filter = filter.into_document();

        let stream = op_ctx
            .run(Operation::FindAll, async {
                self.backend
                    .find(filter)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::FindAll, None, e))
            })
            .await?;

        debug!(backend = self.backend.name(), "Opened note cursor");
        Ok(NoteCursor {
            stream,
            ctx: ctx.clone(),
            default_timeout: self.default_timeout,
            done: false,
        })
    }

    /// Count the notes matching `filter`.
    pub async fn count(&self, ctx: &OpContext, filter: NoteFilter) -> NoteResult<u64> {
        let filter = filter.into_document();

        let count = self
            .context(ctx)
            .run(Operation::Count, async {
                self.backend
                    .count(filter)
                    .await
                    .map_err(|e| NoteError::from_backend(Operation::Count, None, e))
            })
            .await?;

        debug!(count, "Counted notes");
        Ok(count)
    }

    /// Shut the backend connection down.
    pub async fn close(self) {
        info!(
            backend = self.backend.name(),
            database = %self.backend.database_name(),
            "Closing note store"
        );
        self.backend.shutdown().await;
    }
}

fn parse_id(id: impl IntoNoteId, operation: Operation) -> NoteResult<NoteId> {
    id.into_note_id().map_err(|e| e.in_operation(operation, None))
}

impl fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteStore")
            .field("backend", &self.backend.name())
            .field("database", &self.backend.database_name())
            .field("collection", &self.backend.collection_name())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// A lazy sequence of notes returned by [`NoteStore::find_all`].
///
/// Each step is bounded by the context the cursor was opened with. After an
/// error the cursor yields nothing more.
pub struct NoteCursor {
    stream: DocumentStream,
    ctx: OpContext,
    default_timeout: Option<Duration>,
    done: bool,
}

impl NoteCursor {
    /// Fetch the next note, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<NoteResult<Note>> {
        if self.done {
            return None;
        }

        let ctx = self.ctx.or_timeout(self.default_timeout);
        let stream = &mut self.stream;
        let step = ctx
            .run(Operation::FindAll, async {
                match stream.next().await {
                    None => Ok(None),
                    Some(Ok(doc)) => decode(doc)
                        .map(Some)
                        .map_err(|e| e.in_operation(Operation::FindAll, None)),
                    Some(Err(e)) => Err(NoteError::from_backend(Operation::FindAll, None, e)),
                }
            })
            .await;

        match step {
            Ok(Some(note)) => Some(Ok(note)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }

    /// Drain the cursor into a vector, stopping at the first error.
    pub async fn collect(mut self) -> NoteResult<Vec<Note>> {
        let mut notes = Vec::new();
        while let Some(note) = self.next().await {
            notes.push(note?);
        }
        Ok(notes)
    }

    /// Turn the cursor into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = NoteResult<Note>> + Send {
        futures::stream::unfold(self, |mut cursor| async move {
            let item = cursor.next().await?;
            Some((item, cursor))
        })
    }
}

impl fmt::Debug for NoteCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteCursor")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::Document;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;

    use crate::backend::{BackendResult, MemoryBackend};

    fn store() -> NoteStore {
        NoteStore::with_backend(MemoryBackend::new("glottery", "notes"))
    }

    fn ctx() -> OpContext {
        OpContext::background()
    }

    /// Memory backend that takes its time answering lookups and stalls
    /// halfway through a batch, after the first document is stored.
    struct SlowBackend {
        inner: MemoryBackend,
        delay: Duration,
    }

    #[async_trait]
    impl NoteBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn database_name(&self) -> &str {
            self.inner.database_name()
        }

        fn collection_name(&self) -> &str {
            self.inner.collection_name()
        }

        async fn ping(&self) -> BackendResult<()> {
            self.inner.ping().await
        }

        async fn insert_one(&self, doc: Document) -> BackendResult<()> {
            self.inner.insert_one(doc).await
        }

        async fn insert_many(&self, mut docs: Vec<Document>) -> BackendResult<()> {
            let rest = docs.split_off(docs.len().min(1));
            self.inner.insert_many(docs).await?;
            tokio::time::sleep(self.delay).await;
            self.inner.insert_many(rest).await
        }

        async fn update_one(&self, filter: Document, update: Document) -> BackendResult<UpdateOutcome> {
            self.inner.update_one(filter, update).await
        }

        async fn delete_one(&self, filter: Document) -> BackendResult<u64> {
            self.inner.delete_one(filter).await
        }

        async fn delete_many(&self, filter: Document) -> BackendResult<u64> {
            self.inner.delete_many(filter).await
        }

        async fn find_one(&self, filter: Document) -> BackendResult<Option<Document>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find_one(filter).await
        }

        async fn find(&self, filter: Document) -> BackendResult<DocumentStream> {
            self.inner.find(filter).await
        }

        async fn count(&self, filter: Document) -> BackendResult<u64> {
            tokio::time::sleep(self.delay).await;
            self.inner.count(filter).await
        }

        async fn shutdown(&self) {
            self.inner.shutdown().await
        }
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = store();
        let id = store
            .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
            .await
            .unwrap();

        let note = store.find_by_id(&ctx(), id).await.unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.title, "First note");
        assert_eq!(note.body, "Some spam text");
        assert_eq!(note.created_at, note.updated_at);
    }

    #[tokio::test]
    async fn test_insert_keeps_caller_id() {
        let store = store();
        let id = NoteId::new();
        let returned = store
            .insert_one(&ctx(), NewNote::new("t", "b").with_id(id))
            .await
            .unwrap();
        assert_eq!(returned, id);

        let err = store
            .insert_one(&ctx(), NewNote::new("t", "b").with_id(id))
            .await
            .unwrap_err();
        assert!(err.is_write_error());
        assert_eq!(err.operation(), Some(Operation::InsertOne));
    }

    #[tokio::test]
    async fn test_insert_many_empty_is_noop() {
        let store = store();
        let ids = store.insert_many(&ctx(), Vec::new()).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(store.count(&ctx(), NoteFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_many_in_order() {
        let store = store();
        let ids = store
            .insert_many(
                &ctx(),
                vec![
                    NewNote::new("Second note", "Some spam text"),
                    NewNote::new("Third note", "Some spam text"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let notes = store
            .find_all(&ctx(), NoteFilter::all())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        let found: Vec<NoteId> = notes.iter().map(|n| n.id).collect();
        assert_eq!(found, ids);
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let store = store();
        let id = store
            .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
            .await
            .unwrap();
        let before = store.find_by_id(&ctx(), id).await.unwrap();

        let outcome = store
            .update_by_id(&ctx(), id, NoteUpdate::new().body("Some updated text"))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });

        let after = store.find_by_id(&ctx(), id).await.unwrap();
        assert_eq!(after.body, "Some updated text");
        assert_eq!(after.title, before.title);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_note_is_not_an_error() {
        let store = store();
        let outcome = store
            .update_by_id(&ctx(), NoteId::new(), NoteUpdate::new().title("x"))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
    }

    #[tokio::test]
    async fn test_delete_then_find_is_not_found() {
        let store = store();
        let id = store.insert_one(&ctx(), NewNote::new("t", "b")).await.unwrap();

        assert_eq!(store.delete_by_id(&ctx(), id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(&ctx(), id).await.unwrap(), 0);

        let err = store.find_by_id(&ctx(), id).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Some(Operation::FindById));
    }

    #[tokio::test]
    async fn test_find_by_id_mapping_error_names_note() {
        let backend = MemoryBackend::new("glottery", "notes");
        let oid = bson::oid::ObjectId::new();
        backend
            .insert_one(bson::doc! { "_id": oid, "title": "partial" })
            .await
            .unwrap();
        let store = NoteStore::with_backend(backend);

        let err = store.find_by_id(&ctx(), NoteId::from(oid)).await.unwrap_err();
        assert_eq!(err.operation(), Some(Operation::FindById));
        assert!(err.to_string().contains(&oid.to_hex()), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_not_found() {
        let store = store();
        for op in ["find", "update", "delete"] {
            let err = match op {
                "find" => store.find_by_id(&ctx(), "not-an-id").await.unwrap_err(),
                "update" => store
                    .update_by_id(&ctx(), "not-an-id", NoteUpdate::new().body("x"))
                    .await
                    .unwrap_err(),
                _ => store.delete_by_id(&ctx(), "not-an-id").await.unwrap_err(),
            };
            assert!(err.is_invalid_id(), "{op}: {err}");
            assert!(!err.is_not_found());
            assert!(err.operation().is_some(), "{op}: {err}");
        }
    }

    #[tokio::test]
    async fn test_find_accepts_hex_id() {
        let store = store();
        let id = store.insert_one(&ctx(), NewNote::new("t", "b")).await.unwrap();
        let note = store.find_by_id(&ctx(), id.to_hex()).await.unwrap();
        assert_eq!(note.id, id);
    }

    #[tokio::test]
    async fn test_find_all_with_filter() {
        let store = store();
        store
            .insert_many(
                &ctx(),
                vec![
                    NewNote::new("Groceries", "milk"),
                    NewNote::new("Second note", "Some spam text"),
                    NewNote::new("Third NOTE", "Some spam text"),
                ],
            )
            .await
            .unwrap();

        let filter = NoteFilter::all().title_contains("note");
        let titles: Vec<String> = store
            .find_all(&ctx(), filter.clone())
            .await
            .unwrap()
            .into_stream()
            .map_ok(|note| note.title)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(titles, vec!["Second note", "Third NOTE"]);
        assert_eq!(store.count(&ctx(), filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_all_malformed_filter() {
        let store = store();
        let err = store
            .find_all(&ctx(), NoteFilter::raw(bson::doc! { "title": { "$bogus": 1 } }))
            .await
            .unwrap_err();
        assert!(err.is_query_error());
    }

    #[tokio::test]
    async fn test_cursor_stops_after_mapping_error() {
        let backend = MemoryBackend::new("glottery", "notes");
        backend
            .insert_one(bson::doc! { "_id": bson::oid::ObjectId::new(), "title": "partial" })
            .await
            .unwrap();
        let store = NoteStore::with_backend(backend);

        let mut cursor = store.find_all(&ctx(), NoteFilter::all()).await.unwrap();
        let err = match cursor.next().await {
            Some(Err(err)) => err,
            other => panic!("expected a mapping error, got {other:?}"),
        };
        assert!(matches!(err, NoteError::Mapping { id: Some(_), .. }));
        assert_eq!(err.operation(), Some(Operation::FindAll));
        assert!(cursor.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies() {
        let store = NoteStore::with_backend(SlowBackend {
            inner: MemoryBackend::new("glottery", "notes"),
            delay: Duration::from_secs(5),
        })
        .default_timeout(Some(Duration::from_millis(100)));

        let err = store.find_by_id(&ctx(), NoteId::new()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.operation(), Some(Operation::FindById));

        let ctx = OpContext::background().with_timeout(Duration::from_secs(10));
        assert_eq!(store.count(&ctx, NoteFilter::all()).await.unwrap(), 0);
    }

    fn slow_store(delay: Duration) -> NoteStore {
        NoteStore::with_backend(SlowBackend {
            inner: MemoryBackend::new("glottery", "notes"),
            delay,
        })
    }

    fn batch() -> Vec<NewNote> {
        vec![
            NewNote::new("Second note", "Some spam text"),
            NewNote::new("Third note", "Some spam text"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_many_timeout_leaves_nothing() {
        let store = slow_store(Duration::from_secs(60));
        let ctx = OpContext::background().with_timeout(Duration::from_millis(100));

        let err = store.insert_many(&ctx, batch()).await.unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert_eq!(err.operation(), Some(Operation::InsertMany));
        assert_eq!(store.count(&OpContext::background(), NoteFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_many_cancel_leaves_nothing() {
        let store = slow_store(Duration::from_secs(60));
        let token = tokio_util::sync::CancellationToken::new();
        let ctx = OpContext::background().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = store.insert_many(&ctx, batch()).await.unwrap_err();
        canceller.await.unwrap();
        assert!(err.is_cancelled(), "{err}");
        assert_eq!(store.count(&OpContext::background(), NoteFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_many_keeps_older_notes_on_timeout() {
        let store = slow_store(Duration::from_secs(60));
        let kept = store
            .insert_one(&ctx(), NewNote::new("First note", "Some spam text"))
            .await
            .unwrap();

        // The second note reuses the stored id; the first lands before the stall.
        let ctx = OpContext::background().with_timeout(Duration::from_millis(100));
        let notes = vec![
            NewNote::new("Second note", "Some spam text"),
            NewNote::new("Copy", "Some spam text").with_id(kept),
        ];
        let err = store.insert_many(&ctx, notes).await.unwrap_err();
        assert!(err.is_timeout(), "{err}");

        let notes = store
            .find_all(&OpContext::background(), NoteFilter::all())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        let ids: Vec<NoteId> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![kept]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_default_timeout_means_no_deadline() {
        let store = store().default_timeout(Some(Duration::from_secs(u64::MAX)));
        assert_eq!(store.count(&ctx(), NoteFilter::all()).await.unwrap(), 0);

        let store = store.default_timeout(Some(Duration::MAX));
        let id = store.insert_one(&ctx(), NewNote::new("t", "b")).await.unwrap();
        assert_eq!(store.find_by_id(&ctx(), id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let store = store();
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let ctx = OpContext::background().with_cancellation(token);

        let err = store.insert_one(&ctx, NewNote::new("t", "b")).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(store.count(&OpContext::background(), NoteFilter::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_shuts_backend_down() {
        let store = store();
        let clone = store.clone();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.database_name(), "glottery");
        assert_eq!(store.collection_name(), "notes");
        store.close().await;

        let err = clone.count(&ctx(), NoteFilter::all()).await.unwrap_err();
        assert!(err.is_query_error());
    }
}
