//! # notekeep-mongodb
//!
//! Typed access to a single MongoDB collection of notes.
//!
//! This crate provides:
//! - A `NoteStore` with insert, update, delete and lookup by id
//! - Lazy cursors over filtered notes
//! - An explicit mapping between `Note` and its stored BSON document
//! - Per-operation deadlines and cancellation via `OpContext`
//! - A MongoDB backend and an in-memory backend sharing one interface
//!
//! ## Example
//!
//! ```rust,ignore
//! use notekeep_mongodb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = OpContext::background();
//!     let config = StoreConfig::builder()
//!         .uri("mongodb://127.0.0.1:27017")
//!         .database("glottery")
//!         .collection("notes")
//!         .build()?;
//!
//!     let store = NoteStore::connect(&ctx, config).await?;
//!
//!     let id = store.insert_one(&ctx, NewNote::new("First note", "Some spam text")).await?;
//!     store.update_by_id(&ctx, id, NoteUpdate::new().body("Some updated text")).await?;
//!
//!     let mut cursor = store.find_all(&ctx, NoteFilter::all()).await?;
//!     while let Some(note) = cursor.next().await {
//!         println!("{}", note?.title);
//!     }
//!
//!     store.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a server
//!
//! ```rust,ignore
//! use notekeep_mongodb::{MemoryBackend, NoteStore};
//!
//! let store = NoteStore::with_backend(MemoryBackend::new("glottery", "notes"));
//! ```

pub mod backend;
mod clock;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod filter;
pub mod id;
pub mod note;
pub mod store;

pub use backend::{
    BackendError, BackendErrorKind, BackendResult, MemoryBackend, MongoBackend, NoteBackend,
    UpdateOutcome,
};
pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use config::{ReadPreference, StoreConfig, StoreConfigBuilder, WriteConcern};
pub use context::OpContext;
pub use error::{NoteError, NoteResult, Operation};
pub use filter::NoteFilter;
pub use id::{IntoNoteId, NoteId};
pub use note::{NewNote, Note, NoteField, NoteUpdate};
pub use store::{NoteCursor, NoteStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{MemoryBackend, MongoBackend, NoteBackend, UpdateOutcome};
    pub use crate::config::{StoreConfig, StoreConfigBuilder};
    pub use crate::context::OpContext;
    pub use crate::error::{NoteError, NoteResult};
    pub use crate::filter::NoteFilter;
    pub use crate::id::{IntoNoteId, NoteId};
    pub use crate::note::{NewNote, Note, NoteField, NoteUpdate};
    pub use crate::store::{NoteCursor, NoteStore};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
