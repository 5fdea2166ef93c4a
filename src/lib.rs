//! # Notekeep
//!
//! Typed CRUD over a MongoDB collection of notes.
//!
//! Notekeep provides:
//! - A `NoteStore` with insert, update, delete and lookup by id
//! - Typed identifiers, timestamps and an explicit document mapping
//! - Deadlines and cancellation on every operation
//! - An in-memory backend for tests and offline use
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use notekeep::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NoteError> {
//!     let ctx = OpContext::background();
//!     let config = StoreConfig::new("mongodb://127.0.0.1:27017", "glottery", "notes");
//!     let store = NoteStore::connect(&ctx, config).await?;
//!
//!     let id = store.insert_one(&ctx, NewNote::new("First note", "Some spam text")).await?;
//!     let note = store.find_by_id(&ctx, id).await?;
//!     println!("{}: {}", note.title, note.body);
//!
//!     store.close().await;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The MongoDB-backed note store.
pub mod store {
    pub use notekeep_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use notekeep_mongodb::prelude::*;
}

// Re-export key types at the crate root
pub use store::{
    MemoryBackend, NewNote, Note, NoteCursor, NoteError, NoteFilter, NoteId, NoteResult,
    NoteStore, NoteUpdate, OpContext, StoreConfig,
};
