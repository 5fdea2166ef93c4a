//! CLI command implementations.

pub mod add;
pub mod count;
pub mod demo;
pub mod edit;
pub mod list;
pub mod rm;
pub mod show;

use notekeep_mongodb::{MemoryBackend, NoteStore, OpContext};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Settings;
use crate::error::CliResult;

/// Everything a command needs to reach the store.
#[derive(Debug, Clone)]
pub struct Session {
    /// Resolved settings
    pub settings: Settings,

    /// Deadline and cancellation for every store call
    pub ctx: OpContext,
}

impl Session {
    /// Create a session whose operations stop when `cancel` fires.
    pub fn new(settings: Settings, cancel: CancellationToken) -> Self {
        Self {
            settings,
            ctx: OpContext::background().with_cancellation(cancel),
        }
    }

    /// Open the configured store.
    pub async fn open(&self) -> CliResult<NoteStore> {
        let config = &self.settings.store;
        if self.settings.memory {
            debug!("Using in-memory backend");
            let backend = MemoryBackend::new(&config.database, &config.collection);
            return Ok(NoteStore::with_backend(backend).default_timeout(config.operation_timeout));
        }

        let store = NoteStore::connect(&self.ctx, config.clone()).await?;
        Ok(store)
    }
}

/// Open the store, run `f` against it, and close the store whatever the outcome.
pub async fn with_store<T, F>(session: &Session, f: F) -> CliResult<T>
where
    F: AsyncFnOnce(&NoteStore, &OpContext) -> CliResult<T>,
{
    let store = session.open().await?;
    let result = f(&store, &session.ctx).await;
    store.close().await;
    result
}
