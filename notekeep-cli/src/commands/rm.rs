//! `notekeep rm` command - Remove a note.

use notekeep_mongodb::{NoteId, NoteStore, OpContext};

use crate::cli::RmArgs;
use crate::commands::{Session, with_store};
use crate::error::CliResult;
use crate::output::{success, warn};

/// Run the rm command
pub async fn run(session: &Session, args: RmArgs) -> CliResult<()> {
    let id = NoteId::parse(&args.id)?;

    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        match store.delete_by_id(ctx, id).await? {
            0 => warn(&format!("No note with id {}", id)),
            _ => success(&format!("Removed note {}", id)),
        }
        Ok(())
    })
    .await
}
