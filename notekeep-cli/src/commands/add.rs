//! `notekeep add` command - Add a note.

use notekeep_mongodb::{NewNote, NoteStore, OpContext};

use crate::cli::AddArgs;
use crate::commands::{Session, with_store};
use crate::error::{CliError, CliResult};
use crate::output::success;

/// Run the add command
pub async fn run(session: &Session, args: AddArgs) -> CliResult<()> {
    if args.title.trim().is_empty() {
        return Err(CliError::Command("title must not be empty".into()));
    }

    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        let id = store.insert_one(ctx, NewNote::new(args.title, args.body)).await?;
        success(&format!("Added note {}", id));
        Ok(())
    })
    .await
}
