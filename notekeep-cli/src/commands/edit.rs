//! `notekeep edit` command - Change a note's title or body.

use notekeep_mongodb::{NoteField, NoteId, NoteStore, NoteUpdate, OpContext};

use crate::cli::EditArgs;
use crate::commands::{Session, with_store};
use crate::error::{CliError, CliResult};
use crate::output::{success, warn};

/// Run the edit command
pub async fn run(session: &Session, args: EditArgs) -> CliResult<()> {
    let id = NoteId::parse(&args.id)?;

    let mut changes = NoteUpdate::new();
    if let Some(title) = args.title {
        changes = changes.title(title);
    }
    if let Some(body) = args.body {
        changes = changes.body(body);
    }
    if changes.is_empty() {
        return Err(CliError::Command("nothing to change, pass --title or --body".into()));
    }

    let fields: Vec<&str> = changes.changed_fields().iter().map(NoteField::name).collect();

    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        let outcome = store.update_by_id(ctx, id, changes).await?;
        if outcome.matched == 0 {
            warn(&format!("No note with id {}", id));
        } else {
            success(&format!("Updated {} of note {}", fields.join(" and "), id));
        }
        Ok(())
    })
    .await
}
