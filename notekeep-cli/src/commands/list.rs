//! `notekeep list` command - List notes.

use notekeep_mongodb::{NoteFilter, NoteStore, OpContext};

use crate::cli::ListArgs;
use crate::commands::{Session, with_store};
use crate::error::CliResult;
use crate::output::{self, dim};

/// Run the list command
pub async fn run(session: &Session, args: ListArgs) -> CliResult<()> {
    let filter = match args.title {
        Some(ref text) => NoteFilter::all().title_contains(text),
        None => NoteFilter::all(),
    };

    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        let mut cursor = store.find_all(ctx, filter).await?;
        let mut shown = 0usize;
        while let Some(note) = cursor.next().await {
            let note = note?;
            if args.json {
                println!("{}", serde_json::to_string(&note)?);
            } else {
                output::note_line(&note);
            }
            shown += 1;
        }

        if !args.json && shown == 0 {
            dim("No notes");
        }
        Ok(())
    })
    .await
}
