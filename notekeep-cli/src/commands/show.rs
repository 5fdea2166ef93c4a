//! `notekeep show` command - Show one note.

use notekeep_mongodb::{NoteStore, OpContext};

use crate::cli::ShowArgs;
use crate::commands::{Session, with_store};
use crate::error::CliResult;
use crate::output;

/// Run the show command
pub async fn run(session: &Session, args: ShowArgs) -> CliResult<()> {
    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        let note = store.find_by_id(ctx, args.id.as_str()).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&note)?);
        } else {
            output::note_detail(&note);
        }
        Ok(())
    })
    .await
}
