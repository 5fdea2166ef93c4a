//! `notekeep count` command - Count notes.

use notekeep_mongodb::{NoteFilter, NoteStore, OpContext};

use crate::cli::CountArgs;
use crate::commands::{Session, with_store};
use crate::error::CliResult;

/// Run the count command
pub async fn run(session: &Session, args: CountArgs) -> CliResult<()> {
    let filter = match args.title {
        Some(ref text) => NoteFilter::all().title_contains(text),
        None => NoteFilter::all(),
    };

    with_store(session, async move |store: &NoteStore, ctx: &OpContext| {
        let count = store.count(ctx, filter).await?;
        println!("{}", count);
        Ok(())
    })
    .await
}
