//! `notekeep demo` command - Walk through every store operation.

use notekeep_mongodb::{NewNote, NoteFilter, NoteStore, NoteUpdate, OpContext};

use crate::commands::{Session, with_store};
use crate::error::CliResult;
use crate::output::{self, kv, list_item, step, success};

const STEPS: usize = 6;

/// Run the demo command
pub async fn run(session: &Session) -> CliResult<()> {
    with_store(session, async |store: &NoteStore, ctx: &OpContext| {
        walkthrough(store, ctx).await
    })
    .await
}

async fn walkthrough(store: &NoteStore, ctx: &OpContext) -> CliResult<()> {
    output::header("Notekeep Demo");
    kv("Database", store.database_name());
    kv("Collection", store.collection_name());
    kv("Backend", store.backend_name());
    output::newline();

    step(1, STEPS, "Inserting one note...");
    let first = store
        .insert_one(ctx, NewNote::new("First note", "Some spam text"))
        .await?;
    success(&format!("Inserted {}", first));

    step(2, STEPS, "Inserting two notes...");
    let batch = store
        .insert_many(
            ctx,
            vec![
                NewNote::new("Second note", "Some spam text"),
                NewNote::new("Third note", "Some spam text"),
            ],
        )
        .await?;
    for id in &batch {
        success(&format!("Inserted {}", id));
    }

    step(3, STEPS, "Updating the first note's body...");
    let outcome = store
        .update_by_id(ctx, first, NoteUpdate::new().body("Some updated text"))
        .await?;
    kv("Modified", &outcome.modified.to_string());

    step(4, STEPS, "Deleting the third note...");
    let mut deleted = 0;
    for id in batch.iter().skip(1) {
        deleted += store.delete_by_id(ctx, *id).await?;
    }
    kv("Deleted", &deleted.to_string());

    step(5, STEPS, "Finding the first note...");
    let note = store.find_by_id(ctx, first).await?;
    kv("Body", &note.body);

    step(6, STEPS, "Listing every note...");
    let mut cursor = store.find_all(ctx, NoteFilter::all()).await?;
    while let Some(note) = cursor.next().await {
        list_item(&note?.title);
    }

    output::newline();
    success("Demo complete");
    Ok(())
}
