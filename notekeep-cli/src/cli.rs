//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::parse_duration;

/// Notekeep - Keep notes in a MongoDB collection
#[derive(Parser, Debug)]
#[command(name = "notekeep")]
#[command(version)]
#[command(about = "Notekeep - Keep notes in a MongoDB collection", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Connection options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the config file [default: notekeep.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// MongoDB connection URI
    #[arg(long, global = true, env = "NOTEKEEP_URI")]
    pub uri: Option<String>,

    /// Database name
    #[arg(long, global = true, env = "NOTEKEEP_DATABASE")]
    pub database: Option<String>,

    /// Collection name
    #[arg(long, global = true, env = "NOTEKEEP_COLLECTION")]
    pub collection: Option<String>,

    /// Per-operation timeout (e.g. 500ms, 10s, 2m)
    #[arg(long, global = true, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Use a throwaway in-memory collection instead of MongoDB
    #[arg(long, global = true)]
    pub memory: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk through every store operation on sample notes
    Demo,

    /// Add a note
    Add(AddArgs),

    /// List notes
    List(ListArgs),

    /// Show one note
    Show(ShowArgs),

    /// Change a note's title or body
    Edit(EditArgs),

    /// Remove a note
    Rm(RmArgs),

    /// Count notes
    Count(CountArgs),
}

/// Arguments for the `add` command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Note title
    pub title: String,

    /// Note body
    #[arg(default_value = "")]
    pub body: String,
}

/// Arguments for the `list` command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only notes whose title contains this text (case-insensitive)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Print notes as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Note id (24 hex characters)
    pub id: String,

    /// Print the note as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `edit` command
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Note id (24 hex characters)
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New body
    #[arg(short, long)]
    pub body: Option<String>,
}

/// Arguments for the `rm` command
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Note id (24 hex characters)
    pub id: String,
}

/// Arguments for the `count` command
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Only notes whose title contains this text (case-insensitive)
    #[arg(short, long)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_after_subcommand() {
        let cli = Cli::try_parse_from([
            "notekeep", "list", "--memory", "--timeout", "250ms", "--title", "note",
        ])
        .unwrap();
        assert!(cli.global.memory);
        assert_eq!(cli.global.timeout, Some(Duration::from_millis(250)));
        match cli.command {
            Command::List(args) => assert_eq!(args.title.as_deref(), Some("note")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["notekeep", "count", "--timeout", "soon"]).is_err());
    }
}
