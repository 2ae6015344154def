use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tp", about = concat!("ticketpad v", env!("CARGO_PKG_VERSION"), " - one folder per ticket"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: $TICKETPAD_HOME or the user data dir)
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose developer diagnostics on stderr
    #[arg(long, global = true)]
    pub dev: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new ticket
    New(NewArgs),
    /// List active tickets
    List,
    /// Show a ticket
    Show(IdArgs),
    /// Replace or extend a ticket's body
    Edit(EditArgs),
    /// Set or clear a ticket's due date
    Due(DueArgs),
    /// Change a ticket's title (renames its folder)
    Rename(RenameArgs),
    /// Complete a ticket: archive it and delete its folder
    Done(IdArgs),
    /// Show the files inside a ticket's folder
    Tree(IdArgs),
    /// Open a ticket's folder, or the tickets root, in the file browser
    Open(OpenArgs),
    /// List completed tickets from the archive log
    Archived(ArchivedArgs),
    /// Validate the ticket store
    Check,
}

#[derive(Args)]
pub struct NewArgs {
    /// Ticket title
    pub title: String,
    /// Initial body text
    #[arg(long)]
    pub content: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Ticket id (or a unique prefix of it)
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Ticket id (or a unique prefix of it)
    pub id: String,
    /// Replace the body with this text
    #[arg(long, conflicts_with = "append", required_unless_present = "append")]
    pub content: Option<String>,
    /// Append this text as a new line
    #[arg(long)]
    pub append: Option<String>,
}

#[derive(Args)]
pub struct DueArgs {
    /// Ticket id (or a unique prefix of it)
    pub id: String,
    /// Due date (YYYY-MM-DD)
    #[arg(conflicts_with = "clear", required_unless_present = "clear")]
    pub date: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Ticket id (or a unique prefix of it)
    pub id: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct OpenArgs {
    /// Ticket id (omit to open the tickets root)
    pub id: Option<String>,
}

#[derive(Args)]
pub struct ArchivedArgs {
    /// Show only the N most recent entries
    #[arg(long)]
    pub limit: Option<usize>,
}
