use std::path::Path;

use chrono::{NaiveDate, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::inspect::count_files;
use crate::io::store::TicketStore;
use crate::model::config::StoreConfig;
use crate::ops::check;
use crate::ops::ticket_ops::{Board, due_date_from_day};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: the opened store, its config, and the output mode.
struct Context {
    store: TicketStore,
    config: StoreConfig,
    json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = open_context(cli.data_dir.as_deref(), cli.json)?;

    match cli.command {
        Commands::New(args) => cmd_new(&ctx, args),
        Commands::List => cmd_list(&ctx),
        Commands::Show(args) => cmd_show(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Due(args) => cmd_due(&ctx, args),
        Commands::Rename(args) => cmd_rename(&ctx, args),
        Commands::Done(args) => cmd_done(&ctx, args),
        Commands::Tree(args) => cmd_tree(&ctx, args),
        Commands::Open(args) => cmd_open(&ctx, args),
        Commands::Archived(args) => cmd_archived(&ctx, args),
        Commands::Check => cmd_check(&ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the data dir, read its config, and open (initializing if
/// needed) the store. Any failure here aborts the command.
fn open_context(data_dir: Option<&Path>, json: bool) -> Result<Context, Box<dyn std::error::Error>> {
    let data_dir = config_io::resolve_data_dir(data_dir)?;
    let config = config_io::read_config(&data_dir)?;
    let store = TicketStore::open(&data_dir, &config)?;
    tracing::debug!(data_dir = %data_dir.display(), "opened data directory");
    Ok(Context {
        store,
        config,
        json,
    })
}

fn parse_due(s: &str) -> Result<chrono::DateTime<Utc>, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(due_date_from_day)
        .map_err(|_| format!("invalid date \"{}\" (expected YYYY-MM-DD)", s))
}

fn folder_of(ctx: &Context, title: &str, id: &str) -> String {
    ctx.store.ticket_dir(title, id).display().to_string()
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_new(ctx: &Context, args: NewArgs) -> CmdResult {
    let due = args.due.as_deref().map(parse_due).transpose()?;
    let mut board = Board::load(&ctx.store)?;
    let ticket = board.create(&args.title, args.content.as_deref(), due)?;
    let folder = folder_of(ctx, &ticket.title, &ticket.id);

    if ctx.json {
        print_json(&ticket_to_json(ticket, &folder, &ctx.config.display, Utc::now()))
    } else {
        println!("{}", ticket.id);
        Ok(())
    }
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    let mut board = Board::load(&ctx.store)?;
    let ticket = match (args.content, args.append) {
        (Some(content), _) => board.set_content(&args.id, content)?,
        (None, Some(text)) => board.append_content(&args.id, &text)?,
        (None, None) => return Err("nothing to do: pass --content or --append".into()),
    };
    if ctx.json {
        let folder = folder_of(ctx, &ticket.title, &ticket.id);
        print_json(&ticket_to_json(ticket, &folder, &ctx.config.display, Utc::now()))?;
    }
    Ok(())
}

fn cmd_due(ctx: &Context, args: DueArgs) -> CmdResult {
    let due = if args.clear {
        None
    } else {
        args.date.as_deref().map(parse_due).transpose()?
    };
    let mut board = Board::load(&ctx.store)?;
    let ticket = board.set_due_date(&args.id, due)?;
    if ctx.json {
        let folder = folder_of(ctx, &ticket.title, &ticket.id);
        print_json(&ticket_to_json(ticket, &folder, &ctx.config.display, Utc::now()))?;
    }
    Ok(())
}

fn cmd_rename(ctx: &Context, args: RenameArgs) -> CmdResult {
    let mut board = Board::load(&ctx.store)?;
    let renamed = board.retitle(&args.id, &args.title)?;
    if ctx.json {
        print_json(&RenameJson {
            success: true,
            sanitized_title: renamed.sanitized_title,
            moved: renamed.moved,
            folder: renamed.ticket_dir.display().to_string(),
        })
    } else {
        println!("{}", renamed.sanitized_title);
        Ok(())
    }
}

fn cmd_done(ctx: &Context, args: IdArgs) -> CmdResult {
    let mut board = Board::load(&ctx.store)?;
    let entry = board.complete(&args.id)?;
    if ctx.json {
        print_json(&archived_to_json(&entry))
    } else {
        println!("archived {}", format_archived_line(&entry));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context) -> CmdResult {
    let board = Board::load(&ctx.store)?;
    let now = Utc::now();

    if ctx.json {
        let tickets: Vec<TicketJson> = board
            .tickets()
            .iter()
            .map(|t| ticket_to_json(t, &folder_of(ctx, &t.title, &t.id), &ctx.config.display, now))
            .collect();
        return print_json(&tickets);
    }

    if board.tickets().is_empty() {
        println!("no tickets");
    }
    for ticket in board.tickets() {
        println!("{}", format_ticket_line(ticket, &ctx.config.display, now));
    }
    Ok(())
}

fn cmd_show(ctx: &Context, args: IdArgs) -> CmdResult {
    let board = Board::load(&ctx.store)?;
    let ticket = board.get(&args.id)?;
    let folder = folder_of(ctx, &ticket.title, &ticket.id);
    let now = Utc::now();

    if ctx.json {
        return print_json(&ticket_to_json(ticket, &folder, &ctx.config.display, now));
    }
    for line in format_ticket_detail(ticket, &folder, &ctx.config.display, now) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_tree(ctx: &Context, args: IdArgs) -> CmdResult {
    let board = Board::load(&ctx.store)?;
    let ticket = board.get(&args.id)?;
    let tree = ctx.store.folder_structure(&ticket.title, &ticket.id);

    if ctx.json {
        return print_json(&tree);
    }
    match tree {
        None => Err(format!(
            "ticket folder not found: {}",
            folder_of(ctx, &ticket.title, &ticket.id)
        )
        .into()),
        Some(nodes) if nodes.is_empty() => {
            println!("(no files)");
            Ok(())
        }
        Some(nodes) => {
            for line in format_tree(&nodes) {
                println!("{}", line);
            }
            let files = count_files(&nodes);
            println!("{} file{}", files, if files == 1 { "" } else { "s" });
            Ok(())
        }
    }
}

fn cmd_open(ctx: &Context, args: OpenArgs) -> CmdResult {
    let Some(query) = args.id else {
        ctx.store.open_root()?;
        if ctx.json {
            print_json(&OpenJson {
                opened: true,
                path: ctx.store.root().display().to_string(),
            })?;
        }
        return Ok(());
    };

    let board = Board::load(&ctx.store)?;
    let ticket = board.get(&query)?;
    let opened = ctx.store.open_folder(&ticket.title, &ticket.id)?;
    let path = folder_of(ctx, &ticket.title, &ticket.id);

    if ctx.json {
        return print_json(&OpenJson { opened, path });
    }
    if !opened {
        return Err(format!("ticket folder not found: {}", path).into());
    }
    Ok(())
}

fn cmd_archived(ctx: &Context, args: ArchivedArgs) -> CmdResult {
    let log = ctx.store.read_archive()?;
    let skip = args
        .limit
        .map_or(0, |n| log.tickets.len().saturating_sub(n));
    let entries = &log.tickets[skip..];

    if ctx.json {
        let out: Vec<ArchivedJson> = entries.iter().map(archived_to_json).collect();
        return print_json(&out);
    }
    if entries.is_empty() {
        println!("no archived tickets");
    }
    for entry in entries {
        println!("{}", format_archived_line(entry));
    }
    Ok(())
}

fn cmd_check(ctx: &Context) -> CmdResult {
    let result = check::check_store(&ctx.store)?;
    if ctx.json {
        print_json(&result)?;
    } else {
        for line in format_check(&result) {
            println!("{}", line);
        }
    }
    if result.valid {
        Ok(())
    } else {
        Err(format!("{} problem(s) found", result.errors.len()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_due_accepts_iso_day() {
        let due = parse_due("2025-06-01").unwrap();
        assert_eq!(due.to_rfc3339(), "2025-06-01T00:00:00+00:00");
    }

    #[test]
    fn parse_due_rejects_other_formats() {
        assert!(parse_due("06/01/2025").is_err());
        assert!(parse_due("2025-13-01").is_err());
    }
}
