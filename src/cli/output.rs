use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::config::DisplayConfig;
use crate::model::folder::FolderNode;
use crate::model::ticket::{ArchivedTicket, Ticket};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::ticket_ops::{DueStatus, days_until_due, due_label, due_status};
use crate::util::unicode::content_preview;

/// Characters of the id shown in text listings.
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TicketJson {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueJson>,
    pub folder: String,
}

#[derive(Serialize)]
pub struct DueJson {
    pub days: i64,
    pub status: DueStatus,
    pub label: String,
}

#[derive(Serialize)]
pub struct RenameJson {
    pub success: bool,
    pub sanitized_title: String,
    pub moved: bool,
    pub folder: String,
}

#[derive(Serialize)]
pub struct ArchivedJson {
    pub id: String,
    pub title: String,
    pub archived_at: String,
}

#[derive(Serialize)]
pub struct OpenJson {
    pub opened: bool,
    pub path: String,
}

pub fn ticket_to_json(
    ticket: &Ticket,
    folder: &str,
    display: &DisplayConfig,
    now: DateTime<Utc>,
) -> TicketJson {
    TicketJson {
        id: ticket.id.clone(),
        title: ticket.title.clone(),
        content: ticket.content.clone(),
        created_at: rfc3339(ticket.created_at),
        due_date: ticket.due_date.map(rfc3339),
        due: ticket.due_date.map(|due| {
            let days = days_until_due(due, now);
            DueJson {
                days,
                status: due_status(days, display),
                label: due_label(due, days),
            }
        }),
        folder: folder.to_string(),
    }
}

pub fn archived_to_json(entry: &ArchivedTicket) -> ArchivedJson {
    ArchivedJson {
        id: entry.ticket.id.clone(),
        title: entry.ticket.title.clone(),
        archived_at: rfc3339(entry.archived_at),
    }
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

fn due_marker(status: DueStatus) -> &'static str {
    match status {
        DueStatus::Overdue | DueStatus::DueToday | DueStatus::Urgent => "!!",
        DueStatus::Soon => "! ",
        DueStatus::Later => "  ",
    }
}

/// One listing line: `abcd1234 !! Title  (Due in 2 days (…))  preview`
pub fn format_ticket_line(ticket: &Ticket, display: &DisplayConfig, now: DateTime<Utc>) -> String {
    let mut line = String::new();
    line.push_str(short_id(&ticket.id));
    line.push(' ');
    match ticket.due_date {
        Some(due) => {
            let days = days_until_due(due, now);
            line.push_str(due_marker(due_status(days, display)));
            line.push(' ');
            line.push_str(&ticket.title);
            line.push_str(&format!("  ({})", due_label(due, days)));
        }
        None => {
            line.push_str("   ");
            line.push_str(&ticket.title);
        }
    }
    let preview = content_preview(&ticket.content, display.preview_width);
    if !preview.is_empty() {
        line.push_str("  ");
        line.push_str(&preview);
    }
    line
}

pub fn format_ticket_detail(
    ticket: &Ticket,
    folder: &str,
    display: &DisplayConfig,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut lines = vec![
        ticket.title.clone(),
        format!("id:      {}", ticket.id),
        format!("created: {}", ticket.created_at.format("%Y-%m-%d %H:%M")),
    ];
    if let Some(due) = ticket.due_date {
        let days = days_until_due(due, now);
        let marker = due_marker(due_status(days, display)).trim_end();
        let label = due_label(due, days);
        if marker.is_empty() {
            lines.push(format!("due:     {}", label));
        } else {
            lines.push(format!("due:     {} {}", label, marker));
        }
    }
    lines.push(format!("folder:  {}", folder));
    if !ticket.content.is_empty() {
        lines.push(String::new());
        lines.extend(ticket.content.lines().map(str::to_string));
    }
    lines
}

/// Indented tree, directories suffixed with `/`.
pub fn format_tree(nodes: &[FolderNode]) -> Vec<String> {
    let mut lines = Vec::new();
    push_tree(nodes, 0, &mut lines);
    lines
}

fn push_tree(nodes: &[FolderNode], depth: usize, lines: &mut Vec<String>) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        if node.is_dir() {
            lines.push(format!("{}{}/", indent, node.name));
            if let Some(children) = &node.children {
                push_tree(children, depth + 1, lines);
            }
        } else {
            lines.push(format!("{}{}", indent, node.name));
        }
    }
}

pub fn format_archived_line(entry: &ArchivedTicket) -> String {
    format!(
        "{}  {}  {}",
        entry.archived_at.format("%Y-%m-%d"),
        short_id(&entry.ticket.id),
        entry.ticket.title
    )
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    for error in &result.errors {
        lines.push(match error {
            CheckError::UnreadableMetadata { folder, reason } => {
                format!("error: {}: unreadable metadata ({})", folder, reason)
            }
            CheckError::MisplacedFolder { folder, expected } => {
                format!("error: {}: folder should be named {}", folder, expected)
            }
            CheckError::DuplicateId { id, folders } => {
                format!("error: id {} appears in {}", id, folders.join(", "))
            }
        });
    }
    for warning in &result.warnings {
        lines.push(match warning {
            CheckWarning::UnsanitizedTitle { folder, title } => {
                format!("warning: {}: title \"{}\" is not sanitized", folder, title)
            }
        });
    }
    if result.valid {
        lines.push(format!("ok: {} tickets", result.tickets));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn ticket() -> Ticket {
        Ticket {
            id: "abc12345-6789".into(),
            title: "Fix login bug".into(),
            content: "# Repro\nclick login twice".into(),
            created_at: Utc.with_ymd_and_hms(2025, 4, 20, 8, 30, 0).unwrap(),
            due_date: None,
        }
    }

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("abc12345-6789"), "abc12345");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn line_without_due_date() {
        let line = format_ticket_line(&ticket(), &DisplayConfig::default(), now());
        assert_eq!(line, "abc12345    Fix login bug  Repro");
    }

    #[test]
    fn line_with_urgent_due_date() {
        let mut t = ticket();
        t.content.clear();
        t.due_date = Some(Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).unwrap());
        let line = format_ticket_line(&t, &DisplayConfig::default(), now());
        assert_eq!(line, "abc12345 !! Fix login bug  (Due in 2 days (2025-05-03))");
    }

    #[test]
    fn detail_lists_fields_then_body() {
        let lines =
            format_ticket_detail(&ticket(), "/data/tickets/x", &DisplayConfig::default(), now());
        assert_eq!(
            lines,
            vec![
                "Fix login bug",
                "id:      abc12345-6789",
                "created: 2025-04-20 08:30",
                "folder:  /data/tickets/x",
                "",
                "# Repro",
                "click login twice",
            ]
        );
    }

    #[test]
    fn tree_is_indented() {
        let tree = vec![
            FolderNode::directory("logs", vec![FolderNode::file("a.log")]),
            FolderNode::file("shot.png"),
        ];
        assert_eq!(format_tree(&tree), vec!["logs/", "  a.log", "shot.png"]);
    }

    #[test]
    fn json_includes_due_summary() {
        let mut t = ticket();
        t.due_date = Some(Utc.with_ymd_and_hms(2025, 4, 29, 0, 0, 0).unwrap());
        let json =
            serde_json::to_value(ticket_to_json(&t, "f", &DisplayConfig::default(), now())).unwrap();
        assert_eq!(json["due"]["status"], "overdue");
        assert_eq!(json["due"]["days"], -2);
        assert_eq!(json["created_at"], "2025-04-20T08:30:00Z");
    }
}
