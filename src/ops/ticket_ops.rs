use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::io::store::{Renamed, StoreError, TicketStore};
use crate::model::config::DisplayConfig;
use crate::model::ticket::{ArchivedTicket, Ticket};

/// Error type for ticket operations
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("no ticket matches \"{0}\"")]
    NotFound(String),
    #[error("\"{prefix}\" matches {count} tickets; give more of the id")]
    Ambiguous { prefix: String, count: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Board: the in-memory ticket list a front end works against
// ---------------------------------------------------------------------------

/// The active tickets as the front end sees them, plus the store they came
/// from.
///
/// Every mutation persists first and only then updates memory, or updates
/// memory optimistically and restores it when the store call fails, so the
/// list never drifts from what is on disk.
pub struct Board<'a> {
    store: &'a TicketStore,
    tickets: Vec<Ticket>,
}

impl<'a> Board<'a> {
    /// Load every ticket from the store, dropping duplicate ids.
    pub fn load(store: &'a TicketStore) -> Result<Self, TicketError> {
        let tickets = dedup_by_id(store.load_all()?);
        Ok(Board { store, tickets })
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Look a ticket up by exact id or unique id prefix.
    pub fn get(&self, query: &str) -> Result<&Ticket, TicketError> {
        let idx = find_ticket(&self.tickets, query)?;
        Ok(&self.tickets[idx])
    }

    /// Create and persist a new ticket. The returned ticket carries the
    /// sanitized title the store applied.
    pub fn create(
        &mut self,
        title: &str,
        content: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<&Ticket, TicketError> {
        let mut ticket = Ticket::new(title);
        if let Some(content) = content {
            ticket.content = content.to_string();
        }
        ticket.due_date = due_date;

        let created = self.store.create(&ticket)?;
        ticket.title = created.sanitized_title;
        self.tickets.push(ticket);
        let last = self.tickets.len() - 1;
        Ok(&self.tickets[last])
    }

    /// Replace the body of a ticket.
    pub fn set_content(&mut self, query: &str, content: String) -> Result<&Ticket, TicketError> {
        self.update(query, |t| t.content = content)
    }

    /// Append a paragraph to the body of a ticket.
    pub fn append_content(&mut self, query: &str, text: &str) -> Result<&Ticket, TicketError> {
        self.update(query, |t| {
            if !t.content.is_empty() && !t.content.ends_with('\n') {
                t.content.push('\n');
            }
            t.content.push_str(text);
        })
    }

    /// Set or clear the due date of a ticket.
    pub fn set_due_date(
        &mut self,
        query: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<&Ticket, TicketError> {
        self.update(query, |t| t.due_date = due_date)
    }

    /// Change a ticket's title, moving its folder. On failure (missing
    /// folder, collision) the in-memory title is left as it was.
    pub fn retitle(&mut self, query: &str, new_title: &str) -> Result<Renamed, TicketError> {
        let idx = find_ticket(&self.tickets, query)?;
        let ticket = &mut self.tickets[idx];
        let renamed = self.store.rename(&ticket.title, new_title, &ticket.id)?;
        ticket.title = renamed.sanitized_title.clone();
        Ok(renamed)
    }

    /// Complete a ticket: it leaves the board at once and is archived. If
    /// archiving fails the ticket is put back where it was.
    pub fn complete(&mut self, query: &str) -> Result<ArchivedTicket, TicketError> {
        let idx = find_ticket(&self.tickets, query)?;
        let ticket = self.tickets.remove(idx);
        match self.store.archive(&ticket) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                self.tickets.insert(idx, ticket);
                Err(e.into())
            }
        }
    }

    /// Apply an edit that keeps the folder key, persist it, and roll the
    /// in-memory copy back if the write fails.
    fn update(
        &mut self,
        query: &str,
        edit: impl FnOnce(&mut Ticket),
    ) -> Result<&Ticket, TicketError> {
        let idx = find_ticket(&self.tickets, query)?;
        let before = self.tickets[idx].clone();
        edit(&mut self.tickets[idx]);
        if let Err(e) = self.store.create(&self.tickets[idx]) {
            self.tickets[idx] = before;
            return Err(e.into());
        }
        Ok(&self.tickets[idx])
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Keep the first ticket seen for each id, preserving order.
pub fn dedup_by_id(tickets: Vec<Ticket>) -> Vec<Ticket> {
    let mut seen: IndexMap<String, Ticket> = IndexMap::with_capacity(tickets.len());
    for ticket in tickets {
        seen.entry(ticket.id.clone()).or_insert(ticket);
    }
    seen.into_values().collect()
}

/// Index of the ticket whose id equals `query`, or else the only ticket
/// whose id starts with it.
pub fn find_ticket(tickets: &[Ticket], query: &str) -> Result<usize, TicketError> {
    if let Some(idx) = tickets.iter().position(|t| t.id == query) {
        return Ok(idx);
    }
    if query.is_empty() {
        return Err(TicketError::NotFound(query.to_string()));
    }
    let matches: Vec<usize> = tickets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.id.starts_with(query))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(TicketError::NotFound(query.to_string())),
        _ => Err(TicketError::Ambiguous {
            prefix: query.to_string(),
            count: matches.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Due dates
// ---------------------------------------------------------------------------

/// A calendar day as a due date: midnight UTC of that day.
pub fn due_date_from_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Whole days until `due`, rounding any partial day up. Negative when past.
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 86_400_000;
    let ms = (due - now).num_milliseconds();
    let days = ms.div_euclid(DAY_MS);
    if ms.rem_euclid(DAY_MS) != 0 {
        days + 1
    } else {
        days
    }
}

/// How pressing a due date is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    Urgent,
    Soon,
    Later,
}

pub fn due_status(days: i64, display: &DisplayConfig) -> DueStatus {
    if days < 0 {
        DueStatus::Overdue
    } else if days == 0 {
        DueStatus::DueToday
    } else if days <= display.due_urgent_days {
        DueStatus::Urgent
    } else if days <= display.due_soon_days {
        DueStatus::Soon
    } else {
        DueStatus::Later
    }
}

/// Human label, e.g. "Due in 3 days (2025-06-01)".
pub fn due_label(due: DateTime<Utc>, days: i64) -> String {
    let date = due.format("%Y-%m-%d");
    match days {
        0 => format!("Due today ({})", date),
        d if d < 0 => format!("Overdue by {} {} ({})", -d, plural_days(-d), date),
        d => format!("Due in {} {} ({})", d, plural_days(d), date),
    }
}

fn plural_days(n: i64) -> &'static str {
    if n == 1 { "day" } else { "days" }
}
