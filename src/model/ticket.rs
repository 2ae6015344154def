use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest id accepted at the store boundary.
pub const MAX_ID_LEN: usize = 128;

/// A single note/task record as persisted in `ticket.json`.
///
/// Completion is not a field: a completed ticket is one that has left the
/// active store and appears in the archive log. Unknown keys in older
/// metadata files (such as a `completed` flag) are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Opaque unique identifier, fixed at creation
    pub id: String,
    /// Display title; the store writes back its sanitized form
    pub title: String,
    /// Free-text / markdown body
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Build a fresh ticket with a new random id and an empty body.
    pub fn new(title: impl Into<String>) -> Self {
        Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: String::new(),
            created_at: Utc::now(),
            due_date: None,
        }
    }

    /// Check the fields the store relies on before any filesystem access.
    pub fn validate(&self) -> Result<(), String> {
        validate_ticket_id(&self.id)
    }
}

/// Ids become part of a folder name, so only a conservative alphabet is allowed.
pub fn validate_ticket_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("ticket id cannot be empty".to_string());
    }
    if id.len() > MAX_ID_LEN {
        return Err(format!(
            "ticket id is {} characters long (max {})",
            id.len(),
            MAX_ID_LEN
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "invalid ticket id \"{}\": use letters, digits, '-' or '_'",
            id
        ));
    }
    Ok(())
}

/// A ticket snapshot as stored in the archive log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub archived_at: DateTime<Utc>,
}

/// The whole archive document: `{ "tickets": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLog {
    #[serde(default)]
    pub tickets: Vec<ArchivedTicket>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_ticket_has_valid_uuid_id() {
        let t = Ticket::new("New Ticket");
        assert!(t.validate().is_ok());
        assert_eq!(t.id.len(), 36);
        assert_eq!(t.content, "");
        assert!(t.due_date.is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let t = Ticket {
            id: "abc123".into(),
            title: "Fix login bug".into(),
            content: "steps".into(),
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap(),
            due_date: None,
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["createdAt"], "2025-05-01T12:00:00Z");
        assert!(json["dueDate"].is_null());
        assert!(json.get("completed").is_none());
    }

    #[test]
    fn reads_legacy_metadata_with_extra_fields() {
        let json = r#"{
            "id": "abc123",
            "title": "Fix login bug",
            "content": "",
            "createdAt": "2025-05-01T12:00:00.000Z",
            "dueDate": null,
            "completed": false
        }"#;
        let t: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "abc123");
        assert_eq!(t.title, "Fix login bug");
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"id":"x1","title":"T","createdAt":"2025-05-01T00:00:00Z"}"#;
        let t: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(t.content, "");
        assert_eq!(t.due_date, None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"title":"T","createdAt":"2025-05-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Ticket>(json).is_err());
    }

    #[test]
    fn id_validation() {
        assert!(validate_ticket_id("abc-123_X").is_ok());
        assert!(validate_ticket_id("").is_err());
        assert!(validate_ticket_id("../etc").is_err());
        assert!(validate_ticket_id("a/b").is_err());
        assert!(validate_ticket_id("a b").is_err());
        assert!(validate_ticket_id(&"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn archived_ticket_flattens_fields() {
        let entry = ArchivedTicket {
            ticket: Ticket {
                id: "abc123".into(),
                title: "Done thing".into(),
                content: String::new(),
                created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
                due_date: None,
            },
            archived_at: Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["archivedAt"], "2025-05-02T00:00:00Z");
        let back: ArchivedTicket = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
