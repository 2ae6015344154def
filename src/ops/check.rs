use std::collections::BTreeMap;

use serde::Serialize;

use crate::io::store::{StoreError, TicketStore};
use crate::util::sanitize::{folder_key, sanitize};

/// Structured result from `tp check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub tickets: usize,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that makes a ticket unreachable through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Folder has no ticket.json, or it does not parse
    #[serde(rename = "unreadable_metadata")]
    UnreadableMetadata { folder: String, reason: String },
    /// Folder name differs from the key its metadata implies, so rename,
    /// archive and open will not find it
    #[serde(rename = "misplaced_folder")]
    MisplacedFolder { folder: String, expected: String },
    /// More than one folder carries the same ticket id
    #[serde(rename = "duplicate_id")]
    DuplicateId { id: String, folders: Vec<String> },
}

/// Non-critical findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Metadata title is not in sanitized form (written by another tool)
    #[serde(rename = "unsanitized_title")]
    UnsanitizedTitle { folder: String, title: String },
}

/// Validate the ticket store. Read-only.
///
/// Checks performed:
/// 1. Every ticket folder has readable metadata
/// 2. Every folder name equals `key(title, id)` of its metadata
/// 3. No id appears in more than one folder
/// 4. Stored titles are already sanitized
pub fn check_store(store: &TicketStore) -> Result<CheckResult, StoreError> {
    let mut result = CheckResult::default();
    let mut by_id: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for folder in store.scan()? {
        let ticket = match folder.metadata {
            Ok(ticket) => ticket,
            Err(reason) => {
                result.errors.push(CheckError::UnreadableMetadata {
                    folder: folder.folder_name,
                    reason,
                });
                continue;
            }
        };
        result.tickets += 1;

        let expected = folder_key(&ticket.title, &ticket.id);
        if expected != folder.folder_name {
            result.errors.push(CheckError::MisplacedFolder {
                folder: folder.folder_name.clone(),
                expected,
            });
        }
        if sanitize(&ticket.title) != ticket.title {
            result.warnings.push(CheckWarning::UnsanitizedTitle {
                folder: folder.folder_name.clone(),
                title: ticket.title.clone(),
            });
        }
        by_id.entry(ticket.id).or_default().push(folder.folder_name);
    }

    for (id, folders) in by_id {
        if folders.len() > 1 {
            result.errors.push(CheckError::DuplicateId { id, folders });
        }
    }

    result.valid = result.errors.is_empty();
    Ok(result)
}
