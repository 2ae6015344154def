use serde::{Deserialize, Serialize};

/// Configuration from `config.toml` in the data directory.
///
/// Every section is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub open: OpenConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Directory (relative to the data dir) holding one folder per ticket
    #[serde(default = "default_tickets_dir")]
    pub tickets_dir: String,
    /// Archive log file name (relative to the data dir)
    #[serde(default = "default_archive_file")]
    pub archive_file: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            tickets_dir: default_tickets_dir(),
            archive_file: default_archive_file(),
        }
    }
}

fn default_tickets_dir() -> String {
    "tickets".to_string()
}

fn default_archive_file() -> String {
    "archive.json".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenConfig {
    /// Program used to open folders instead of the platform default
    /// (e.g. "nautilus" or "code"). The folder path is passed as the only argument.
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,
    /// Tickets due within this many days are "soon"
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
    /// Tickets due within this many days are "urgent"
    #[serde(default = "default_due_urgent_days")]
    pub due_urgent_days: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            preview_width: default_preview_width(),
            due_soon_days: default_due_soon_days(),
            due_urgent_days: default_due_urgent_days(),
        }
    }
}

fn default_preview_width() -> usize {
    60
}

fn default_due_soon_days() -> i64 {
    14
}

fn default_due_urgent_days() -> i64 {
    3
}
