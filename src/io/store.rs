use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::io::archive_io::{self, write_json};
use crate::io::inspect::{self, METADATA_FILE};
use crate::io::lock::LockError;
use crate::io::opener::{FolderOpener, SystemOpener};
use crate::model::config::StoreConfig;
use crate::model::folder::FolderNode;
use crate::model::ticket::{ArchiveLog, ArchivedTicket, Ticket, validate_ticket_id};
use crate::util::sanitize::{folder_key, sanitize};

/// Error type for ticket store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ticket folder not found: {path}")]
    NotFound { path: PathBuf },
    #[error("cannot rename {from} to {to}: a folder with that name already exists")]
    Collision { from: PathBuf, to: PathBuf },
    #[error("invalid ticket: {0}")]
    InvalidTicket(String),
    #[error("could not access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not initialize ticket store at {path}: {source}")]
    Setup { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where `create` put a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFolder {
    pub ticket_dir: PathBuf,
    pub sanitized_title: String,
}

/// Outcome of a successful `rename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub ticket_dir: PathBuf,
    pub sanitized_title: String,
    /// False when the sanitized title was unchanged and nothing moved
    pub moved: bool,
}

/// One immediate subdirectory of the tickets root, with its parsed metadata.
#[derive(Debug)]
pub struct ScannedFolder {
    pub folder_name: String,
    pub metadata: Result<Ticket, String>,
}

/// Owns the tickets root and the archive log.
///
/// Holds nothing but paths and the folder opener; every call goes to disk.
/// Calls for different tickets touch different folders and may run
/// concurrently. Calls for the same ticket must be serialized by the caller.
pub struct TicketStore {
    root: PathBuf,
    archive_path: PathBuf,
    opener: Box<dyn FolderOpener + Send + Sync>,
}

impl TicketStore {
    /// Open the store under `data_dir` using the layout from `config`.
    pub fn open(data_dir: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let store = Self::at(
            data_dir.join(&config.store.tickets_dir),
            data_dir.join(&config.store.archive_file),
        )?;
        Ok(store.with_opener(SystemOpener::new(config.open.command.clone())))
    }

    /// Open a store with explicit paths, creating the root directory and an
    /// empty archive log if they are absent. Failure here is fatal for the
    /// caller: nothing else can work without them.
    pub fn at(root: PathBuf, archive_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&root).map_err(|e| StoreError::Setup {
            path: root.clone(),
            source: e,
        })?;
        if let Some(parent) = archive_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Setup {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        archive_io::init_archive_log(&archive_path)?;
        debug!(root = %root.display(), archive = %archive_path.display(), "ticket store ready");
        Ok(TicketStore {
            root,
            archive_path,
            opener: Box::new(SystemOpener::default()),
        })
    }

    pub fn with_opener(mut self, opener: impl FolderOpener + Send + Sync + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Folder for the ticket keyed by `(title, id)`.
    pub fn ticket_dir(&self, title: &str, id: &str) -> PathBuf {
        self.root.join(folder_key(title, id))
    }

    /// Create the ticket's folder if needed and (re)write its metadata.
    ///
    /// Also used to persist content and due-date edits, which leave the
    /// folder key unchanged. The metadata `title` is always the sanitized
    /// form. Keys in an existing ticket.json that `Ticket` does not model are
    /// kept. A folder created without metadata (failed write) converges on
    /// the next call.
    pub fn create(&self, ticket: &Ticket) -> Result<CreatedFolder, StoreError> {
        ticket.validate().map_err(StoreError::InvalidTicket)?;

        let sanitized_title = sanitize(&ticket.title);
        let ticket_dir = self.ticket_dir(&sanitized_title, &ticket.id);
        fs::create_dir_all(&ticket_dir).map_err(|e| {
            error!(path = %ticket_dir.display(), error = %e, "could not create ticket folder");
            StoreError::io(&ticket_dir, e)
        })?;

        let stored = Ticket {
            title: sanitized_title.clone(),
            ..ticket.clone()
        };
        let meta_path = ticket_dir.join(METADATA_FILE);
        let mut metadata = read_existing_fields(&meta_path);
        let fields = serde_json::to_value(&stored).map_err(|e| StoreError::Json {
            path: meta_path.clone(),
            source: e,
        })?;
        if let Value::Object(fields) = fields {
            metadata.extend(fields);
        }
        write_json(&meta_path, &metadata).inspect_err(|e| {
            error!(ticket_id = %ticket.id, error = %e, "could not write ticket metadata");
        })?;

        debug!(ticket_id = %ticket.id, path = %ticket_dir.display(), "ticket saved");
        Ok(CreatedFolder {
            ticket_dir,
            sanitized_title,
        })
    }

    /// Move a ticket folder to match a new title.
    ///
    /// Fails with `NotFound` when the old folder is missing, with
    /// `Collision` when a different folder already occupies the new key, and
    /// with `Io`/`Json` when the old metadata cannot be read. In all of those
    /// cases nothing on disk changes. Only the metadata `title` is rewritten;
    /// every other key is kept as found. When the sanitized title is
    /// unchanged nothing moves, but the title is still rewritten.
    pub fn rename(&self, old_title: &str, new_title: &str, id: &str) -> Result<Renamed, StoreError> {
        validate_ticket_id(id).map_err(StoreError::InvalidTicket)?;

        let old_dir = self.ticket_dir(old_title, id);
        let sanitized_title = sanitize(new_title);
        let new_dir = self.ticket_dir(&sanitized_title, id);

        if !old_dir.is_dir() {
            warn!(ticket_id = id, path = %old_dir.display(), "rename source missing");
            return Err(StoreError::NotFound { path: old_dir });
        }

        let mut metadata = read_metadata_fields(&old_dir.join(METADATA_FILE)).inspect_err(|e| {
            warn!(ticket_id = id, error = %e, "rename refused: unreadable metadata");
        })?;
        metadata.insert("title".to_string(), Value::String(sanitized_title.clone()));

        let mut moved = false;
        if old_dir != new_dir {
            if fs::symlink_metadata(&new_dir).is_ok() && !same_entry(&old_dir, &new_dir) {
                warn!(
                    ticket_id = id,
                    from = %old_dir.display(),
                    to = %new_dir.display(),
                    "rename refused: destination exists"
                );
                return Err(StoreError::Collision {
                    from: old_dir,
                    to: new_dir,
                });
            }
            fs::rename(&old_dir, &new_dir).map_err(|e| {
                error!(from = %old_dir.display(), to = %new_dir.display(), error = %e, "rename failed");
                StoreError::io(&old_dir, e)
            })?;
            moved = true;
            info!(ticket_id = id, to = %new_dir.display(), "ticket folder renamed");
        }

        if let Err(e) = write_json(&new_dir.join(METADATA_FILE), &metadata) {
            if moved && let Err(back) = fs::rename(&new_dir, &old_dir) {
                error!(
                    from = %new_dir.display(),
                    to = %old_dir.display(),
                    error = %back,
                    "could not move ticket folder back after failed metadata write"
                );
            }
            return Err(e);
        }

        Ok(Renamed {
            ticket_dir: new_dir,
            sanitized_title,
            moved,
        })
    }

    /// Complete a ticket: append its snapshot to the archive log, then
    /// delete its folder.
    ///
    /// The log write is durable before deletion starts, so a crash in
    /// between leaves the ticket in both places rather than in neither.
    /// A missing folder is not an error. Every call appends one entry.
    pub fn archive(&self, ticket: &Ticket) -> Result<ArchivedTicket, StoreError> {
        ticket.validate().map_err(StoreError::InvalidTicket)?;

        let entry = archive_io::append_to_archive(&self.archive_path, ticket, Utc::now())
            .inspect_err(|e| {
                error!(ticket_id = %ticket.id, error = %e, "could not append to archive log");
            })?;

        let ticket_dir = self.ticket_dir(&ticket.title, &ticket.id);
        match fs::remove_dir_all(&ticket_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %ticket_dir.display(), "ticket folder already gone");
            }
            Err(e) => {
                error!(path = %ticket_dir.display(), error = %e, "could not delete archived ticket folder");
                return Err(StoreError::io(&ticket_dir, e));
            }
        }

        info!(ticket_id = %ticket.id, "ticket archived");
        Ok(entry)
    }

    /// List every immediate subdirectory of the root with its parsed metadata.
    pub fn scan(&self) -> Result<Vec<ScannedFolder>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %self.root.display(), error = %e, "could not read tickets root entry");
                    continue;
                }
            };
            match entry.file_type() {
                Ok(t) if t.is_dir() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "could not stat entry, skipping");
                    continue;
                }
            }
            let metadata =
                read_metadata(&entry.path().join(METADATA_FILE)).map_err(|e| e.to_string());
            folders.push(ScannedFolder {
                folder_name: entry.file_name().to_string_lossy().into_owned(),
                metadata,
            });
        }
        folders.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));
        Ok(folders)
    }

    /// Load every readable ticket, oldest first.
    ///
    /// Folders with missing or unparsable metadata are skipped with a
    /// warning. Duplicate ids are returned as found.
    pub fn load_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets = Vec::new();
        for folder in self.scan()? {
            match folder.metadata {
                Ok(ticket) => tickets.push(ticket),
                Err(reason) => {
                    warn!(folder = %folder.folder_name, %reason, "skipping ticket folder");
                }
            }
        }
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tickets)
    }

    /// The archive log contents, oldest entry first. A corrupt log reads as
    /// empty; an unreadable one is an error.
    pub fn read_archive(&self) -> Result<ArchiveLog, StoreError> {
        archive_io::read_archive_log(&self.archive_path)
    }

    /// Tree of user files in the ticket's folder, or `None` if it does not exist.
    pub fn folder_structure(&self, title: &str, id: &str) -> Option<Vec<FolderNode>> {
        if validate_ticket_id(id).is_err() {
            return None;
        }
        inspect::inspect(&self.ticket_dir(title, id))
    }

    /// Show the ticket's folder in the OS file browser. Returns false if the
    /// folder does not exist.
    pub fn open_folder(&self, title: &str, id: &str) -> Result<bool, StoreError> {
        validate_ticket_id(id).map_err(StoreError::InvalidTicket)?;
        let dir = self.ticket_dir(title, id);
        if !dir.is_dir() {
            warn!(path = %dir.display(), "ticket folder does not exist");
            return Ok(false);
        }
        self.opener.open(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(true)
    }

    /// Show the tickets root in the OS file browser.
    pub fn open_root(&self) -> Result<(), StoreError> {
        self.opener
            .open(&self.root)
            .map_err(|e| StoreError::io(&self.root, e))
    }
}

fn read_metadata(path: &Path) -> Result<Ticket, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Metadata as a raw JSON object, checked to hold a valid `Ticket`.
fn read_metadata_fields(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let json_err = |e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    };
    let value: Value = serde_json::from_str(&content).map_err(json_err)?;
    Ticket::deserialize(&value).map_err(json_err)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidTicket(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

/// Whatever object an existing ticket.json holds, or nothing. A missing or
/// broken file is simply replaced.
fn read_existing_fields(path: &Path) -> Map<String, Value> {
    match fs::read_to_string(path).map(|c| serde_json::from_str::<Value>(&c)) {
        Ok(Ok(Value::Object(map))) => map,
        Ok(_) => {
            debug!(path = %path.display(), "replacing unreadable ticket metadata");
            Map::new()
        }
        Err(_) => Map::new(),
    }
}

/// Whether two paths name the same directory entry, as on a
/// case-insensitive filesystem where `Foo-1` and `foo-1` coincide.
#[cfg(unix)]
fn same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}
