use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::io::lock::ArchiveLock;
use crate::io::store::StoreError;
use crate::model::ticket::{ArchiveLog, ArchivedTicket, Ticket};

/// Write `content` to `path` atomically using a temp file + rename.
///
/// The temp file is fsynced before the rename, so once this returns the
/// new content is durable and a reader never observes a partial file.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize `value` as 2-space pretty JSON and write it atomically.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    atomic_write(path, content.as_bytes()).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create an empty archive log if none exists yet.
pub fn init_archive_log(path: &Path) -> Result<(), StoreError> {
    if path.exists() {
        return Ok(());
    }
    write_json(path, &ArchiveLog::default()).map_err(|e| match e {
        StoreError::Io { path, source } => StoreError::Setup { path, source },
        other => other,
    })
}

/// Most backups kept side by side before giving up on a corrupt log.
const MAX_BACKUPS: usize = 100;

/// Read the archive log for display.
///
/// A missing file is an empty log, and so is an unparsable one (with a
/// warning); nothing is written. A log that exists but cannot be read is
/// an error.
pub fn read_archive_log(path: &Path) -> Result<ArchiveLog, StoreError> {
    let Some(content) = read_log_text(path)? else {
        return Ok(ArchiveLog::default());
    };
    match serde_json::from_str::<ArchiveLog>(&content) {
        Ok(log) => Ok(log),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "archive log is not valid JSON, showing it as empty");
            Ok(ArchiveLog::default())
        }
    }
}

fn read_log_text(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copy a corrupt log aside before it gets replaced. Never overwrites an
/// earlier backup: the first free name of `<name>.bak`, `<name>.bak.1`, ...
/// is used.
fn back_up_corrupt_log(path: &Path, content: &[u8]) -> Result<PathBuf, StoreError> {
    let io_err = |path: &Path, source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    for n in 0..MAX_BACKUPS {
        let bak = backup_path(path, n);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&bak) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_err(&bak, e)),
        };
        file.write_all(content)
            .and_then(|()| file.sync_all())
            .map_err(|e| io_err(&bak, e))?;
        return Ok(bak);
    }
    Err(io_err(
        path,
        io::Error::other(format!("{} backups already exist", MAX_BACKUPS)),
    ))
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    if n > 0 {
        name.push(format!(".{}", n));
    }
    path.with_file_name(name)
}

/// Append one snapshot to the archive log (read-modify-write under the
/// archive lock). Returns the stored entry.
///
/// A corrupt log is backed up first and then replaced by a fresh log; if
/// the backup cannot be written nothing is appended.
pub fn append_to_archive(
    path: &Path,
    ticket: &Ticket,
    archived_at: DateTime<Utc>,
) -> Result<ArchivedTicket, StoreError> {
    let _lock = ArchiveLock::acquire(path)?;

    let mut log = match read_log_text(path)? {
        None => ArchiveLog::default(),
        Some(content) => match serde_json::from_str::<ArchiveLog>(&content) {
            Ok(log) => log,
            Err(e) => {
                let bak = back_up_corrupt_log(path, content.as_bytes())?;
                warn!(
                    path = %path.display(),
                    backup = %bak.display(),
                    error = %e,
                    "archive log is not valid JSON, starting a new one"
                );
                ArchiveLog::default()
            }
        },
    };
    let entry = ArchivedTicket {
        ticket: ticket.clone(),
        archived_at,
    };
    log.tickets.push(entry.clone());
    write_json(path, &log)?;

    debug!(
        ticket_id = %ticket.id,
        entries = log.tickets.len(),
        "appended ticket to archive log"
    );
    Ok(entry)
}
