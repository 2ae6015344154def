use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// How long an archive append waits for another writer.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock serializing read-modify-write cycles on the archive log.
///
/// Held as an exclusive flock (Unix) on `<archive>.lock` next to the log.
/// Separate open handles conflict even inside one process, so concurrent
/// archive calls from different threads queue up behind each other as well.
/// The lock file is never removed: a waiter would otherwise end up holding
/// a lock on an unlinked inode while a newcomer locks a fresh file.
pub struct ArchiveLock {
    _file: File,
    lock_path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another archive write is in progress")]
    Timeout { path: PathBuf },
}

impl ArchiveLock {
    /// Lock the archive log at `archive_path`, waiting up to [`LOCK_TIMEOUT`].
    pub fn acquire(archive_path: &Path) -> Result<Self, LockError> {
        Self::acquire_within(archive_path, LOCK_TIMEOUT)
    }

    pub fn acquire_within(archive_path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let mut name = archive_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        let lock_path = archive_path.with_file_name(name);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + timeout;
        let mut waited = false;
        while try_lock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path: lock_path });
            }
            if !waited {
                debug!(path = %lock_path.display(), "waiting for archive lock");
                waited = true;
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
        Ok(ArchiveLock {
            _file: file,
            lock_path,
        })
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        // flock goes with the handle
        trace!(path = %self.lock_path.display(), "archive lock released");
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

// No flock outside Unix; the archive has a single writer there
#[cfg(not(unix))]
fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_file_sits_next_to_archive_and_survives_release() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("archive.json");

        drop(ArchiveLock::acquire(&archive).unwrap());
        assert!(tmp.path().join("archive.json.lock").is_file());
        assert!(ArchiveLock::acquire(&archive).is_ok());
    }

    #[test]
    fn missing_directory_is_a_create_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("nope/archive.json");
        assert!(matches!(
            ArchiveLock::acquire(&archive),
            Err(LockError::CreateError { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn second_holder_times_out() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("archive.json");

        let _held = ArchiveLock::acquire(&archive).unwrap();
        let second = ArchiveLock::acquire_within(&archive, Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn waiter_gets_lock_once_released() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("archive.json");

        let held = ArchiveLock::acquire(&archive).unwrap();
        let waiter = {
            let archive = archive.clone();
            std::thread::spawn(move || ArchiveLock::acquire(&archive).is_ok())
        };
        std::thread::sleep(Duration::from_millis(30));
        drop(held);
        assert!(waiter.join().unwrap());
    }
}
