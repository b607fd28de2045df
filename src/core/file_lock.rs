//! flock(2)-based advisory locking for store and audit mutations.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// An exclusive advisory lock, released when dropped.
pub struct FileLock {
    _file: File,
}

impl FileLock {
    /// Block until the exclusive lock is held.
    pub fn exclusive(path: &Path) -> Result<Self> {
        let file = open_lock_file(path)?;
        file.lock_exclusive()
            .with_context(|| format!("acquire lock {}", path.display()))?;
        Ok(Self { _file: file })
    }

    /// Attempt the lock without blocking; `None` when another process holds it.
    pub fn try_exclusive(path: &Path) -> Result<Option<Self>> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            // fs2 on Linux may surface EAGAIN instead of WouldBlock
            Err(ref e) if e.raw_os_error() == Some(11) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("try lock {}", path.display())),
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("open lock file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exclusive_acquires() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lock");
        let lock = FileLock::exclusive(&path).unwrap();
        assert!(path.exists());
        drop(lock);
    }

    #[test]
    fn test_try_exclusive_contended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lock");
        let _held = FileLock::exclusive(&path).unwrap();
        assert!(FileLock::try_exclusive(&path).unwrap().is_none());
    }

    #[test]
    fn test_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.lock");
        {
            let _lock = FileLock::exclusive(&path).unwrap();
        }
        assert!(FileLock::try_exclusive(&path).unwrap().is_some());
    }
}
