use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;

use crate::backup::error::BackupError;

pub const LOCK_FILE: &str = ".restore.lock";

/// Exclusive guard around a restore. The lock file is removed when this is dropped.
#[derive(Debug)]
pub struct RestoreLock {
    path: PathBuf,
}

impl RestoreLock {
    pub fn acquire(dir: &Path, stale_after: Duration) -> Result<Self, BackupError> {
        fs::create_dir_all(dir).map_err(BackupError::io(dir))?;
        let path = dir.join(LOCK_FILE);

        match Self::create(&path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !Self::is_stale(&path, stale_after) {
                    return Err(BackupError::LockHeld(path));
                }
                tracing::warn!("Taking over stale restore lock {}", path.display());
                fs::remove_file(&path).map_err(BackupError::io(&path))?;
                Self::create(&path).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => BackupError::LockHeld(path.clone()),
                    _ => BackupError::Io { path: path.clone(), source: e },
                })
            }
            Err(source) => Err(BackupError::Io { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "pid={} acquired={}", std::process::id(), Utc::now().to_rfc3339())?;
        Ok(Self { path: path.to_path_buf() })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map_or(false, |age| age > stale_after)
    }
}

impl Drop for RestoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release restore lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::store::tests::scratch_dir;

    #[test]
    fn second_acquire_fails_until_release() {
        let dir = scratch_dir();
        let lock = RestoreLock::acquire(&dir, Duration::from_secs(900)).unwrap();
        assert!(lock.path().exists());
        assert!(matches!(
            RestoreLock::acquire(&dir, Duration::from_secs(900)),
            Err(BackupError::LockHeld(_))
        ));

        drop(lock);
        assert!(!dir.join(LOCK_FILE).exists());
        assert!(RestoreLock::acquire(&dir, Duration::from_secs(900)).is_ok());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_lock_is_taken_over() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(LOCK_FILE), "pid=1").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let lock = RestoreLock::acquire(&dir, Duration::from_millis(1));
        assert!(lock.is_ok());
        drop(lock);
        let _ = fs::remove_dir_all(&dir);
    }
}
