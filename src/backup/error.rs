use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid backup JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Backup failed validation: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("Checksum mismatch for {0}")]
    ChecksumMismatch(PathBuf),
    #[error("Another restore is in progress (lock file {0})")]
    LockHeld(PathBuf),
    #[error("Backup file not found: {0}")]
    NotFound(PathBuf),
    #[error("Restore refused: {0}")]
    Refused(String),
    #[error("Backup references unknown table '{0}'")]
    UnknownModel(String),
    #[error("Backup file task did not finish: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BackupError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> BackupError {
        let path = path.into();
        move |source| BackupError::Io { path, source }
    }
}
