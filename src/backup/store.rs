use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backup::error::BackupError;
use crate::backup::fixture::Fixture;

/// Stable alias pointing at the most recent deployment backup.
pub const LATEST_ALIAS: &str = "deployment_db.json";
const CHECKSUM_SUFFIX: &str = ".sha256";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Attempts at a free `_N` suffix before giving up on a save.
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct StoredBackup {
    pub path: PathBuf,
    pub name: String,
    /// `None` for unlabelled (manual) backups and for files not named by the store.
    pub label: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub size: u64,
    #[serde(skip)]
    pub modified: SystemTime,
}

impl StoredBackup {
    /// True for `backup_*` files written by [`BackupStore::save`].
    pub fn is_managed(&self) -> bool {
        self.created.is_some()
    }
}

/// `backup_[label_]YYYYmmdd_HHMMSS.json`
pub fn backup_file_name(label: Option<&str>, at: DateTime<Utc>) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT);
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        Some(label) => format!("backup_{}_{}.json", label, stamp),
        None => format!("backup_{}.json", stamp),
    }
}

/// `backup_file_name` with `_N` before the extension, for saves within the same second.
fn numbered_file_name(label: Option<&str>, at: DateTime<Utc>, attempt: u32) -> String {
    let name = backup_file_name(label, at);
    if attempt < 2 {
        return name;
    }
    match name.strip_suffix(".json") {
        Some(stem) => format!("{}_{}.json", stem, attempt),
        None => name,
    }
}

/// Inverse of [`backup_file_name`]. A trailing `_N` collision suffix is accepted.
pub fn parse_backup_name(name: &str) -> Option<(Option<String>, NaiveDateTime)> {
    let stem = name.strip_prefix("backup_")?.strip_suffix(".json")?;
    parse_backup_stem(stem).or_else(|| {
        let (head, counter) = stem.rsplit_once('_')?;
        if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parse_backup_stem(head)
    })
}

fn parse_backup_stem(stem: &str) -> Option<(Option<String>, NaiveDateTime)> {
    // Timestamp is the trailing 15 characters
    if stem.len() < 15 || !stem.is_char_boundary(stem.len() - 15) {
        return None;
    }
    let (head, stamp) = stem.split_at(stem.len() - 15);
    let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    let label = match head {
        "" => None,
        head => Some(head.strip_suffix('_')?.to_string()),
    };
    Some((label, created))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(CHECKSUM_SUFFIX);
    path.with_file_name(name)
}

/// A directory of JSON backups. Every write lands via a temp file and rename,
/// with a `.sha256` sidecar next to it.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn latest_path(&self) -> PathBuf {
        self.path_of(LATEST_ALIAS)
    }

    pub fn ensure_dir(&self) -> Result<(), BackupError> {
        fs::create_dir_all(&self.dir).map_err(BackupError::io(&self.dir))
    }

    /// Store `fixture` under a fresh timestamped name. An existing backup is never replaced.
    #[tracing::instrument(name = "Save backup", skip(self, fixture), fields(dir = %self.dir.display()))]
    pub fn save(&self, label: Option<&str>, fixture: &Fixture, at: DateTime<Utc>) -> Result<StoredBackup, BackupError> {
        let first = self.path_of(&backup_file_name(label, at));
        let bytes = fixture
            .to_vec_pretty()
            .map_err(|source| BackupError::Json { path: first.clone(), source })?;
        self.ensure_dir()?;

        let temp = write_temp(&first, &bytes)?;
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let target = self.path_of(&numbered_file_name(label, at, attempt));
            match fs::hard_link(&temp, &target) {
                Ok(()) => {
                    let _ = fs::remove_file(&temp);
                    atomic_write(&checksum_path(&target), sha256_hex(&bytes).as_bytes())?;
                    tracing::info!("Wrote backup {} ({} bytes)", target.display(), bytes.len());
                    return self.describe(&target);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    let _ = fs::remove_file(&temp);
                    return Err(BackupError::Io { path: target, source });
                }
            }
        }
        let _ = fs::remove_file(&temp);
        Err(BackupError::Io {
            path: first,
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free backup name for this second"),
        })
    }

    /// Write `bytes` under `name` atomically and record its checksum.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<StoredBackup, BackupError> {
        self.ensure_dir()?;
        let target = self.path_of(name);
        atomic_write(&target, bytes)?;
        atomic_write(&checksum_path(&target), sha256_hex(bytes).as_bytes())?;
        tracing::info!("Wrote backup {} ({} bytes)", target.display(), bytes.len());
        self.describe(&target)
    }

    /// Point the stable alias at `source`.
    pub fn publish_latest(&self, source: &StoredBackup) -> Result<StoredBackup, BackupError> {
        let bytes = self.read(&source.path)?;
        self.write(LATEST_ALIAS, &bytes)
    }

    /// Copy `source` under a new name in this store, as-is and without checksum verification.
    pub fn copy_as(&self, source: &Path, name: &str) -> Result<StoredBackup, BackupError> {
        let bytes = fs::read(source).map_err(BackupError::io(source))?;
        self.write(name, &bytes)
    }

    /// Read a backup, verifying it against its sidecar checksum when one exists.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, BackupError> {
        if !path.exists() {
            return Err(BackupError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(BackupError::io(path))?;
        let sidecar = checksum_path(path);
        if sidecar.exists() {
            let expected = fs::read_to_string(&sidecar).map_err(BackupError::io(&sidecar))?;
            if expected.trim() != sha256_hex(&bytes) {
                return Err(BackupError::ChecksumMismatch(path.to_path_buf()));
            }
        }
        Ok(bytes)
    }

    pub fn load(&self, path: &Path) -> Result<(u64, Fixture), BackupError> {
        let bytes = self.read(path)?;
        let fixture = Fixture::from_slice(&bytes).map_err(|source| BackupError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((bytes.len() as u64, fixture))
    }

    /// All `*.json` files, newest first. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<StoredBackup>, BackupError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(BackupError::io(&self.dir))? {
            let entry = entry.map_err(BackupError::io(&self.dir))?;
            let path = entry.path();
            let is_json = path.extension().map_or(false, |ext| ext == "json");
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |n| n.starts_with('.'));
            if is_json && !is_temp && path.is_file() {
                backups.push(self.describe(&path)?);
            }
        }
        backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.created.cmp(&a.created)));
        Ok(backups)
    }

    pub fn remove(&self, backup: &StoredBackup) -> Result<(), BackupError> {
        fs::remove_file(&backup.path).map_err(BackupError::io(&backup.path))?;
        let sidecar = checksum_path(&backup.path);
        if sidecar.exists() {
            fs::remove_file(&sidecar).map_err(BackupError::io(&sidecar))?;
        }
        Ok(())
    }

    fn describe(&self, path: &Path) -> Result<StoredBackup, BackupError> {
        let metadata = fs::metadata(path).map_err(BackupError::io(path))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let (label, created) = match parse_backup_name(&name) {
            Some((label, created)) => (label, Some(created)),
            None => (None, None),
        };
        Ok(StoredBackup {
            path: path.to_path_buf(),
            name,
            label,
            created,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

/// Fully written and synced hidden sibling of `target`.
fn write_temp(target: &Path, bytes: &[u8]) -> Result<PathBuf, BackupError> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("backup");
    let temp = target.with_file_name(format!(".{}.tmp-{}", file_name, Uuid::new_v4().simple()));

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    match result {
        Ok(()) => Ok(temp),
        Err(source) => {
            let _ = fs::remove_file(&temp);
            Err(BackupError::Io { path: target.to_path_buf(), source })
        }
    }
}

fn atomic_write(target: &Path, bytes: &[u8]) -> Result<(), BackupError> {
    let temp = write_temp(target, bytes)?;
    if let Err(source) = fs::rename(&temp, target) {
        let _ = fs::remove_file(&temp);
        return Err(BackupError::Io { path: target.to_path_buf(), source });
    }
    Ok(())
}
