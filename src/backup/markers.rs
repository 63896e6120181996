use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::backup::error::BackupError;

pub const PRODUCTION_MARKER: &str = "IS_PRODUCTION_ENVIRONMENT";
pub const PERMANENT_PRODUCTION_MARKER: &str = "PERMANENT_PRODUCTION_MARKER";
pub const SKIP_RESTORE_MARKER: &str = "SKIP_DB_RESTORE";
pub const PROTECTED_MARKER: &str = "DEPLOYMENT_PROTECTED";

/// Flag files kept in the deployment directory.
#[derive(Debug, Clone)]
pub struct Markers {
    dir: PathBuf,
}

impl Markers {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, marker: &str) -> PathBuf {
        self.dir.join(marker)
    }

    pub fn is_production(&self) -> bool {
        self.path(PRODUCTION_MARKER).exists() || self.path(PERMANENT_PRODUCTION_MARKER).exists()
    }

    pub fn skip_restore(&self) -> bool {
        self.path(SKIP_RESTORE_MARKER).exists()
    }

    pub fn mark_production(&self, at: DateTime<Utc>) -> Result<PathBuf, BackupError> {
        let text = format!(
            "This instance was marked as production on {}",
            at.format("%Y-%m-%d %H:%M:%S")
        );
        self.write(PRODUCTION_MARKER, &text)
    }

    pub fn mark_protected(&self, report: &str) -> Result<PathBuf, BackupError> {
        self.write(PROTECTED_MARKER, report)
    }

    pub fn read(&self, marker: &str) -> Option<String> {
        fs::read_to_string(self.path(marker)).ok().map(|s| s.trim().to_string())
    }

    fn write(&self, marker: &str, text: &str) -> Result<PathBuf, BackupError> {
        fs::create_dir_all(&self.dir).map_err(BackupError::io(&self.dir))?;
        let path = self.path(marker);
        fs::write(&path, text).map_err(BackupError::io(&path))?;
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::store::tests::scratch_dir;
    use chrono::TimeZone;

    #[test]
    fn production_is_detected_from_either_marker() {
        let dir = scratch_dir();
        let markers = Markers::new(&dir);
        assert!(!markers.is_production());

        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PERMANENT_PRODUCTION_MARKER), "").unwrap();
        assert!(markers.is_production());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn mark_production_records_the_date() {
        let dir = scratch_dir();
        let markers = Markers::new(&dir);
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap();
        markers.mark_production(at).unwrap();
        assert!(markers.is_production());
        assert_eq!(
            markers.read(PRODUCTION_MARKER).as_deref(),
            Some("This instance was marked as production on 2025-05-01 08:30:00")
        );
        assert!(!markers.skip_restore());
        let _ = fs::remove_dir_all(&dir);
    }
}
