use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::backup::error::BackupError;
use crate::backup::store::{BackupStore, StoredBackup};
use crate::config::backup::BackupSettings;

/// Keeps the newest `keep_per_label` backups of each label and the newest
/// `keep_manual` unlabelled ones. Files the store did not name are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_per_label: usize,
    pub keep_manual: usize,
}

impl From<&BackupSettings> for RetentionPolicy {
    fn from(settings: &BackupSettings) -> Self {
        Self {
            keep_per_label: settings.keep_per_label,
            keep_manual: settings.keep_manual,
        }
    }
}

impl RetentionPolicy {
    pub fn select_for_removal<'a>(&self, backups: &'a [StoredBackup]) -> Vec<&'a StoredBackup> {
        let mut groups: BTreeMap<Option<&str>, Vec<&StoredBackup>> = BTreeMap::new();
        for backup in backups.iter().filter(|b| b.is_managed()) {
            groups.entry(backup.label.as_deref()).or_default().push(backup);
        }

        let mut doomed = Vec::new();
        for (label, mut group) in groups {
            group.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
            let keep = if label.is_some() { self.keep_per_label } else { self.keep_manual };
            doomed.extend(group.into_iter().skip(keep));
        }
        doomed
    }

    #[tracing::instrument(name = "Apply backup retention", skip(self, store), fields(dir = %store.dir().display()))]
    pub fn apply(&self, store: &BackupStore) -> Result<Vec<PathBuf>, BackupError> {
        let backups = store.list()?;
        let mut removed = Vec::new();
        for backup in self.select_for_removal(&backups) {
            store.remove(backup)?;
            tracing::info!("Removed old backup {}", backup.name);
            removed.push(backup.path.clone());
        }
        Ok(removed)
    }
}
