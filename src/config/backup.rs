use std::path::PathBuf;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct BackupSettings {
    pub root_dir: PathBuf,
    pub deployment_dir: String,
    pub persistent_dir: String,
    pub min_file_bytes: u64,
    pub min_teams: i64,
    pub min_players: i64,
    pub keep_per_label: usize,
    pub keep_manual: usize,
    pub lock_stale_after_secs: u64,
    /// Six-field cron expression for the scheduled persistent backup
    #[serde(default)]
    pub schedule: Option<String>,
}

impl BackupSettings {
    pub fn deployment_path(&self) -> PathBuf {
        self.root_dir.join(&self.deployment_dir)
    }

    pub fn persistent_path(&self) -> PathBuf {
        self.root_dir.join(&self.persistent_dir)
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            deployment_dir: "deployment".into(),
            persistent_dir: "persistent_backups".into(),
            min_file_bytes: 100,
            min_teams: 1,
            min_players: 5,
            keep_per_label: 2,
            keep_manual: 3,
            lock_stale_after_secs: 900,
            schedule: None,
        }
    }
}
