use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::backup::database::{self, DatabaseStatus, RestoreSummary};
use crate::backup::error::BackupError;
use crate::backup::fixture::Fixture;
use crate::backup::lock::RestoreLock;
use crate::backup::markers::{Markers, PRODUCTION_MARKER, PROTECTED_MARKER};
use crate::backup::policy::{BackupPolicy, Verdict};
use crate::backup::retention::RetentionPolicy;
use crate::backup::store::{BackupStore, StoredBackup};
use crate::config::backup::BackupSettings;

#[derive(Debug, Serialize)]
pub struct BackupReport {
    pub backup: StoredBackup,
    pub verdict: Verdict,
}

#[derive(Debug, Serialize)]
pub struct RestoreReport {
    pub source: PathBuf,
    pub verdict: Verdict,
    pub safety_backup: Option<StoredBackup>,
    pub summary: RestoreSummary,
}

#[derive(Debug)]
pub enum ProtectOutcome {
    NotProduction,
    /// Nothing worth protecting in the live database.
    EmptyDatabase { last_resort: StoredBackup },
    BackupSufficient { last_resort: StoredBackup, verdict: Verdict },
    Protected {
        last_resort: StoredBackup,
        protected_copy: Option<StoredBackup>,
        fresh: BackupReport,
    },
}

#[derive(Debug)]
pub enum AutoRestoreOutcome {
    Skipped,
    NoBackup,
    Restored(RestoreReport),
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub database: DatabaseStatus,
    pub production: bool,
    /// Contents of the production marker, e.g. when it was set.
    pub production_note: Option<String>,
    pub skip_restore: bool,
    /// Report left by the last deployment protection, if any.
    pub protection_report: Option<String>,
    pub deployment_backups: Vec<StoredBackup>,
    pub persistent_backups: Vec<StoredBackup>,
}

/// Everything that happens to the database around a deployment: backups before it,
/// protection of the outgoing data, restore afterwards.
pub struct DeploymentGuard {
    pool: PgPool,
    policy: BackupPolicy,
    deployment: BackupStore,
    persistent: BackupStore,
    markers: Markers,
    lock_stale_after: Duration,
}

impl DeploymentGuard {
    pub fn new(pool: PgPool, settings: &BackupSettings) -> Self {
        Self {
            pool,
            policy: BackupPolicy::from(settings),
            deployment: BackupStore::new(settings.deployment_path()),
            persistent: BackupStore::new(settings.persistent_path()),
            markers: Markers::new(settings.deployment_path()),
            lock_stale_after: Duration::from_secs(settings.lock_stale_after_secs),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn deployment_store(&self) -> &BackupStore {
        &self.deployment
    }

    pub fn persistent_store(&self) -> &BackupStore {
        &self.persistent
    }

    /// Timestamped backup in the persistent directory.
    #[tracing::instrument(name = "Create persistent backup", skip(self))]
    pub async fn create_backup(&self, label: Option<&str>) -> Result<BackupReport, BackupError> {
        let fixture = database::dump(&self.pool).await?;
        let (backup, fixture) = save_off_runtime(&self.persistent, label, fixture, Utc::now()).await?;
        Ok(self.report(backup, &fixture))
    }

    /// Timestamped backup in the deployment directory, also published as `deployment_db.json`.
    /// A thin backup is reported but still written.
    #[tracing::instrument(name = "Create deployment backup", skip(self))]
    pub async fn create_deployment_backup(&self, name: Option<&str>) -> Result<BackupReport, BackupError> {
        let fixture = database::dump(&self.pool).await?;
        self.write_deployment_backup(name, fixture, Utc::now()).await
    }

    async fn write_deployment_backup(
        &self,
        name: Option<&str>,
        fixture: Fixture,
        at: DateTime<Utc>,
    ) -> Result<BackupReport, BackupError> {
        let store = self.deployment.clone();
        let label = name.unwrap_or("deployment").to_string();
        let (backup, fixture) = tokio::task::spawn_blocking(move || {
            let backup = store.save(Some(&label), &fixture, at)?;
            store.publish_latest(&backup)?;
            Ok::<_, BackupError>((backup, fixture))
        })
        .await??;
        Ok(self.report(backup, &fixture))
    }

    fn report(&self, backup: StoredBackup, fixture: &Fixture) -> BackupReport {
        let verdict = self.policy.check(backup.size, fixture);
        if verdict.is_valid() {
            tracing::info!("Backup {} holds {}", backup.name, verdict.summary());
        } else {
            tracing::warn!("Backup {} is below the restore threshold: {}", backup.name, verdict.problems.join("; "));
        }
        BackupReport { backup, verdict }
    }

    pub fn verify(&self, path: &Path) -> Result<Verdict, BackupError> {
        let (size, fixture) = self.deployment.load(path)?;
        Ok(self.policy.check(size, &fixture))
    }

    async fn load_off_runtime(&self, path: &Path) -> Result<(u64, Fixture), BackupError> {
        let store = self.deployment.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || store.load(&path)).await?
    }

    /// Protect production data before a deployment replaces the outgoing backup.
    #[tracing::instrument(name = "Protect deployment", skip(self))]
    pub async fn protect(&self) -> Result<ProtectOutcome, BackupError> {
        if !self.markers.is_production() {
            tracing::info!("Not a production environment, nothing to protect");
            return Ok(ProtectOutcome::NotProduction);
        }

        let now = Utc::now();
        let live = DatabaseStatus::collect(&self.pool).await?;
        let fixture = database::dump(&self.pool).await?;
        let (last_resort, fixture) = save_off_runtime(&self.persistent, Some("last_resort"), fixture, now).await?;

        if !live.has_club_data() {
            return Ok(ProtectOutcome::EmptyDatabase { last_resort });
        }

        let alias = self.deployment.latest_path();
        let current = if alias.exists() {
            match self.load_off_runtime(&alias).await {
                Ok((size, previous)) => Some(self.policy.check(size, &previous)),
                Err(e) => {
                    tracing::warn!("Existing deployment backup is unreadable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Some(verdict) = current.as_ref().filter(|v| v.is_valid() && !v.would_reduce(&live)) {
            return Ok(ProtectOutcome::BackupSufficient { last_resort, verdict: verdict.clone() });
        }

        let protected_copy = if alias.exists() {
            let name = format!("protected_deployment_{}.json", now.format("%Y%m%d_%H%M%S"));
            let store = self.deployment.clone();
            Some(tokio::task::spawn_blocking(move || store.copy_as(&alias, &name)).await??)
        } else {
            None
        };
        let fresh = self.write_deployment_backup(None, fixture, now).await?;
        self.markers
            .mark_protected(&protection_report(now, &live, current.as_ref(), &fresh.verdict))?;
        tracing::warn!("Deployment backup replaced with current production data");

        Ok(ProtectOutcome::Protected { last_resort, protected_copy, fresh })
    }

    /// Restore the freshest deployment backup after a deploy.
    #[tracing::instrument(name = "Auto restore", skip(self))]
    pub async fn auto_restore(&self) -> Result<AutoRestoreOutcome, BackupError> {
        if self.markers.skip_restore() {
            tracing::info!("Restore disabled by marker, skipping");
            return Ok(AutoRestoreOutcome::Skipped);
        }
        let store = self.deployment.clone();
        let min_file_bytes = self.policy.min_file_bytes;
        let candidate = tokio::task::spawn_blocking(move || choose_restore_candidate(&store, min_file_bytes)).await??;
        let candidate = match candidate {
            Some(candidate) => candidate,
            None => {
                tracing::warn!("No deployment backup found in {}", self.deployment.dir().display());
                return Ok(AutoRestoreOutcome::NoBackup);
            }
        };

        let report = self.restore_with_label(&candidate.path, "pre_auto_restore").await?;
        self.markers.mark_production(Utc::now())?;
        Ok(AutoRestoreOutcome::Restored(report))
    }

    /// Validated, locked and transactional restore of `path`.
    pub async fn restore_file(&self, path: &Path) -> Result<RestoreReport, BackupError> {
        self.restore_with_label(path, "pre_restore").await
    }

    pub async fn restore_deployment(&self) -> Result<RestoreReport, BackupError> {
        self.restore_file(&self.deployment.latest_path()).await
    }

    #[tracing::instrument(name = "Restore backup file", skip(self), fields(path = %path.display()))]
    async fn restore_with_label(&self, path: &Path, safety_label: &str) -> Result<RestoreReport, BackupError> {
        let (size, fixture) = self.load_off_runtime(path).await?;
        let verdict = self.policy.check(size, &fixture);
        if !verdict.is_valid() {
            return Err(BackupError::Invalid(verdict.problems));
        }

        let lock_dir = self.deployment.dir().to_path_buf();
        let stale_after = self.lock_stale_after;
        let _lock = tokio::task::spawn_blocking(move || RestoreLock::acquire(&lock_dir, stale_after)).await??;

        let live = DatabaseStatus::collect(&self.pool).await?;
        if self.markers.is_production() && verdict.would_reduce(&live) {
            return Err(BackupError::Refused(format!(
                "backup has {} teams and {} players but the database has {} and {}",
                verdict.teams, verdict.players, live.teams, live.players
            )));
        }

        let safety_backup = if live.is_empty() {
            None
        } else {
            let current = database::dump(&self.pool).await?;
            Some(save_off_runtime(&self.persistent, Some(safety_label), current, Utc::now()).await?.0)
        };

        let summary = database::restore(&self.pool, &fixture).await?;
        Ok(RestoreReport {
            source: path.to_path_buf(),
            verdict,
            safety_backup,
            summary,
        })
    }

    pub async fn cleanup(&self, retention: RetentionPolicy) -> Result<Vec<PathBuf>, BackupError> {
        let persistent = self.persistent.clone();
        let deployment = self.deployment.clone();
        tokio::task::spawn_blocking(move || {
            let mut removed = retention.apply(&persistent)?;
            removed.extend(retention.apply(&deployment)?);
            Ok::<_, BackupError>(removed)
        })
        .await?
    }

    pub async fn status(&self) -> Result<StatusReport, BackupError> {
        let database = DatabaseStatus::collect(&self.pool).await?;
        let markers = self.markers.clone();
        let deployment = self.deployment.clone();
        let persistent = self.persistent.clone();
        tokio::task::spawn_blocking(move || {
            Ok::<_, BackupError>(StatusReport {
                database,
                production: markers.is_production(),
                production_note: markers.read(PRODUCTION_MARKER),
                skip_restore: markers.skip_restore(),
                protection_report: markers.read(PROTECTED_MARKER),
                deployment_backups: deployment.list()?,
                persistent_backups: persistent.list()?,
            })
        })
        .await?
    }
}

/// `BackupStore::save` on the blocking pool; the fixture is handed back for reporting.
async fn save_off_runtime(
    store: &BackupStore,
    label: Option<&str>,
    fixture: Fixture,
    at: DateTime<Utc>,
) -> Result<(StoredBackup, Fixture), BackupError> {
    let store = store.clone();
    let label = label.map(str::to_owned);
    tokio::task::spawn_blocking(move || {
        let backup = store.save(label.as_deref(), &fixture, at)?;
        Ok::<_, BackupError>((backup, fixture))
    })
    .await?
}

/// `deployment_db.json` when it is large enough, otherwise the newest JSON file.
pub fn choose_restore_candidate(store: &BackupStore, min_file_bytes: u64) -> Result<Option<StoredBackup>, BackupError> {
    let backups = store.list()?;
    if let Some(alias) = backups
        .iter()
        .find(|b| b.path == store.latest_path() && b.size >= min_file_bytes)
    {
        return Ok(Some(alias.clone()));
    }
    Ok(backups.into_iter().find(|b| b.path != store.latest_path()))
}

fn protection_report(at: DateTime<Utc>, live: &DatabaseStatus, previous: Option<&Verdict>, fresh: &Verdict) -> String {
    let previous = match previous {
        Some(verdict) => verdict.summary(),
        None => "missing or unreadable".to_string(),
    };
    format!(
        "Deployment protection applied on {}\n\
         Database: {} teams, {} players, {} matches, {} users\n\
         Previous deployment backup: {}\n\
         New deployment backup: {}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        live.teams,
        live.players,
        live.matches,
        live.users,
        previous,
        fresh.summary()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::store::{tests::scratch_dir, LATEST_ALIAS};

    #[test]
    fn alias_wins_when_large_enough() {
        let store = BackupStore::new(scratch_dir());
        store.write("backup_deployment_20250101_000000.json", &[b' '; 200]).unwrap();
        store.write(LATEST_ALIAS, &[b' '; 200]).unwrap();
        let chosen = choose_restore_candidate(&store, 100).unwrap().unwrap();
        assert_eq!(chosen.name, LATEST_ALIAS);
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[test]
    fn tiny_alias_falls_back_to_newest_file() {
        let store = BackupStore::new(scratch_dir());
        store.write(LATEST_ALIAS, b"[]").unwrap();
        store.write("backup_deployment_20250101_000000.json", &[b' '; 200]).unwrap();
        let chosen = choose_restore_candidate(&store, 100).unwrap().unwrap();
        assert_eq!(chosen.name, "backup_deployment_20250101_000000.json");
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[test]
    fn empty_directory_has_no_candidate() {
        let store = BackupStore::new(scratch_dir());
        assert!(choose_restore_candidate(&store, 100).unwrap().is_none());
    }

    #[test]
    fn report_mentions_live_counts() {
        let live = DatabaseStatus { teams: 2, players: 30, matches: 12, users: 4, ..DatabaseStatus::default() };
        let fresh = BackupPolicy::default().check(10_000, &Fixture::default());
        let text = protection_report(Utc::now(), &live, None, &fresh);
        assert!(text.contains("Database: 2 teams, 30 players, 12 matches, 4 users"));
        assert!(text.contains("Previous deployment backup: missing or unreadable"));
    }
}
