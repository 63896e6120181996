use std::error::Error;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::backup::{DeploymentGuard, RetentionPolicy};
use crate::config::backup::BackupSettings;

/// Label given to backups written by the cron job.
pub const SCHEDULED_LABEL: &str = "scheduled";

pub struct SchedulerService {
    scheduler: Arc<Mutex<JobScheduler>>,
    pool: PgPool,
    settings: BackupSettings,
}

impl SchedulerService {
    pub async fn new(pool: PgPool, settings: BackupSettings) -> Result<Self, Box<dyn Error>> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            pool,
            settings,
        })
    }

    pub async fn start(&self) -> Result<(), Box<dyn Error>> {
        if let Some(cron_expr) = self.settings.schedule.clone() {
            self.schedule_backups(&cron_expr).await?;
        }
        let scheduler = self.scheduler.lock().await;
        scheduler.start().await?;
        tracing::info!("Scheduler service started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), Box<dyn Error>> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;
        tracing::info!("Scheduler service stopped");
        Ok(())
    }

    /// Write a labelled persistent backup on `cron_expr`, then prune old ones.
    pub async fn schedule_backups(&self, cron_expr: &str) -> Result<(), JobSchedulerError> {
        let pool = self.pool.clone();
        let settings = self.settings.clone();

        let job = Job::new_async(cron_expr, move |_uuid, _l| {
            let pool = pool.clone();
            let settings = settings.clone();
            Box::pin(async move {
                let guard = DeploymentGuard::new(pool, &settings);
                match guard.create_backup(Some(SCHEDULED_LABEL)).await {
                    Ok(report) => {
                        tracing::info!(
                            "Scheduled backup {} written: {}",
                            report.backup.name,
                            report.verdict.summary()
                        );
                        if !report.verdict.is_valid() {
                            tracing::warn!("Scheduled backup failed validation: {:?}", report.verdict.problems);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Scheduled backup failed: {}", e);
                        return;
                    }
                }
                match guard.cleanup(RetentionPolicy::from(&settings)).await {
                    Ok(removed) if !removed.is_empty() => {
                        tracing::info!("Retention removed {} old backups", removed.len());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Backup retention failed: {}", e),
                }
            })
        })?;

        let scheduler = self.scheduler.lock().await;
        scheduler.add(job).await?;
        tracing::info!("Scheduled database backups ({})", cron_expr);
        Ok(())
    }
}
