use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::backup::{BackupError, DatabaseStatus, DeploymentGuard, StoredBackup};
use crate::config::backup::BackupSettings;
use crate::db::helpers::{db_result, validated};
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::ok_or_return;

#[derive(Debug, Deserialize, Default)]
pub struct CreateBackupRequest {
    pub label: Option<String>,
}

impl CreateBackupRequest {
    /// Labels become part of the file name, so only `[a-z0-9_-]` is accepted.
    /// No label means an unlabelled manual backup.
    pub fn label(&self) -> Result<Option<&str>, String> {
        let label = match self.label.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(label) => label,
        };
        if label.len() > 40
            || !label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err("Backup label may only contain a-z, 0-9, '_' and '-' (max 40)".into());
        }
        Ok(Some(label))
    }
}

#[derive(Debug, Serialize)]
pub struct BackupListing {
    pub deployment: Vec<StoredBackup>,
    pub persistent: Vec<StoredBackup>,
}

fn backup_error(e: BackupError) -> HttpResponse {
    tracing::error!("Backup operation failed: {}", e);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error(e.to_string()))
}

// GET /admin/database/status
pub async fn database_status(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let status = ok_or_return!(db_result(DatabaseStatus::collect(pool.get_ref()).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Database status", status)))
}

// GET /admin/backups
pub async fn list_backups(
    pool: web::Data<PgPool>,
    settings: web::Data<BackupSettings>,
) -> Result<HttpResponse> {
    let guard = DeploymentGuard::new(pool.get_ref().clone(), &settings);
    let deployment = guard.deployment_store().clone();
    let persistent = guard.persistent_store().clone();
    let listing = web::block(move || -> Result<BackupListing, BackupError> {
        Ok(BackupListing { deployment: deployment.list()?, persistent: persistent.list()? })
    })
    .await;
    match listing {
        Ok(Ok(listing)) => Ok(HttpResponse::Ok().json(ApiResponse::success("Backups", listing))),
        Ok(Err(e)) => Ok(backup_error(e)),
        Err(e) => {
            tracing::error!("Backup listing task failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to list backups")))
        }
    }
}

// POST /admin/backups
#[tracing::instrument(name = "Admin create backup", skip(pool, settings, claims, body), fields(admin = %claims.username))]
pub async fn create_backup(
    pool: web::Data<PgPool>,
    settings: web::Data<BackupSettings>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<CreateBackupRequest>>,
) -> Result<HttpResponse> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    let label = ok_or_return!(validated(request.label()));

    let guard = DeploymentGuard::new(pool.get_ref().clone(), &settings);
    match guard.create_backup(label).await {
        Ok(report) => {
            tracing::info!("Backup {} written ({} bytes)", report.backup.name, report.backup.size);
            Ok(HttpResponse::Created().json(ApiResponse::success("Backup created", report)))
        }
        Err(e) => Ok(backup_error(e)),
    }
}
