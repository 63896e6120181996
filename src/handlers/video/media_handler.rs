use std::time::Duration;

use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_record};
use crate::db::video_queries::VideoQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::video::{ConfirmUploadRequest, DownloadUrlResponse, MediaKind, UploadUrlRequest, UploadUrlResponse};
use crate::ok_or_return;
use crate::services::minio_service::{is_sha256_hex, media_object_key};
use crate::services::MinIOService;

const CLIP_PREFIX: &str = "clips";
const URL_EXPIRY_SECS: u64 = 3600;

/// Uploads for a clip must stay under its own folder for the given media kind.
fn belongs_to_clip(object_key: &str, clip_id: Uuid, kind: MediaKind) -> bool {
    let folder = match kind {
        MediaKind::Video => "video",
        MediaKind::Thumbnail => "thumbnail",
    };
    let prefix = format!("{}/{}/{}/", CLIP_PREFIX, clip_id, folder);
    object_key.starts_with(&prefix) && !object_key.contains("..")
}

#[tracing::instrument(name = "Clip upload URL", skip(pool, claims, body, minio_service), fields(username = %claims.username))]
pub async fn request_upload_url(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<UploadUrlRequest>,
    minio_service: web::Data<MinIOService>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = ok_or_return!(require_record(queries.find_clip(path.into_inner()).await, "Video clip not found"));

    let Some(extension) = body.file_extension.as_deref() else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("File extension is required")));
    };
    let object_key = match media_object_key(CLIP_PREFIX, clip.id, body.kind, extension) {
        Ok(key) => key,
        Err(message) => return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))),
    };
    let content_type = body.content_type.as_deref().unwrap_or("application/octet-stream");

    match minio_service
        .presigned_upload_url(&object_key, content_type, Duration::from_secs(URL_EXPIRY_SECS))
        .await
    {
        Ok(upload_url) => {
            tracing::info!("Generated upload URL for {}", object_key);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                "Upload URL generated successfully",
                UploadUrlResponse { upload_url, object_key, expires_in_secs: URL_EXPIRY_SECS },
            )))
        }
        Err(e) => {
            tracing::error!("Failed to generate upload URL: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to generate upload URL")))
        }
    }
}

/// Re-hashes the stored object and only attaches it to the clip when the
/// digest matches what the client announced. Mismatched uploads are removed.
#[tracing::instrument(name = "Confirm clip upload", skip(pool, claims, body, minio_service), fields(username = %claims.username))]
pub async fn confirm_upload(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<ConfirmUploadRequest>,
    minio_service: web::Data<MinIOService>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = ok_or_return!(require_record(queries.find_clip(path.into_inner()).await, "Video clip not found"));

    if !is_sha256_hex(&body.expected_hash) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "Invalid hash format - expected 64 character hex string",
        )));
    }
    if !belongs_to_clip(&body.object_key, clip.id, body.kind) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Object key does not belong to this clip")));
    }

    let actual_hash = match minio_service.object_sha256(&body.object_key).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!("Uploaded object {} not readable: {}", body.object_key, e);
            return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error(
                "File not found - upload may have failed",
            )));
        }
    };

    if !actual_hash.eq_ignore_ascii_case(&body.expected_hash) {
        tracing::warn!(
            "Hash mismatch for {}: expected {}, actual {}",
            body.object_key,
            body.expected_hash,
            actual_hash
        );
        if let Err(e) = minio_service.delete_file(&body.object_key).await {
            tracing::error!("Failed to remove rejected upload {}: {}", body.object_key, e);
        }
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Hash verification failed after upload")));
    }

    ok_or_return!(db_result(queries.set_clip_media(clip.id, body.kind, &body.object_key).await));
    let clip = ok_or_return!(require_record(queries.find_clip(clip.id).await, "Video clip not found"));
    tracing::info!("Upload {} confirmed for clip {}", body.object_key, clip.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Upload confirmed and verified successfully", clip)))
}

pub async fn download_url(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    minio_service: web::Data<MinIOService>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = ok_or_return!(require_record(queries.find_clip(path.into_inner()).await, "Video clip not found"));
    let Some(video_key) = clip.video_key else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("This clip has no uploaded video")));
    };

    match minio_service
        .presigned_download_url(&video_key, Duration::from_secs(URL_EXPIRY_SECS))
        .await
    {
        Ok(download_url) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Download URL generated successfully",
            DownloadUrlResponse { download_url, expires_in_secs: URL_EXPIRY_SECS },
        ))),
        Err(e) => {
            tracing::error!("Failed to generate download URL for {}: {}", video_key, e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to generate download URL")))
        }
    }
}
