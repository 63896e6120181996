use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated, DbResult};
use crate::db::video_queries::VideoQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::video::{AppendClipRequest, HighlightReel, ReelClipsRequest, ReelDetail, ReelRequest};
use crate::ok_or_return;

async fn reel_detail(queries: &VideoQueries, reel: HighlightReel) -> DbResult<ReelDetail> {
    let clips = db_result(queries.reel_clips(reel.id).await)?;
    Ok(ReelDetail::new(reel, clips))
}

fn write_error(e: sqlx::Error) -> HttpResponse {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error("Unknown match"))
        }
        e => {
            tracing::error!("Highlight reel write failed: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
        }
    }
}

pub async fn list_reels(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let reels = ok_or_return!(db_result(VideoQueries::new(pool.get_ref().clone()).reels().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Highlight reels retrieved", reels)))
}

pub async fn get_reel(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let reel = ok_or_return!(require_record(queries.find_reel(path.into_inner()).await, "Highlight reel not found"));
    let detail = ok_or_return!(reel_detail(&queries, reel).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Highlight reel retrieved", detail)))
}

#[tracing::instrument(name = "Create highlight reel", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_reel(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<ReelRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let reel = match queries.create_reel(&body, claims.user_id()).await {
        Ok(reel) => reel,
        Err(e) => return Ok(write_error(e)),
    };
    let detail = ok_or_return!(reel_detail(&queries, reel).await);
    Ok(HttpResponse::Created().json(ApiResponse::success("Highlight reel created", detail)))
}

#[tracing::instrument(name = "Update highlight reel", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_reel(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<ReelRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let reel = match queries.update_reel(path.into_inner(), &body).await {
        Ok(Some(reel)) => reel,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("Highlight reel not found")));
        }
        Err(e) => return Ok(write_error(e)),
    };
    let detail = ok_or_return!(reel_detail(&queries, reel).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Highlight reel updated", detail)))
}

#[tracing::instrument(name = "Delete highlight reel", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_reel(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete_reel(path.into_inner()).await, "Highlight reel not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Highlight reel deleted")))
}

/// Replace the clip order in one go. Every clip id must exist.
#[tracing::instrument(name = "Reorder highlight reel", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn set_reel_clips(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<ReelClipsRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let reel = ok_or_return!(require_record(queries.find_reel(path.into_inner()).await, "Highlight reel not found"));

    let known = ok_or_return!(db_result(queries.count_clips(&body.clip_ids).await));
    if known != body.clip_ids.len() as i64 {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("One or more clips do not exist")));
    }

    ok_or_return!(db_result(queries.replace_reel_clips(reel.id, &body.clip_ids).await));
    let detail = ok_or_return!(reel_detail(&queries, reel).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Highlight reel clips updated", detail)))
}

#[tracing::instrument(name = "Append clip to reel", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn append_reel_clip(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<AppendClipRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let reel = ok_or_return!(require_record(queries.find_reel(path.into_inner()).await, "Highlight reel not found"));
    ok_or_return!(require_record(queries.find_clip(body.clip_id).await, "Video clip not found"));

    let added = ok_or_return!(db_result(queries.append_reel_clip(reel.id, body.clip_id).await));
    if !added {
        return Ok(HttpResponse::Conflict().json(ApiResponse::<()>::error("Clip is already in this reel")));
    }
    let detail = ok_or_return!(reel_detail(&queries, reel).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Clip added to highlight reel", detail)))
}
