use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated, DbResult};
use crate::db::video_queries::VideoQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::video::{ClipQuery, ClipRequest, ClipView, VideoClip};
use crate::ok_or_return;

async fn clip_view(queries: &VideoQueries, clip: VideoClip) -> DbResult<ClipView> {
    let player_ids = db_result(queries.clip_players(clip.id).await)?;
    Ok(ClipView { formatted_game_time: clip.formatted_game_time(), clip, player_ids })
}

fn write_error(e: sqlx::Error) -> HttpResponse {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error("Unknown match session or player"))
        }
        e => {
            tracing::error!("Video clip write failed: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
        }
    }
}

pub async fn list_clips(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<ClipQuery>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clips = ok_or_return!(db_result(queries.clips(&query).await));

    let mut views = Vec::with_capacity(clips.len());
    for clip in clips {
        views.push(ok_or_return!(clip_view(&queries, clip).await));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success("Video clips retrieved", views)))
}

pub async fn get_clip(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = ok_or_return!(require_record(queries.find_clip(path.into_inner()).await, "Video clip not found"));
    let view = ok_or_return!(clip_view(&queries, clip).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Video clip retrieved", view)))
}

#[tracing::instrument(name = "Create video clip", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_clip(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<ClipRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = match queries.create_clip(&body, claims.user_id()).await {
        Ok(clip) => clip,
        Err(e) => return Ok(write_error(e)),
    };
    tracing::info!("Video clip {} created for session {}", clip.id, clip.match_session_id);
    let view = ok_or_return!(clip_view(&queries, clip).await);
    Ok(HttpResponse::Created().json(ApiResponse::success("Video clip created", view)))
}

#[tracing::instrument(name = "Update video clip", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_clip(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<ClipRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = VideoQueries::new(pool.get_ref().clone());
    let clip = match queries.update_clip(path.into_inner(), &body).await {
        Ok(Some(clip)) => clip,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("Video clip not found")));
        }
        Err(e) => return Ok(write_error(e)),
    };
    let view = ok_or_return!(clip_view(&queries, clip).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Video clip updated", view)))
}

#[tracing::instrument(name = "Delete video clip", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_clip(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = VideoQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete_clip(path.into_inner()).await, "Video clip not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Video clip deleted")))
}
