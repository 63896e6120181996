use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::lineup_queries::LineupQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::lineup::LineupPositionRequest;
use crate::ok_or_return;

pub async fn list_positions(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let positions = ok_or_return!(db_result(LineupQueries::new(pool.get_ref().clone()).positions().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Positions retrieved", positions)))
}

#[tracing::instrument(name = "Create lineup position", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_position(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<LineupPositionRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let position = ok_or_return!(db_result(
        LineupQueries::new(pool.get_ref().clone()).create_position(&body).await
    ));
    Ok(HttpResponse::Created().json(ApiResponse::success("Position created successfully", position)))
}

#[tracing::instrument(name = "Update lineup position", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_position(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<LineupPositionRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let position = ok_or_return!(require_record(
        LineupQueries::new(pool.get_ref().clone())
            .update_position(path.into_inner(), &body)
            .await,
        "Position not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Position updated successfully", position)))
}

#[tracing::instrument(name = "Delete lineup position", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_position(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(require_affected(
        LineupQueries::new(pool.get_ref().clone()).delete_position(path.into_inner()).await,
        "Position not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Position deleted successfully")))
}

/// Adds the standard GK to ST catalogue, skipping short names already present.
#[tracing::instrument(name = "Create default positions", skip(pool, claims), fields(username = %claims.username))]
pub async fn create_default_positions(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let added = ok_or_return!(db_result(
        LineupQueries::new(pool.get_ref().clone()).insert_default_positions().await
    ));
    tracing::info!("Added {} default lineup positions", added);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Added {} default positions", added),
        json!({ "added": added }),
    )))
}
