use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::lineup_queries::LineupQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::lineup::{FormationRequest, FormationView};
use crate::ok_or_return;

pub async fn list_formations(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let formations = ok_or_return!(db_result(LineupQueries::new(pool.get_ref().clone()).formations().await));
    let formations: Vec<FormationView> = formations.into_iter().map(FormationView::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success("Formations retrieved", formations)))
}

pub async fn get_formation(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let formation = ok_or_return!(require_record(
        LineupQueries::new(pool.get_ref().clone()).find_formation(path.into_inner()).await,
        "Formation not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Formation retrieved", FormationView::from(formation))))
}

#[tracing::instrument(name = "Create formation", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_formation(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<FormationRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let formation = ok_or_return!(db_result(
        LineupQueries::new(pool.get_ref().clone()).create_formation(&body).await
    ));
    tracing::info!("Formation {} ({}) created", formation.name, formation.formation_structure);
    Ok(HttpResponse::Created().json(ApiResponse::success("Formation created successfully", FormationView::from(formation))))
}

#[tracing::instrument(name = "Update formation", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_formation(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<FormationRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let formation = ok_or_return!(require_record(
        LineupQueries::new(pool.get_ref().clone())
            .update_formation(path.into_inner(), &body)
            .await,
        "Formation not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Formation updated successfully", FormationView::from(formation))))
}

/// Lineups using the formation keep their players and lose the formation link.
#[tracing::instrument(name = "Delete formation", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_formation(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(require_affected(
        LineupQueries::new(pool.get_ref().clone()).delete_formation(path.into_inner()).await,
        "Formation not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Formation deleted successfully")))
}
