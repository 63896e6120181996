use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::team_queries::TeamQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::team::{TeamDetail, TeamRequest};
use crate::ok_or_return;

pub async fn list_teams(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let teams = ok_or_return!(db_result(TeamQueries::new(pool.get_ref().clone()).list().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Teams retrieved", teams)))
}

pub async fn get_team(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let team_id = path.into_inner();
    let queries = TeamQueries::new(pool.get_ref().clone());
    let team = ok_or_return!(require_record(queries.find(team_id).await, "Team not found"));
    let matches = ok_or_return!(db_result(queries.matches(team_id).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Team retrieved", TeamDetail { team, matches })))
}

#[tracing::instrument(name = "Create team", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_team(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<TeamRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let team = ok_or_return!(db_result(TeamQueries::new(pool.get_ref().clone()).create(&body).await));
    tracing::info!("Team {} created", team.id);
    Ok(HttpResponse::Created().json(ApiResponse::success("Team created successfully", team)))
}

#[tracing::instrument(name = "Update team", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_team(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<TeamRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = TeamQueries::new(pool.get_ref().clone());
    let team = ok_or_return!(require_record(queries.update(path.into_inner(), &body).await, "Team not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Team updated successfully", team)))
}

#[tracing::instrument(name = "Delete team", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_team(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let team_id = path.into_inner();
    let queries = TeamQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete(team_id).await, "Team not found"));
    tracing::info!("Team {} deleted", team_id);
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Team deleted successfully")))
}
