use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::player_queries::PlayerQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::player::{PlayerDetail, PlayerQuery, PlayerRequest};
use crate::ok_or_return;

pub async fn list_players(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<PlayerQuery>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let players = ok_or_return!(db_result(PlayerQueries::new(pool.get_ref().clone()).list(query.active).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Players retrieved", players)))
}

pub async fn get_player(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let player_id = path.into_inner();
    let queries = PlayerQueries::new(pool.get_ref().clone());
    let player = ok_or_return!(require_record(queries.find(player_id).await, "Player not found"));
    let appearances = ok_or_return!(db_result(queries.appearances(player_id).await));
    let detail = PlayerDetail {
        display_name: player.display_name(),
        player,
        appearances,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player retrieved", detail)))
}

#[tracing::instrument(name = "Create player", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_player(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<PlayerRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let player = ok_or_return!(db_result(PlayerQueries::new(pool.get_ref().clone()).create(&body).await));
    tracing::info!("Player {} created", player.id);
    Ok(HttpResponse::Created().json(ApiResponse::success("Player created successfully", player)))
}

#[tracing::instrument(name = "Update player", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_player(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<PlayerRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = PlayerQueries::new(pool.get_ref().clone());
    let player = ok_or_return!(require_record(queries.update(path.into_inner(), &body).await, "Player not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player updated successfully", player)))
}

#[tracing::instrument(name = "Delete player", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_player(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = PlayerQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete(path.into_inner()).await, "Player not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Player deleted successfully")))
}
