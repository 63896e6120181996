use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;

use crate::db::helpers::{db_result, require_record};
use crate::db::stats_queries::StatsQueries;
use crate::db::team_queries::TeamQueries;
use crate::middleware::auth::{require_approved, Claims};
use crate::models::common::ApiResponse;
use crate::models::stats::{MatrixQuery, PlayerMatrix};
use crate::ok_or_return;

pub async fn player_stats(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let rows = ok_or_return!(db_result(StatsQueries::new(pool.get_ref().clone()).player_stats().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player statistics", rows)))
}

pub async fn match_stats(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let rows = ok_or_return!(db_result(StatsQueries::new(pool.get_ref().clone()).team_records().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match statistics", rows)))
}

pub async fn player_matrix(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<MatrixQuery>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let teams = TeamQueries::new(pool.get_ref().clone());
    ok_or_return!(require_record(teams.find(query.team_id).await, "Team not found"));

    let stats = StatsQueries::new(pool.get_ref().clone());
    let players = ok_or_return!(db_result(stats.team_players(query.team_id).await));
    let squads = ok_or_return!(db_result(stats.team_squads(query.team_id).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player matrix", PlayerMatrix::build(players, &squads))))
}
