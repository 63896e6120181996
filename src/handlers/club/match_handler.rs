use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::match_queries::MatchQueries;
use crate::db::team_queries::TeamQueries;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::appearance::AppearanceStatsRequest;
use crate::models::common::ApiResponse;
use crate::models::football_match::{MatchDetail, MatchPlayersRequest, MatchRequest, MatchView, ScoreUpdateRequest};
use crate::ok_or_return;

pub async fn list_matches(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let matches = ok_or_return!(db_result(MatchQueries::new(pool.get_ref().clone()).list(None).await));
    let views: Vec<MatchView> = matches.into_iter().map(MatchView::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success("Matches retrieved", views)))
}

pub async fn get_match(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let match_id = path.into_inner();
    let queries = MatchQueries::new(pool.get_ref().clone());
    let fixture = ok_or_return!(require_record(queries.find(match_id).await, "Match not found"));
    let appearances = ok_or_return!(db_result(queries.appearances(match_id).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Match retrieved",
        MatchDetail { view: MatchView::from(fixture), appearances },
    )))
}

#[tracing::instrument(name = "Create match", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_match(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<MatchRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));

    let teams = TeamQueries::new(pool.get_ref().clone());
    ok_or_return!(require_record(teams.find(body.smoras_team_id).await, "Team not found"));

    let queries = MatchQueries::new(pool.get_ref().clone());
    if let Some(template_id) = body.template_match_id {
        ok_or_return!(require_record(queries.find(template_id).await, "Template match not found"));
    }

    let match_id = ok_or_return!(db_result(queries.create(&body).await));
    let fixture = ok_or_return!(require_record(queries.find(match_id).await, "Match not found"));
    tracing::info!("Match {} created against {}", match_id, fixture.opponent_name);
    Ok(HttpResponse::Created().json(ApiResponse::success("Match created successfully", MatchView::from(fixture))))
}

#[tracing::instrument(name = "Update match", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_match(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<MatchRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let match_id = path.into_inner();

    let teams = TeamQueries::new(pool.get_ref().clone());
    ok_or_return!(require_record(teams.find(body.smoras_team_id).await, "Team not found"));

    let queries = MatchQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.update(match_id, &body).await, "Match not found"));
    let fixture = ok_or_return!(require_record(queries.find(match_id).await, "Match not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match updated successfully", MatchView::from(fixture))))
}

#[tracing::instrument(name = "Update match score", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_score(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<ScoreUpdateRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let match_id = path.into_inner();
    let queries = MatchQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(
        queries.update_score(match_id, body.smoras_score, body.opponent_score).await,
        "Match not found"
    ));
    let fixture = ok_or_return!(require_record(queries.find(match_id).await, "Match not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Score updated", MatchView::from(fixture))))
}

#[tracing::instrument(name = "Delete match", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_match(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = MatchQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete(path.into_inner()).await, "Match not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Match deleted successfully")))
}

/// Replace the squad the match's own team fielded.
#[tracing::instrument(name = "Set match players", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn set_match_players(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<MatchPlayersRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let match_id = path.into_inner();
    let queries = MatchQueries::new(pool.get_ref().clone());
    let fixture = ok_or_return!(require_record(queries.find(match_id).await, "Match not found"));

    if body.team_id != fixture.smoras_team_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "Players can only be added for the match's own team",
        )));
    }

    match queries.replace_team_appearances(match_id, body.team_id, &body.player_ids).await {
        Ok(()) => {}
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Unknown player in selection")));
        }
        Err(e) => {
            tracing::error!("Failed to replace appearances for match {}: {}", match_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error")));
        }
    }

    let appearances = ok_or_return!(db_result(queries.appearances(match_id).await));
    tracing::info!("Match {} now has {} appearances", match_id, appearances.len());
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match players updated", appearances)))
}

#[tracing::instrument(name = "Update appearance stats", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_appearance(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<AppearanceStatsRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let (match_id, appearance_id) = path.into_inner();
    let queries = MatchQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(
        queries.update_appearance(match_id, appearance_id, &body).await,
        "Appearance not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Appearance updated")))
}
