use std::collections::HashMap;

use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated, DbResult};
use crate::db::lineup_queries::{LineupQueries, NewSlot};
use crate::db::match_queries::MatchQueries;
use crate::db::team_queries::TeamQueries;
use crate::lineup::seed_from_appearances;
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::lineup::{
    CreateLineupRequest, Lineup, LineupDetail, LineupQuery, SavePositionsRequest, UpdateLineupRequest,
};
use crate::ok_or_return;

async fn load_detail(queries: &LineupQueries, lineup: Lineup) -> DbResult<LineupDetail> {
    let formation = match lineup.formation_id {
        Some(formation_id) => db_result(queries.find_formation(formation_id).await)?,
        None => None,
    };
    let slots = db_result(queries.slots(lineup.id).await)?;
    let (starters, substitutes) = slots.into_iter().partition(|s| s.is_starter);
    Ok(LineupDetail { lineup, formation, starters, substitutes })
}

/// Initial placements for a new lineup: copied from a template, seeded from
/// the match squad, or none.
async fn initial_slots(queries: &LineupQueries, pool: &PgPool, request: &CreateLineupRequest) -> DbResult<Vec<NewSlot>> {
    if let Some(template_id) = request.template_id {
        let template = require_record(queries.find(template_id).await, "Template lineup not found")?;
        let slots = db_result(queries.slots(template.id).await)?;
        return Ok(NewSlot::from_template(&slots));
    }

    let Some(match_id) = request.match_id else {
        return Ok(Vec::new());
    };
    require_record(MatchQueries::new(pool.clone()).find(match_id).await, "Match not found")?;

    let starting_count = match request.formation_id {
        Some(formation_id) => {
            let formation = require_record(queries.find_formation(formation_id).await, "Formation not found")?;
            Some(formation.player_count.max(0) as usize)
        }
        None => None,
    };
    let positions: HashMap<_, _> = db_result(queries.first_position_per_type().await)?.into_iter().collect();
    let candidates = db_result(queries.match_candidates(match_id).await)?;
    Ok(seed_from_appearances(&candidates, starting_count, &positions)
        .iter()
        .map(NewSlot::from_seeded)
        .collect())
}

fn write_error(e: sqlx::Error) -> HttpResponse {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error("Unknown player, position or formation"))
        }
        e => {
            tracing::error!("Lineup write failed: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
        }
    }
}

pub async fn list_lineups(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<LineupQuery>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let lineups = ok_or_return!(db_result(LineupQueries::new(pool.get_ref().clone()).list(query.team_id).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Lineups retrieved", lineups)))
}

pub async fn get_lineup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let queries = LineupQueries::new(pool.get_ref().clone());
    let lineup = ok_or_return!(require_record(queries.find(path.into_inner()).await, "Lineup not found"));
    let detail = ok_or_return!(load_detail(&queries, lineup).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Lineup retrieved", detail)))
}

#[tracing::instrument(name = "Create lineup", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_lineup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<CreateLineupRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    ok_or_return!(require_record(
        TeamQueries::new(pool.get_ref().clone()).find(body.team_id).await,
        "Team not found"
    ));

    let queries = LineupQueries::new(pool.get_ref().clone());
    let slots = ok_or_return!(initial_slots(&queries, pool.get_ref(), &body).await);
    let lineup = match queries.create(&body, claims.user_id(), &slots).await {
        Ok(lineup) => lineup,
        Err(e) => return Ok(write_error(e)),
    };
    tracing::info!("Lineup {} created with {} players", lineup.id, slots.len());

    let detail = ok_or_return!(load_detail(&queries, lineup).await);
    Ok(HttpResponse::Created().json(ApiResponse::success("Lineup created successfully", detail)))
}

#[tracing::instrument(name = "Update lineup", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_lineup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateLineupRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let queries = LineupQueries::new(pool.get_ref().clone());
    let lineup = match queries.update(path.into_inner(), &body).await {
        Ok(Some(lineup)) => lineup,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("Lineup not found")));
        }
        Err(e) => return Ok(write_error(e)),
    };
    let detail = ok_or_return!(load_detail(&queries, lineup).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Lineup updated successfully", detail)))
}

#[tracing::instrument(name = "Delete lineup", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_lineup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = LineupQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(queries.delete(path.into_inner()).await, "Lineup not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Lineup deleted successfully")))
}

/// Bulk save from the pitch editor.
#[tracing::instrument(name = "Save lineup positions", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn save_positions(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<SavePositionsRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = LineupQueries::new(pool.get_ref().clone());
    let lineup = ok_or_return!(require_record(queries.find(path.into_inner()).await, "Lineup not found"));

    let slots: Vec<NewSlot> = body.positions.iter().map(NewSlot::from_payload).collect();
    if let Err(e) = queries.save_positions(lineup.id, &slots, body.direction).await {
        return Ok(write_error(e));
    }

    let lineup = ok_or_return!(require_record(queries.find(lineup.id).await, "Lineup not found"));
    let detail = ok_or_return!(load_detail(&queries, lineup).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Saved {} player positions", slots.len()),
        detail,
    )))
}

#[tracing::instrument(name = "Remove lineup player", skip(pool, claims), fields(username = %claims.username))]
pub async fn remove_player(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let (lineup_id, player_id) = path.into_inner();
    let queries = LineupQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(
        queries.remove_player(lineup_id, player_id).await,
        "Player is not in this lineup"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Player removed from lineup")))
}

#[tracing::instrument(name = "Duplicate lineup", skip(pool, claims), fields(username = %claims.username))]
pub async fn duplicate_lineup(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let queries = LineupQueries::new(pool.get_ref().clone());
    let copy = ok_or_return!(require_record(
        queries.duplicate(path.into_inner(), claims.user_id()).await,
        "Lineup not found"
    ));
    let detail = ok_or_return!(load_detail(&queries, copy).await);
    Ok(HttpResponse::Created().json(ApiResponse::success("Lineup duplicated", detail)))
}

