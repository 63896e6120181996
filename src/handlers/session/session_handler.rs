use actix_web::{web, HttpResponse, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record, validated};
use crate::db::match_queries::MatchQueries;
use crate::db::session_queries::{SessionQueries, SquadEntry};
use crate::match_day::{split_squad, SessionClock, SquadSplit};
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::match_session::{
    CreateSessionRequest, MatchSession, SessionDetail, SessionList, SessionPlayersRequest, UpdateSessionRequest,
};
use crate::ok_or_return;

#[derive(serde::Serialize)]
struct ImportSummary {
    starters: usize,
    bench: usize,
}

impl From<&SquadSplit> for ImportSummary {
    fn from(split: &SquadSplit) -> Self {
        Self { starters: split.starters.len(), bench: split.bench.len() }
    }
}

/// Fill the session squad from the match's newest lineup, or from its
/// appearance list when no lineup has been saved.
pub(crate) async fn import_squad(
    pool: &PgPool,
    session: &MatchSession,
    now: DateTime<Utc>,
) -> std::result::Result<SquadSplit, sqlx::Error> {
    let sessions = SessionQueries::new(pool.clone());
    let lineup = sessions.latest_lineup_entries(session.match_id).await?;
    let appearance_players = MatchQueries::new(pool.clone()).appearance_player_ids(session.match_id).await?;
    let split = {
        let mut rng = rand::thread_rng();
        split_squad(&lineup, &appearance_players, &mut rng)
    };
    if split.total() == 0 {
        return Ok(split);
    }

    let entries: Vec<SquadEntry> = split
        .starters
        .iter()
        .map(|&player_id| SquadEntry { player_id, on_pitch: true })
        .chain(split.bench.iter().map(|&player_id| SquadEntry { player_id, on_pitch: false }))
        .collect();
    let stint_start = session.is_active.then_some(now);
    sessions.replace_squad(session.id, &entries, stint_start).await?;
    Ok(split)
}

pub async fn list_sessions(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let rows = ok_or_return!(db_result(SessionQueries::new(pool.get_ref().clone()).list_summaries().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match sessions", SessionList::split(rows, Utc::now()))))
}

#[tracing::instrument(name = "Create match session", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));

    let matches = MatchQueries::new(pool.get_ref().clone());
    let fixture = ok_or_return!(require_record(matches.find(body.match_id).await, "Match not found"));
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{} vs {}", fixture.team_name, fixture.opponent_name),
    };

    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(db_result(
        sessions
            .create(
                fixture.id,
                &name,
                body.periods,
                body.period_length,
                body.substitution_interval,
                claims.user_id(),
            )
            .await
    ));

    let has_appearances = !ok_or_return!(db_result(matches.appearance_player_ids(fixture.id).await)).is_empty();
    if has_appearances {
        let split = ok_or_return!(db_result(import_squad(pool.get_ref(), &session, Utc::now()).await));
        tracing::info!(
            "Session {} imported {} starters and {} substitutes",
            session.id,
            split.starters.len(),
            split.bench.len()
        );
    }

    Ok(HttpResponse::Created().json(ApiResponse::success("Match session created", session)))
}

pub async fn get_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));
    let substitutions = ok_or_return!(db_result(sessions.substitutions(session_id).await));

    let clock = SessionClock::from_session(&session);
    let current_game_time = session.is_active.then(|| clock.current_minute(Utc::now()));
    let (players_on_pitch, players_on_bench) = squad.into_iter().partition(|p| p.is_on_pitch);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Match session",
        SessionDetail { session, players_on_pitch, players_on_bench, substitutions, current_game_time },
    )))
}

#[tracing::instrument(name = "Update match session", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateSessionRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let current = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));

    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => current.name,
    };
    let session = ok_or_return!(require_record(
        sessions
            .update_settings(session_id, &name, body.periods, body.period_length, body.substitution_interval)
            .await,
        "Match session not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match session updated", session)))
}

#[tracing::instrument(name = "Delete match session", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let sessions = SessionQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(sessions.delete(path.into_inner()).await, "Match session not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Match session deleted")))
}

/// Choose the squad and who starts. Minutes restart from zero.
#[tracing::instrument(name = "Select session players", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn set_session_players(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<SessionPlayersRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    ok_or_return!(validated(body.validate()));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));

    let mut entries: Vec<SquadEntry> = Vec::with_capacity(body.player_ids.len());
    for &player_id in &body.player_ids {
        if entries.iter().all(|e| e.player_id != player_id) {
            entries.push(SquadEntry { player_id, on_pitch: body.starter_ids.contains(&player_id) });
        }
    }
    let stint_start = session.is_active.then(Utc::now);

    match sessions.replace_squad(session_id, &entries, stint_start).await {
        Ok(()) => {}
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Unknown player in selection")));
        }
        Err(e) => {
            tracing::error!("Failed to store squad for session {}: {}", session_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error")));
        }
    }

    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Squad updated", squad)))
}

#[tracing::instrument(name = "Import session players", skip(pool, claims), fields(username = %claims.username))]
pub async fn import_session_players(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(path.into_inner()).await, "Match session not found"));

    let split = ok_or_return!(db_result(import_squad(pool.get_ref(), &session, Utc::now()).await));
    if split.total() == 0 {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "No lineup or match players found to import",
        )));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Imported {} players", split.total()),
        ImportSummary::from(&split),
    )))
}
