use actix_web::{web, HttpResponse, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record};
use crate::db::match_queries::MatchQueries;
use crate::db::session_queries::{BankedMinutes, SessionQueries};
use crate::handlers::session::clock_error;
use crate::match_day::{bank_minutes, SessionClock};
use crate::middleware::auth::{require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::match_session::{MatchSession, SetPeriodRequest, SquadMember};
use crate::ok_or_return;

#[derive(Serialize)]
struct ClockResponse {
    #[serde(flatten)]
    session: MatchSession,
    match_complete: bool,
}

/// Minutes for every on-pitch player with the running stint folded in.
fn bank_on_pitch(squad: &[SquadMember], now: DateTime<Utc>) -> Vec<BankedMinutes> {
    squad
        .iter()
        .filter(|p| p.is_on_pitch)
        .map(|p| BankedMinutes {
            player_id: p.player_id,
            minutes_played: bank_minutes(p.minutes_played, p.is_on_pitch, p.last_substitution_time, now),
        })
        .collect()
}

fn bank_all(squad: &[SquadMember], now: DateTime<Utc>) -> Vec<BankedMinutes> {
    squad
        .iter()
        .map(|p| BankedMinutes {
            player_id: p.player_id,
            minutes_played: bank_minutes(p.minutes_played, p.is_on_pitch, p.last_substitution_time, now),
        })
        .collect()
}

async fn reload(sessions: &SessionQueries, session_id: Uuid) -> std::result::Result<MatchSession, HttpResponse> {
    require_record(sessions.find(session_id).await, "Match session not found")
}

#[tracing::instrument(name = "Start match session", skip(pool, claims), fields(username = %claims.username))]
pub async fn start_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(reload(&sessions, session_id).await);
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));

    let now = Utc::now();
    let on_pitch = squad.iter().filter(|p| p.is_on_pitch).count();
    let plan = match SessionClock::from_session(&session).plan_start(now, on_pitch) {
        Ok(plan) => plan,
        Err(e) => return Ok(clock_error(e)),
    };

    ok_or_return!(db_result(sessions.start(session_id, &plan.clock, now).await));
    let message = match plan.advanced_to_period {
        Some(period) => format!("Period {} started", period),
        None => "Match session started".to_string(),
    };
    tracing::info!("Session {}: {}", session_id, message);

    let session = ok_or_return!(reload(&sessions, session_id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, ClockResponse { session, match_complete: false })))
}

/// Stop the clock, bank everyone's minutes and copy them into the match appearances.
#[tracing::instrument(name = "Stop match session", skip(pool, claims), fields(username = %claims.username))]
pub async fn stop_session(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(reload(&sessions, session_id).await);

    let now = Utc::now();
    let plan = match SessionClock::from_session(&session).plan_stop(now) {
        Ok(plan) => plan,
        Err(e) => return Ok(clock_error(e)),
    };

    let fixture = ok_or_return!(require_record(
        MatchQueries::new(pool.get_ref().clone()).find(session.match_id).await,
        "Match not found"
    ));
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));
    let banked = bank_all(&squad, now);
    ok_or_return!(db_result(
        sessions.stop(session_id, &plan.clock, &banked, fixture.id, fixture.smoras_team_id).await
    ));

    let message = plan.message();
    tracing::info!("Session {} stopped after {}s: {}", session_id, plan.run_seconds, message);
    let session = ok_or_return!(reload(&sessions, session_id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        message,
        ClockResponse { session, match_complete: plan.match_complete },
    )))
}

/// Restart the current run at zero. Works whether or not the clock is running.
#[tracing::instrument(name = "Reset match time", skip(pool, claims), fields(username = %claims.username))]
pub async fn reset_match_time(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(reload(&sessions, session_id).await);
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));

    let now = Utc::now();
    let mut clock = SessionClock::from_session(&session);
    clock.start_time = Some(now);
    let banked = bank_on_pitch(&squad, now);
    ok_or_return!(db_result(sessions.restart_clock(session_id, &clock, &banked, now).await));

    let session = ok_or_return!(reload(&sessions, session_id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Match time reset",
        ClockResponse { session, match_complete: false },
    )))
}

#[tracing::instrument(name = "Reset substitution timer", skip(pool, claims), fields(username = %claims.username))]
pub async fn reset_substitution_timer(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    ok_or_return!(require_affected(
        sessions.reset_substitution_timer(session_id, Utc::now()).await,
        "Match session not found"
    ));
    let session = ok_or_return!(reload(&sessions, session_id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Substitution timer reset",
        ClockResponse { session, match_complete: false },
    )))
}

/// Jump to the start of a period. Earlier periods count as fully played.
#[tracing::instrument(name = "Set match period", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn set_period(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<SetPeriodRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(reload(&sessions, session_id).await);

    let now = Utc::now();
    let clock = match SessionClock::from_session(&session).plan_set_period(body.period, now) {
        Ok(clock) => clock,
        Err(e) => return Ok(clock_error(e)),
    };
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));
    let banked = bank_on_pitch(&squad, now);
    ok_or_return!(db_result(sessions.restart_clock(session_id, &clock, &banked, now).await));

    let session = ok_or_return!(reload(&sessions, session_id).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Moved to period {}", body.period),
        ClockResponse { session, match_complete: false },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn member(minutes: i32, on_pitch: bool, since: Option<DateTime<Utc>>) -> SquadMember {
        SquadMember {
            id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            first_name: "Ola".into(),
            last_name: String::new(),
            minutes_played: minutes,
            is_on_pitch: on_pitch,
            last_substitution_time: since,
        }
    }

    #[test]
    fn banking_adds_running_stints_only() {
        let now = Utc::now();
        let squad = vec![
            member(4, true, Some(now - Duration::seconds(7 * 60 + 30))),
            member(9, false, None),
        ];
        let on_pitch = bank_on_pitch(&squad, now);
        assert_eq!(on_pitch.len(), 1);
        assert_eq!(on_pitch[0].minutes_played, 11);

        let all = bank_all(&squad, now);
        assert_eq!(all.iter().map(|b| b.minutes_played).collect::<Vec<_>>(), vec![11, 9]);
    }
}
