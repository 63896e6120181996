use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_record, DbResult};
use crate::db::session_queries::{BankedMinutes, SessionQueries, SubstitutionWrite};
use crate::handlers::session::clock_error;
use crate::match_day::{bank_minutes, live_squad_minutes, ClockError, RotationAdvisor, SessionClock};
use crate::middleware::auth::{require_approved, require_manager, Claims};
use crate::models::common::ApiResponse;
use crate::models::match_session::{
    MatchInfo, PitchView, PlayingTimesResponse, QuickSubRequest, RecommendationResponse, SubstitutionRequest,
    SubstitutionResult,
};
use crate::ok_or_return;

/// Swap `player_out_id` for `player_in_id` on a running session. Minute and
/// period default to the clock's reading.
async fn perform_substitution(
    pool: &PgPool,
    session_id: Uuid,
    player_out_id: Uuid,
    player_in_id: Uuid,
    minute: Option<i32>,
    period: Option<i32>,
) -> DbResult<SubstitutionResult> {
    let sessions = SessionQueries::new(pool.clone());
    let session = require_record(sessions.find(session_id).await, "Match session not found")?;
    if !session.is_active {
        return Err(clock_error(ClockError::NotActive));
    }
    if player_out_id == player_in_id {
        return Err(clock_error(ClockError::SamePlayer));
    }

    let squad = db_result(sessions.squad(session_id).await)?;
    let player_out = match squad.iter().find(|p| p.player_id == player_out_id && p.is_on_pitch) {
        Some(p) => p,
        None => return Err(clock_error(ClockError::PlayerNotOnPitch)),
    };
    let player_in = match squad.iter().find(|p| p.player_id == player_in_id && !p.is_on_pitch) {
        Some(p) => p,
        None => return Err(clock_error(ClockError::PlayerNotOnBench)),
    };

    let now = Utc::now();
    let clock = SessionClock::from_session(&session);
    let (clock_minute, clock_period) = clock.substitution_stamp(now);
    let write = SubstitutionWrite {
        player_out: BankedMinutes {
            player_id: player_out.player_id,
            minutes_played: bank_minutes(
                player_out.minutes_played,
                true,
                player_out.last_substitution_time,
                now,
            ),
        },
        player_in_id: player_in.player_id,
        minute: minute.unwrap_or(clock_minute).max(0),
        period: period.unwrap_or(clock_period).clamp(1, session.periods),
    };

    let substitution_id = db_result(sessions.substitute(session_id, &write, now).await)?;
    tracing::info!(
        "Session {}: {} off, {} on at {}' (period {})",
        session_id,
        player_out.first_name,
        player_in.first_name,
        write.minute,
        write.period
    );

    Ok(SubstitutionResult {
        substitution_id,
        minute: write.minute,
        period: write.period,
        player_in_id: player_in.player_id,
        player_out_id: player_out.player_id,
        player_in: player_in.first_name.clone(),
        player_out: player_out.first_name.clone(),
    })
}

#[tracing::instrument(name = "Record substitution", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn create_substitution(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<SubstitutionRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let result = ok_or_return!(
        perform_substitution(
            pool.get_ref(),
            path.into_inner(),
            body.player_out_id,
            body.player_in_id,
            body.minute,
            body.period,
        )
        .await
    );
    Ok(HttpResponse::Created().json(ApiResponse::success("Substitution recorded", result)))
}

/// One-tap substitution from the pitch view, always stamped with the clock.
#[tracing::instrument(name = "Quick substitution", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn quick_substitution(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<QuickSubRequest>,
) -> Result<HttpResponse> {
    ok_or_return!(require_manager(&claims));
    let result = ok_or_return!(
        perform_substitution(pool.get_ref(), path.into_inner(), body.player_out, body.player_in, None, None).await
    );
    let message = format!("{} replaced {}", result.player_in, result.player_out);
    Ok(HttpResponse::Ok().json(ApiResponse::success(message, result)))
}

pub async fn recommendations(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));
    if !session.is_active {
        return Ok(clock_error(ClockError::NotActive));
    }
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));

    let clock = SessionClock::from_session(&session);
    let advice = RotationAdvisor::new(&clock).recommend(&squad, Utc::now());
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Substitution recommendations",
        RecommendationResponse {
            recommendations: advice.recommendations,
            players_on_pitch: advice.players_on_pitch,
            players_on_bench: advice.players_on_bench,
            match_info: MatchInfo { period: clock.current_period, total_periods: clock.periods },
        },
    )))
}

pub async fn playing_times(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));
    if !session.is_active {
        return Ok(clock_error(ClockError::NotActive));
    }
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));

    let now = Utc::now();
    let clock = SessionClock::from_session(&session);
    let minute_in_match = clock.minute_in_match(now);
    let period_start = i64::from(clock.current_period - 1) * i64::from(clock.period_length);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Playing times",
        PlayingTimesResponse {
            playing_times: live_squad_minutes(&clock, &squad, now),
            elapsed: clock.seconds_in_run(now),
            period: clock.current_period,
            total_periods: clock.periods,
            minute_in_match,
            minute_in_period: (minute_in_match - period_start).max(0),
            start_time: clock.start_time,
            next_sub_countdown: clock.next_substitution_countdown(now),
            substitution_interval: clock.substitution_interval,
            elapsed_seconds_previous_periods: clock.elapsed_time,
        },
    )))
}

/// Clock snapshot for the pitch-side screen, available in any state.
pub async fn pitch_view(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let session_id = path.into_inner();
    let sessions = SessionQueries::new(pool.get_ref().clone());
    let session = ok_or_return!(require_record(sessions.find(session_id).await, "Match session not found"));
    let squad = ok_or_return!(db_result(sessions.squad(session_id).await));

    let now = Utc::now();
    let clock = SessionClock::from_session(&session);
    let running = clock.is_active;
    let (on_pitch, on_bench) = squad.into_iter().partition(|p| p.is_on_pitch);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Pitch view",
        PitchView {
            session_id,
            is_active: running,
            current_period: clock.current_period,
            total_periods: clock.periods,
            period_length: clock.period_length,
            substitution_interval: clock.substitution_interval,
            current_game_time: running.then(|| clock.minute_in_match(now)),
            minutes_remaining: running.then(|| clock.minutes_remaining_in_period(now)),
            next_sub_countdown: if running { clock.next_substitution_countdown(now) } else { None },
            elapsed_minutes_previous_periods: clock.elapsed_time / 60,
            elapsed_seconds_previous_periods: clock.elapsed_time,
            on_pitch,
            on_bench,
        },
    )))
}
