//! Live match sessions: squad selection, the match clock and substitutions.

pub mod session_handler;
pub mod clock_handler;
pub mod substitution_handler;

use actix_web::HttpResponse;

use crate::match_day::ClockError;
use crate::models::common::ApiResponse;

/// A clock rule the request broke. Starting a running match is a conflict;
/// every other rule is a bad request.
pub(crate) fn clock_error(e: ClockError) -> HttpResponse {
    tracing::info!("Clock rule rejected request: {}", e);
    match e {
        ClockError::AlreadyActive => HttpResponse::Conflict().json(ApiResponse::<()>::error(e.to_string())),
        _ => HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())),
    }
}
