//! Turn database results into early HTTP responses.
//!
//! For handlers returning `Result<HttpResponse>`:
//! ```ignore
//! let team = ok_or_return!(require_record(query.fetch_optional(pool).await, "Team not found"));
//! ```

use actix_web::HttpResponse;

use crate::models::common::ApiResponse;

/// Macro for handlers returning `Result<HttpResponse>`.
/// Converts a `DbResult<T>` to return `Ok(error_response)` on error.
#[macro_export]
macro_rules! ok_or_return {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(response) => return Ok(response),
        }
    };
}

/// Result type for database operations that return an HttpResponse on error
pub type DbResult<T> = Result<T, HttpResponse>;

fn database_error(e: sqlx::Error) -> HttpResponse {
    tracing::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
}

/// Unwrap an optional database result, returning NotFound if None.
pub fn require_record<T>(
    result: Result<Option<T>, sqlx::Error>,
    not_found_message: &str,
) -> DbResult<T> {
    match result {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found_message))),
        Err(e) => Err(database_error(e)),
    }
}

/// Ensure a record does NOT exist, returning Conflict if it does.
pub fn ensure_not_exists<T>(
    result: Result<Option<T>, sqlx::Error>,
    conflict_message: &str,
) -> DbResult<()> {
    match result {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::<()>::error(conflict_message))),
        Ok(None) => Ok(()),
        Err(e) => Err(database_error(e)),
    }
}

/// Unwrap a database result, returning InternalServerError on error.
pub fn db_result<T>(result: Result<T, sqlx::Error>) -> DbResult<T> {
    result.map_err(database_error)
}

/// 404 when an UPDATE/DELETE touched no rows.
pub fn require_affected(result: Result<u64, sqlx::Error>, not_found_message: &str) -> DbResult<()> {
    match result {
        Ok(0) => Err(HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found_message))),
        Ok(_) => Ok(()),
        Err(e) => Err(database_error(e)),
    }
}

/// 400 with the validation message.
pub fn validated<T>(result: Result<T, String>) -> DbResult<T> {
    result.map_err(|message| {
        tracing::info!("Rejected request: {}", message);
        HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
    })
}
