use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected, require_record};
use crate::db::user_queries::UserQueries;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::user::{UpdateUserProfileRequest, UserQueryParams};
use crate::ok_or_return;

// GET /admin/users?status=pending
pub async fn get_users(pool: web::Data<PgPool>, query: web::Query<UserQueryParams>) -> Result<HttpResponse> {
    let users = ok_or_return!(db_result(UserQueries::new(pool.get_ref().clone()).list(query.status).await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Users retrieved", users)))
}

// PATCH /admin/users/{id}
#[tracing::instrument(name = "Admin update user", skip(pool, claims, body), fields(admin = %claims.username))]
pub async fn update_user(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserProfileRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    if claims.user_id() == Some(user_id) && body.status.is_some() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("You cannot change your own status")));
    }

    let queries = UserQueries::new(pool.get_ref().clone());
    match queries.update_profile(user_id, &body).await {
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Player not found")));
        }
        result => ok_or_return!(require_affected(result, "User not found")),
    }

    let user = ok_or_return!(require_record(queries.find(user_id).await, "User not found"));
    tracing::info!("User {} is now {} ({})", user.username, user.role, user.status);
    Ok(HttpResponse::Ok().json(ApiResponse::success("User updated", user)))
}
