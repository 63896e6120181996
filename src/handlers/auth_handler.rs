use actix_web::{web, HttpResponse, Result};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::auth::jwt::generate_token;
use crate::config::jwt::JwtSettings;
use crate::db::helpers::{db_result, require_record};
use crate::db::user_queries::UserQueries;
use crate::middleware::auth::Claims;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::models::common::ApiResponse;
use crate::models::user::{UserRole, UserStatus};
use crate::ok_or_return;
use crate::utils::password::verify_password;

#[tracing::instrument(
    name = "Login user attempt",
    skip(login_form, pool, jwt_settings),
    fields(
        username = %login_form.username
    )
)]
pub async fn login_user(
    login_form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
) -> Result<HttpResponse> {
    let users = UserQueries::new(pool.get_ref().clone());
    let credentials = match ok_or_return!(db_result(users.credentials(login_form.username.trim()).await)) {
        Some(credentials) => credentials,
        None => {
            tracing::info!("User not found or invalid credentials");
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid username or password")));
        }
    };

    if !verify_password(login_form.password.expose_secret(), &credentials.password_hash) {
        tracing::info!("Invalid password");
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid username or password")));
    }

    let (role, status) = match (credentials.role.parse::<UserRole>(), credentials.status.parse::<UserStatus>()) {
        (Ok(role), Ok(status)) => (role, status),
        _ => {
            tracing::error!("User {} has an unreadable profile", credentials.id);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Invalid user profile")));
        }
    };

    let token = match generate_token(credentials.id, &credentials.username, role, status, &jwt_settings) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Error generating JWT token: {:?}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to log in")));
        }
    };

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user_id: credentials.id,
        role,
        status,
    }))
}

#[tracing::instrument(name = "Current user", skip(pool, claims), fields(username = %claims.username))]
pub async fn current_user(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    let Some(user_id) = claims.user_id() else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Invalid user ID")));
    };
    let users = UserQueries::new(pool.get_ref().clone());
    let user = ok_or_return!(require_record(users.find(user_id).await, "User not found"));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Current user", user)))
}
