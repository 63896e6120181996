use actix_web::{web, HttpResponse, Result};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::db::helpers::{ensure_not_exists, validated};
use crate::db::user_queries::{NewUser, UserQueries};
use crate::models::common::ApiResponse;
use crate::models::user::{RegistrationRequest, UserRole, UserStatus};
use crate::ok_or_return;
use crate::utils::password::hash_password;

/// New accounts start pending and see nothing until an admin approves them.
#[tracing::instrument(
    name = "Adding a new user",
    skip(user_form, pool),
    fields(
        username = %user_form.username,
        email = %user_form.email
    )
)]
pub async fn register_user(
    user_form: web::Json<RegistrationRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse> {
    ok_or_return!(validated(user_form.validate()));

    let users = UserQueries::new(pool.get_ref().clone());
    let username = user_form.username.trim();
    ok_or_return!(ensure_not_exists(
        users.find_by_username(username).await,
        "Username already taken"
    ));

    let password_hash = match hash_password(user_form.password.expose_secret()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to register user")));
        }
    };

    let new_user = NewUser {
        username,
        email: user_form.email.trim(),
        password_hash: &password_hash,
        first_name: user_form.first_name.as_deref().unwrap_or("").trim(),
        last_name: user_form.last_name.as_deref().unwrap_or("").trim(),
        role: user_form.role.unwrap_or(UserRole::Player),
        status: UserStatus::Pending,
    };

    match users.create_with_profile(&new_user).await {
        Ok(user_id) => {
            tracing::info!("New user {} registered and awaiting approval", user_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                "Registration received. An administrator will review your account.",
                serde_json::json!({ "user_id": user_id, "status": UserStatus::Pending }),
            )))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Ok(HttpResponse::Conflict().json(ApiResponse::<()>::error("Username already taken")))
        }
        Err(e) => {
            tracing::error!("Failed to execute query: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to register user")))
        }
    }
}
