// src/middleware/auth.rs
use std::future::{ready, Ready};
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform}, error::ErrorUnauthorized, http::header, web, Error, HttpMessage, HttpResponse
};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use secrecy::ExposeSecret;

use uuid::Uuid;

use crate::config::jwt::JwtSettings;
use crate::models::common::ApiResponse;
use crate::models::user::{UserRole, UserStatus};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,  // Subject (user id)
    pub username: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub exp: usize,   // Expiration time (as UTC timestamp)
}

impl Claims {
    /// Parse the user ID from the claims subject field.
    /// Returns None if the UUID is invalid.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }

    /// Approved coaches and admins may change club data.
    pub fn can_manage(&self) -> bool {
        self.is_approved() && matches!(self.role, UserRole::Coach | UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.is_approved() && self.role == UserRole::Admin
    }
}

/// 403 unless the account has been approved.
pub fn require_approved(claims: &Claims) -> Result<(), HttpResponse> {
    if claims.is_approved() {
        return Ok(());
    }
    tracing::info!("Unapproved user {} denied access", claims.username);
    Err(HttpResponse::Forbidden().json(ApiResponse::<()>::error(
        "Your account is awaiting approval",
    )))
}

/// 403 unless the account is an approved coach or admin.
pub fn require_manager(claims: &Claims) -> Result<(), HttpResponse> {
    if claims.can_manage() {
        return Ok(());
    }
    tracing::info!("User {} ({}) denied manage access", claims.username, claims.role);
    Err(HttpResponse::Forbidden().json(ApiResponse::<()>::error(
        "Only approved coaches and admins can do this",
    )))
}

/// Shared JWT validation logic used by both auth and admin middlewares.
/// Extracts and validates a JWT token from the request, returning the decoded claims.
pub fn validate_jwt_from_request(req: &ServiceRequest) -> Result<Claims, Error> {
    let jwt_settings = req.app_data::<web::Data<JwtSettings>>()
        .ok_or_else(|| ErrorUnauthorized("JWT settings not found"))?;

    let auth_header = req.headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ErrorUnauthorized("No authorization header"))?
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrorUnauthorized("Invalid authorization header format"))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    ).map_err(|e| {
        tracing::error!("Failed to decode token: {:?}", e);
        ErrorUnauthorized("Invalid token")
    })?;

    Ok(token_data.claims)
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match validate_jwt_from_request(&req) {
            Ok(claims) => claims,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        // Handlers read the claims back through web::ReqData<Claims>
        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: UserRole, status: UserStatus) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            username: "coach".into(),
            role,
            status,
            exp: 0,
        }
    }

    #[test]
    fn pending_coach_cannot_manage() {
        let c = claims(UserRole::Coach, UserStatus::Pending);
        assert!(!c.is_approved());
        assert!(!c.can_manage());
        assert!(require_manager(&c).is_err());
    }

    #[test]
    fn approved_roles() {
        assert!(claims(UserRole::Coach, UserStatus::Approved).can_manage());
        assert!(!claims(UserRole::Coach, UserStatus::Approved).is_admin());
        assert!(!claims(UserRole::Player, UserStatus::Approved).can_manage());
        assert!(require_approved(&claims(UserRole::Player, UserStatus::Approved)).is_ok());
        assert!(claims(UserRole::Admin, UserStatus::Approved).is_admin());
        assert!(!claims(UserRole::Admin, UserStatus::Rejected).is_admin());
    }
}
