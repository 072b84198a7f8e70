use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;

use super::session::{self, SessionClaims};
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Extractor that requires a valid session cookie
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.sub)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub SessionClaims);

impl std::ops::Deref for RequireAuth {
    type Target = SessionClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extractor that reads the session when present but never rejects
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<SessionClaims>);

/// Extractor that requires a superadmin session
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionClaims);

impl std::ops::Deref for RequireAdmin {
    type Target = SessionClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingSession,
    NotSuperadmin,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingSession => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Not authenticated",
            ),
            AuthError::NotSuperadmin => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Superadmin access required",
            ),
        };

        let body = ErrorResponse {
            success: false,
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

fn session_from_parts(parts: &Parts, state: &Arc<AppState>) -> Option<SessionClaims> {
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(session::SESSION_COOKIE)?;
    session::verify_token(&state.settings, cookie.value())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .map(RequireAuth)
            .ok_or(AuthError::MissingSession)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalAuth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(session_from_parts(parts, state)))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = session_from_parts(parts, state).ok_or(AuthError::MissingSession)?;
        if !claims.is_superadmin() {
            return Err(AuthError::NotSuperadmin);
        }
        Ok(RequireAdmin(claims))
    }
}
