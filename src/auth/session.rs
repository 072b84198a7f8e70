//! Cookie-backed session tokens
//!
//! Sessions are stateless HS256 JWTs carried in an HTTP-only cookie. A
//! missing, expired, or tampered token all read the same way: no session.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::users::{AuthProvider, User, UserRole};
use crate::error::{ApiError, ApiResult};

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const OAUTH_STATE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub auth_provider: AuthProvider,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_superadmin(&self) -> bool {
        self.role == UserRole::Superadmin
    }
}

/// Sign a session token for a freshly authenticated user
pub fn issue_token(settings: &Settings, user: &User) -> ApiResult<String> {
    let iat = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        auth_provider: AuthProvider::from(user.auth_provider.clone()),
        role: UserRole::from(user.role.clone()),
        iat,
        exp: iat + settings.session_ttl_days * 24 * 60 * 60,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.session_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign session token: {}", e)))
}

/// Verify a session token. Expired or invalid tokens read as no session.
pub fn verify_token(settings: &Settings, token: &str) -> Option<SessionClaims> {
    let validation = Validation::default();
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(settings.session_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
}

/// Session cookie: HTTP-only, lax, scoped to the whole site
pub fn session_cookie(settings: &Settings, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!settings.env.is_dev())
        .max_age(Duration::days(settings.session_ttl_days))
        .build()
}

/// Removal cookie with the same attributes and an immediate expiry
pub fn clear_session_cookie(settings: &Settings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!settings.env.is_dev())
        .max_age(Duration::ZERO)
        .build()
}

/// Short-lived cookie holding the OAuth CSRF state
pub fn oauth_state_cookie(settings: &Settings, state: String) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!settings.env.is_dev())
        .max_age(Duration::minutes(OAUTH_STATE_TTL_MINUTES))
        .build()
}

pub fn clear_oauth_state_cookie(settings: &Settings) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!settings.env.is_dev())
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn test_settings() -> Settings {
        Settings {
            env: Environment::Dev,
            server_addr: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/test".into(),
            database_max_connections: 1,
            cors_allow_origins: vec![],
            session_secret: "test-secret-key-for-session-tokens".into(),
            session_ttl_days: 7,
            public_base_url: "http://localhost:8080".into(),
            frontend_url: "http://localhost:3000".into(),
            google_client_id: "gid".into(),
            google_client_secret: "gsecret".into(),
            microsoft_client_id: "mid".into(),
            microsoft_client_secret: "msecret".into(),
            storage_url: "http://localhost:9000".into(),
            storage_bucket: "test-bucket".into(),
            storage_service_key: "skey".into(),
            email_api_url: "http://localhost:9001".into(),
            email_api_key: "ekey".into(),
            email_from: "Test <test@example.com>".into(),
            max_upload_bytes: 1024,
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "maya@example.com".into(),
            first_name: "Maya".into(),
            last_name: "Rao".into(),
            avatar_url: None,
            auth_provider: "google".into(),
            provider_id: "g-123".into(),
            role: "user".into(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn tokens_round_trip_their_claims() {
        let settings = test_settings();
        let user = test_user();
        let token = issue_token(&settings, &user).unwrap();
        let claims = verify_token(&settings, &token).expect("token should verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.auth_provider, AuthProvider::Google);
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_tokens_read_as_no_session() {
        let settings = test_settings();
        let user = test_user();
        let iat = Utc::now().timestamp() - 8 * 24 * 60 * 60;
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            auth_provider: AuthProvider::Google,
            role: UserRole::User,
            iat,
            exp: iat + 7 * 24 * 60 * 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(settings.session_secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&settings, &token).is_none());
    }

    #[test]
    fn tampered_tokens_read_as_no_session() {
        let settings = test_settings();
        let token = issue_token(&settings, &test_user()).unwrap();
        let mut other = test_settings();
        other.session_secret = "a-different-secret-entirely".into();
        assert!(verify_token(&other, &token).is_none());
        assert!(verify_token(&settings, "not-a-jwt").is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let settings = test_settings();
        let cookie = session_cookie(&settings, "tok".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        // Dev environment keeps the cookie usable over plain http
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));

        let removal = clear_session_cookie(&settings);
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(Duration::ZERO));
    }
}
