//! Sign-in routes
//!
//! Google and Microsoft authorization-code flows, the session probe, and
//! logout. Callbacks never surface provider failures as API errors; the
//! browser is redirected back to the login page with an error code instead.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{oauth, session, RequireAuth};
use crate::domain::users::{AuthProvider, User};
use crate::error::{ApiError, ApiResult};

const USER_COLUMNS: &str = "id, email, first_name, last_name, avatar_url, auth_provider, \
                            provider_id, role, created_at, last_login_at";

fn provider_from_path(raw: &str) -> ApiResult<AuthProvider> {
    match raw {
        "google" => Ok(AuthProvider::Google),
        "microsoft" => Ok(AuthProvider::Microsoft),
        _ => Err(ApiError::not_found("Unknown sign-in provider")),
    }
}

fn login_error_redirect(frontend: &str, code: &str) -> Redirect {
    Redirect::temporary(&format!("{}/login?error={}", frontend, code))
}

/// GET /api/auth/:provider
///
/// Start the provider's authorization-code flow.
pub async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provider_from_path(&provider)?;

    let csrf_state = Uuid::new_v4().simple().to_string();
    let url = oauth::authorize_url(&state.settings, provider, &csrf_state)?;
    let jar = jar.add(session::oauth_state_cookie(&state.settings, csrf_state));

    Ok((jar, Redirect::temporary(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /api/auth/:provider/callback
///
/// Validate the CSRF state, exchange the code, sign the user in.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let provider = provider_from_path(&provider)?;
    let frontend = state.settings.frontend_url.trim_end_matches('/').to_string();

    // The state cookie is one-shot regardless of outcome
    let stored_state = jar
        .get(session::OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string());
    let jar = jar.add(session::clear_oauth_state_cookie(&state.settings));

    if let Some(error) = params.error {
        tracing::warn!(provider = %provider, error = %error, "Provider reported a sign-in error");
        return Ok((jar, login_error_redirect(&frontend, "provider")));
    }

    let (code, returned_state) = match (params.code, params.state) {
        (Some(code), Some(returned)) => (code, returned),
        _ => return Ok((jar, login_error_redirect(&frontend, "missing_code"))),
    };

    if stored_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!(provider = %provider, "OAuth state mismatch");
        return Ok((jar, login_error_redirect(&frontend, "state_mismatch")));
    }

    let profile =
        match oauth::exchange_code(&state.http_client, &state.settings, provider, &code).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "OAuth code exchange failed");
                return Ok((jar, login_error_redirect(&frontend, "exchange_failed")));
            }
        };

    let (user, created) = upsert_oauth_user(&state, &profile).await?;

    if created {
        // Best-effort; sign-in never waits on email delivery
        let mailer = state.mailer.clone();
        let email = user.email.clone();
        let first_name = user.first_name.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&email, &first_name).await {
                tracing::warn!(error = %e, "Welcome email failed");
            }
        });
    }

    let token = session::issue_token(&state.settings, &user)?;
    let jar = jar.add(session::session_cookie(&state.settings, token));

    tracing::info!(user_id = %user.id, provider = %provider, created = created, "User signed in");

    Ok((jar, Redirect::temporary(&frontend)))
}

/// Find or create the user row for a provider profile.
/// Returns the row and whether this sign-in created it.
async fn upsert_oauth_user(
    state: &AppState,
    profile: &oauth::OAuthProfile,
) -> ApiResult<(User, bool)> {
    // Known identity for this provider
    let by_identity = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET last_login_at = NOW(), avatar_url = COALESCE($3, avatar_url)
        WHERE auth_provider = $1 AND provider_id = $2
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(profile.provider.to_string())
    .bind(&profile.provider_id)
    .bind(&profile.avatar_url)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if let Some(user) = by_identity {
        return Ok((user, false));
    }

    // Same email signed up through the other provider: attach this identity
    let by_email = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET auth_provider = $1, provider_id = $2, last_login_at = NOW(),
            avatar_url = COALESCE($4, avatar_url)
        WHERE email = $3
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(profile.provider.to_string())
    .bind(&profile.provider_id)
    .bind(&profile.email)
    .bind(&profile.avatar_url)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if let Some(user) = by_email {
        return Ok((user, false));
    }

    // First sign-in
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, first_name, last_name, avatar_url,
                           auth_provider, provider_id, role, created_at, last_login_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'user', NOW(), NOW())
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&profile.email)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.avatar_url)
    .bind(profile.provider.to_string())
    .bind(&profile.provider_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        ApiError::from_unique_violation(
            e,
            &[("users_email_key", "An account with this email already exists")],
        )
    })?;

    Ok((user, true))
}

/// GET /api/auth/session
///
/// 200 with the session claims, 401 when absent.
pub async fn get_session(auth: RequireAuth) -> impl IntoResponse {
    Json(json!({ "success": true, "session": auth.0 }))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(session::clear_session_cookie(&state.settings));
    (jar, Json(json!({ "success": true, "message": "Signed out" })))
}
