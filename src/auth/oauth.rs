//! OAuth authorization-code plumbing for Google and Microsoft
//!
//! Both providers follow the same shape: redirect to an authorize URL with a
//! CSRF state, exchange the returned code for an access token, then fetch the
//! OIDC userinfo profile.

use serde::Deserialize;
use url::Url;

use crate::config::Settings;
use crate::domain::users::AuthProvider;
use crate::error::{ApiError, ApiResult};

/// Normalized profile every provider resolves to
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider: AuthProvider,
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

struct ProviderEndpoints {
    authorize: &'static str,
    token: &'static str,
    userinfo: &'static str,
}

fn endpoints(provider: AuthProvider) -> ProviderEndpoints {
    match provider {
        AuthProvider::Google => ProviderEndpoints {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            userinfo: "https://openidconnect.googleapis.com/v1/userinfo",
        },
        AuthProvider::Microsoft => ProviderEndpoints {
            authorize: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            userinfo: "https://graph.microsoft.com/oidc/userinfo",
        },
    }
}

fn credentials(settings: &Settings, provider: AuthProvider) -> (&str, &str) {
    match provider {
        AuthProvider::Google => (&settings.google_client_id, &settings.google_client_secret),
        AuthProvider::Microsoft => (
            &settings.microsoft_client_id,
            &settings.microsoft_client_secret,
        ),
    }
}

pub fn redirect_uri(settings: &Settings, provider: AuthProvider) -> String {
    format!(
        "{}/api/auth/{}/callback",
        settings.public_base_url.trim_end_matches('/'),
        provider
    )
}

/// Provider authorization URL carrying our redirect URI and CSRF state
pub fn authorize_url(settings: &Settings, provider: AuthProvider, state: &str) -> ApiResult<String> {
    let (client_id, _) = credentials(settings, provider);
    let mut url = Url::parse(endpoints(provider).authorize)
        .map_err(|e| ApiError::internal(format!("Invalid authorize endpoint: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", &redirect_uri(settings, provider))
        .append_pair("response_type", "code")
        .append_pair("scope", "openid email profile")
        .append_pair("state", state);
    Ok(url.into())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Exchange an authorization code for the provider's profile
pub async fn exchange_code(
    client: &reqwest::Client,
    settings: &Settings,
    provider: AuthProvider,
    code: &str,
) -> ApiResult<OAuthProfile> {
    let ep = endpoints(provider);
    let (client_id, client_secret) = credentials(settings, provider);
    let redirect = redirect_uri(settings, provider);

    let params = [
        ("code", code),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("redirect_uri", &redirect),
        ("grant_type", "authorization_code"),
    ];

    let response = client
        .post(ep.token)
        .form(&params)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("OAuth token request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, provider = %provider, body = %body, "OAuth code exchange rejected");
        return Err(ApiError::unauthorized("Sign-in was not completed"));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Invalid OAuth token response: {}", e)))?;

    let info: UserInfo = client
        .get(ep.userinfo)
        .bearer_auth(&token.access_token)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("Userinfo request failed: {}", e)))?
        .error_for_status()
        .map_err(|e| ApiError::internal(format!("Userinfo request rejected: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Invalid userinfo response: {}", e)))?;

    let email = info
        .email
        .ok_or_else(|| ApiError::unauthorized("The provider did not return an email address"))?;

    // Prefer structured name parts; fall back to splitting the display name
    let (first_name, last_name) = match (info.given_name, info.family_name) {
        (Some(first), Some(last)) => (first, last),
        (Some(first), None) => (first, String::new()),
        (None, last) => {
            let full = info.name.unwrap_or_default();
            let mut words = full.split_whitespace();
            let first = words.next().unwrap_or_default().to_string();
            let rest = words.collect::<Vec<_>>().join(" ");
            (first, last.unwrap_or(rest))
        }
    };

    Ok(OAuthProfile {
        provider,
        provider_id: info.sub,
        email,
        first_name,
        last_name,
        avatar_url: info.picture,
    })
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
            session_secret: "secret".into(),
            session_ttl_days: 7,
            public_base_url: "https://api.godown.in/".into(),
            frontend_url: "https://godown.in".into(),
            google_client_id: "google-client".into(),
            google_client_secret: "gsecret".into(),
            microsoft_client_id: "ms-client".into(),
            microsoft_client_secret: "msecret".into(),
            storage_url: "http://localhost:9000".into(),
            storage_bucket: "b".into(),
            storage_service_key: "k".into(),
            email_api_url: "http://localhost:9001".into(),
            email_api_key: "e".into(),
            email_from: "t@example.com".into(),
            max_upload_bytes: 1024,
        }
    }

    #[test]
    fn redirect_uri_strips_trailing_slash() {
        let settings = test_settings();
        assert_eq!(
            redirect_uri(&settings, AuthProvider::Google),
            "https://api.godown.in/api/auth/google/callback"
        );
        assert_eq!(
            redirect_uri(&settings, AuthProvider::Microsoft),
            "https://api.godown.in/api/auth/microsoft/callback"
        );
    }

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let settings = test_settings();
        let url = authorize_url(&settings, AuthProvider::Google, "abc123").unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "google-client");
        assert_eq!(pairs["state"], "abc123");
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(pairs["response_type"], "code");
    }
}
