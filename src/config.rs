use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Sessions
    pub session_secret: String,
    pub session_ttl_days: i64,

    // OAuth providers
    pub public_base_url: String,
    pub frontend_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub microsoft_client_id: String,
    pub microsoft_client_secret: String,

    // Object storage
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_service_key: String,

    // Email delivery
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,

    // Uploads
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Sessions
        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        let session_ttl_days = env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);

        // OAuth
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID must be set")?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").context("GOOGLE_CLIENT_SECRET must be set")?;
        let microsoft_client_id =
            env::var("MICROSOFT_CLIENT_ID").context("MICROSOFT_CLIENT_ID must be set")?;
        let microsoft_client_secret =
            env::var("MICROSOFT_CLIENT_SECRET").context("MICROSOFT_CLIENT_SECRET must be set")?;

        // Object storage
        let storage_url = env::var("STORAGE_URL").context("STORAGE_URL must be set")?;
        let storage_bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "godown-uploads".to_string());
        let storage_service_key =
            env::var("STORAGE_SERVICE_KEY").context("STORAGE_SERVICE_KEY must be set")?;

        // Email delivery
        let email_api_url =
            env::var("EMAIL_API_URL").unwrap_or_else(|_| "https://api.resend.com".to_string());
        let email_api_key = env::var("EMAIL_API_KEY").context("EMAIL_API_KEY must be set")?;
        let email_from =
            env::var("EMAIL_FROM").unwrap_or_else(|_| "Godown <no-reply@godown.in>".to_string());

        // Uploads
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(25 * 1024 * 1024); // whole multipart submission

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            session_secret,
            session_ttl_days,
            public_base_url,
            frontend_url,
            google_client_id,
            google_client_secret,
            microsoft_client_id,
            microsoft_client_secret,
            storage_url,
            storage_bucket,
            storage_service_key,
            email_api_url,
            email_api_key,
            email_from,
            max_upload_bytes,
        })
    }
}
