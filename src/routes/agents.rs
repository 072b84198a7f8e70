//! Agent registration, custom domain, and banner routes

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::multipart::{validate_file, CollectedForm};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::agents::{AgentRegistrationFields, ClaimDomainRequest};
use crate::error::{ApiError, ApiResult};
use crate::services::storage::{keys, PendingUpload};
use crate::validation::{
    normalize_domain, validate_aadhaar, validate_domain_name, validate_email, validate_mobile,
    validate_pan, validate_pincode,
};

const IMAGE_TYPES: &[&str] = &["image/"];
const KYC_TYPES: &[&str] = &["image/", "application/pdf"];

fn parse_registration(form: &CollectedForm) -> ApiResult<AgentRegistrationFields> {
    let experience_years = match form.text("experience_years") {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            ApiError::bad_request("Experience years must be a whole number")
        })?),
        None => None,
    };

    let fields = AgentRegistrationFields {
        first_name: form.require("first_name")?,
        last_name: form.require("last_name")?,
        email: form.require("email")?,
        mobile: form.require("mobile")?,
        company_name: form.text("company_name"),
        license_number: form.text("license_number"),
        experience_years,
        city: form.require("city")?,
        state: form.require("state")?,
        pincode: form.require("pincode")?,
        pan_number: form.require("pan_number")?.to_uppercase(),
        aadhar_number: form.require("aadhar_number")?,
        domain_name: form.text("domain_name").map(|d| normalize_domain(&d)),
    };

    validate_email(&fields.email)?;
    validate_mobile(&fields.mobile)?;
    validate_pincode(&fields.pincode)?;
    validate_pan(&fields.pan_number)?;
    validate_aadhaar(&fields.aadhar_number)?;
    if let Some(domain) = &fields.domain_name {
        validate_domain_name(domain)?;
    }

    Ok(fields)
}

async fn insert_agent_records(
    state: &AppState,
    user_id: Uuid,
    fields: &AgentRegistrationFields,
    profile_photo_url: &str,
    kyc_document_url: &str,
) -> ApiResult<Uuid> {
    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let agent_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO agents (id, user_id, first_name, last_name, email, mobile,
                            company_name, license_number, experience_years,
                            city, state, pincode, pan_number, aadhar_number,
                            profile_photo_url, kyc_document_url,
                            verification_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, 'pending', NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.email)
    .bind(&fields.mobile)
    .bind(&fields.company_name)
    .bind(&fields.license_number)
    .bind(fields.experience_years)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.pincode)
    .bind(&fields.pan_number)
    .bind(&fields.aadhar_number)
    .bind(profile_photo_url)
    .bind(kyc_document_url)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        ApiError::from_unique_violation(
            e,
            &[
                ("agents_email_key", "This email is already registered"),
                ("agents_mobile_key", "This mobile number is already registered"),
                (
                    "agents_license_number_key",
                    "This license number is already registered",
                ),
                ("agents_user_id_key", "You have already registered as an agent"),
            ],
        )
    })?;

    if let Some(domain) = &fields.domain_name {
        sqlx::query(
            r#"
            INSERT INTO agent_domains (id, agent_id, domain_name, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(agent_id)
        .bind(domain)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            ApiError::from_unique_violation(
                e,
                &[("agent_domains_domain_name_key", "This domain is already taken")],
            )
        })?;
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    Ok(agent_id)
}

/// POST /api/agent/register
///
/// Multipart form: agent fields plus a profile photo and a KYC document.
/// Files are stored first; the profile commits only when both are stored.
pub async fn register_agent(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = CollectedForm::read(multipart, state.settings.max_upload_bytes).await?;
    let fields = parse_registration(&form)?;

    let profile_photo = form.file("profile_photo")?;
    validate_file(profile_photo, IMAGE_TYPES)?;
    let kyc_document = form.file("kyc_document")?;
    validate_file(kyc_document, KYC_TYPES)?;

    // Proactive duplicate checks; constraints still back them up
    let duplicate = sqlx::query_scalar::<_, String>(
        r#"
        SELECT CASE
                 WHEN email = $1 THEN 'email'
                 WHEN mobile = $2 THEN 'mobile'
                 ELSE 'license'
               END
        FROM agents
        WHERE email = $1 OR mobile = $2
           OR ($3::text IS NOT NULL AND license_number = $3)
        LIMIT 1
        "#,
    )
    .bind(&fields.email)
    .bind(&fields.mobile)
    .bind(&fields.license_number)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if let Some(field) = duplicate {
        let message = match field.as_str() {
            "email" => "This email is already registered",
            "mobile" => "This mobile number is already registered",
            _ => "This license number is already registered",
        };
        return Err(ApiError::conflict(message));
    }

    if let Some(domain) = &fields.domain_name {
        let taken = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM agent_domains WHERE domain_name = $1 LIMIT 1",
        )
        .bind(domain)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
        if taken.is_some() {
            return Err(ApiError::conflict("This domain is already taken"));
        }
    }

    let uploads = [
        PendingUpload {
            key: keys::agent_profile_photo(&profile_photo.file_name),
            content_type: profile_photo.content_type.clone(),
            bytes: profile_photo.bytes.clone(),
        },
        PendingUpload {
            key: keys::agent_kyc_document(&kyc_document.file_name),
            content_type: kyc_document.content_type.clone(),
            bytes: kyc_document.bytes.clone(),
        },
    ];
    let stored = state.storage.upload_all(&uploads).await?;

    let agent_id =
        match insert_agent_records(&state, auth.sub, &fields, &stored[0].url, &stored[1].url).await
        {
            Ok(id) => id,
            Err(e) => {
                // Stored files must not outlive a failed registration
                for object in &stored {
                    state.storage.delete_quiet(&object.key).await;
                }
                return Err(e);
            }
        };

    let mailer = state.mailer.clone();
    let to = fields.email.clone();
    let name = fields.first_name.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_welcome(&to, &name).await {
            tracing::warn!(error = %e, "Welcome email failed");
        }
    });

    tracing::info!(agent_id = %agent_id, user_id = %auth.sub, "Agent registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": agent_id })),
    ))
}

#[derive(Debug, Deserialize, Default)]
pub struct DomainCheckParams {
    #[serde(default)]
    pub name: Option<String>,
}

/// GET /api/agent/domain/check
///
/// Public availability probe. Shape problems read as unavailable, not as
/// request errors.
pub async fn check_domain(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DomainCheckParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = normalize_domain(params.name.as_deref().unwrap_or(""));

    if let Err(e) = validate_domain_name(&name) {
        let reason = match e {
            ApiError::BadRequest(msg) => msg,
            _ => "Invalid domain name".to_string(),
        };
        return Ok(Json(json!({
            "success": true,
            "available": false,
            "reason": reason,
        })));
    }

    let taken =
        sqlx::query_scalar::<_, i32>("SELECT 1 FROM agent_domains WHERE domain_name = $1 LIMIT 1")
            .bind(&name)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if taken.is_some() {
        return Ok(Json(json!({
            "success": true,
            "available": false,
            "reason": "This domain is already taken",
        })));
    }

    Ok(Json(json!({ "success": true, "available": true })))
}

/// POST /api/agent/domain
///
/// Claim a domain for the caller's agent profile. One per agent.
pub async fn claim_domain(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ClaimDomainRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let domain = normalize_domain(&req.domain_name);
    validate_domain_name(&domain)?;

    let agent_id: Uuid = sqlx::query_scalar("SELECT id FROM agents WHERE user_id = $1")
        .bind(auth.sub)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("No agent profile found. Register as an agent first."))?;

    let owned = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM agent_domains WHERE agent_id = $1 LIMIT 1",
    )
    .bind(agent_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if owned.is_some() {
        return Err(ApiError::conflict("Your agency already has a domain"));
    }

    let taken =
        sqlx::query_scalar::<_, i32>("SELECT 1 FROM agent_domains WHERE domain_name = $1 LIMIT 1")
            .bind(&domain)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if taken.is_some() {
        return Err(ApiError::conflict("This domain is already taken"));
    }

    sqlx::query(
        r#"
        INSERT INTO agent_domains (id, agent_id, domain_name, created_at)
        VALUES ($1, $2, $3, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(agent_id)
    .bind(&domain)
    .execute(&state.db)
    .await
    .map_err(|e| {
        ApiError::from_unique_violation(
            e,
            &[
                ("agent_domains_domain_name_key", "This domain is already taken"),
                ("agent_domains_agent_id_key", "Your agency already has a domain"),
            ],
        )
    })?;

    tracing::info!(agent_id = %agent_id, domain = %domain, "Domain claimed");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "domain_name": domain })),
    ))
}

/// POST /api/agent/banner
///
/// Single-image upload that replaces the agent's banner.
pub async fn upload_banner(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = CollectedForm::read(multipart, state.settings.max_upload_bytes).await?;
    let banner = form.file("banner")?;
    validate_file(banner, IMAGE_TYPES)?;

    let agent_id: Uuid = sqlx::query_scalar("SELECT id FROM agents WHERE user_id = $1")
        .bind(auth.sub)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("No agent profile found. Register as an agent first."))?;

    let upload = PendingUpload {
        key: keys::agent_banner(auth.sub, &banner.file_name),
        content_type: banner.content_type.clone(),
        bytes: banner.bytes.clone(),
    };
    let stored = state.storage.upload(&upload).await?;

    sqlx::query("UPDATE agents SET banner_url = $1, updated_at = NOW() WHERE id = $2")
        .bind(&stored.url)
        .bind(agent_id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update banner: {}", e)))?;

    Ok(Json(json!({ "success": true, "banner_url": stored.url })))
}
