//! Customer registration routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::customers::RegisterCustomerRequest;
use crate::error::ApiError;
use crate::validation::{validate_email, validate_mobile, validate_pincode};

/// POST /api/customer/register
///
/// Create a customer profile for the signed-in user.
pub async fn register_customer(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<RegisterCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    let email = req.email.trim().to_string();
    let mobile = req.mobile.trim().to_string();

    if first_name.is_empty() {
        return Err(ApiError::bad_request("First name is required"));
    }
    if last_name.is_empty() {
        return Err(ApiError::bad_request("Last name is required"));
    }
    validate_email(&email)?;
    validate_mobile(&mobile)?;

    let pincode = req
        .pincode
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    if let Some(pincode) = &pincode {
        validate_pincode(pincode)?;
    }

    // Proactive duplicate check; the unique constraints still back it up
    let duplicate = sqlx::query_scalar::<_, String>(
        r#"
        SELECT CASE WHEN email = $1 THEN 'email' ELSE 'mobile' END
        FROM customers
        WHERE email = $1 OR mobile = $2
        LIMIT 1
        "#,
    )
    .bind(&email)
    .bind(&mobile)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if let Some(field) = duplicate {
        let message = if field == "email" {
            "This email is already registered"
        } else {
            "This mobile number is already registered"
        };
        return Err(ApiError::conflict(message));
    }

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO customers (id, user_id, first_name, last_name, email, mobile,
                               city, state, pincode, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.sub)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(&mobile)
    .bind(req.city.as_deref().map(str::trim))
    .bind(req.state.as_deref().map(str::trim))
    .bind(&pincode)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        ApiError::from_unique_violation(
            e,
            &[
                ("customers_email_key", "This email is already registered"),
                ("customers_mobile_key", "This mobile number is already registered"),
                (
                    "customers_user_id_key",
                    "You have already registered as a customer",
                ),
            ],
        )
    })?;

    // Best-effort welcome email
    let mailer = state.mailer.clone();
    let to = email.clone();
    let name = first_name.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_welcome(&to, &name).await {
            tracing::warn!(error = %e, "Welcome email failed");
        }
    });

    tracing::info!(customer_id = %id, user_id = %auth.sub, "Customer registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": id })),
    ))
}
