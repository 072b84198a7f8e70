//! Admin routes
//!
//! Superadmin-only moderation surface: listing review (approve/reject),
//! customer and agent directories, agent KYC decisions, and user removal.
//! Status transitions here are the only way a listing becomes publicly
//! visible.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::agents::{AgentWithDomain, VerificationStatus, VerifyAgentRequest};
use crate::domain::customers::Customer;
use crate::domain::warehouses::{RejectListingRequest, Warehouse, WarehouseWithImages};
use crate::error::ApiError;

use super::warehouses::{load_images, WAREHOUSE_COLUMNS};

/// Query params for GET /api/admin/warehouses
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListingReviewParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// GET /api/admin/warehouses
///
/// Every listing regardless of status, optionally filtered to one status,
/// newest first.
pub async fn list_warehouses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingReviewParams>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let pagination = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    };
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM warehouses WHERE ($1::text IS NULL OR status = $1)")
            .bind(&status)
            .fetch_one(&state.db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let rows = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS}
        FROM warehouses
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(&status)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let mut data = Vec::with_capacity(rows.len());
    for listing in rows {
        let images = load_images(&state.db, listing.id).await?;
        data.push(WarehouseWithImages::new(listing, images));
    }

    Ok(Paginated::new(data, &pagination, total as u64))
}

/// POST /api/admin/warehouses/:id/approve
///
/// Move a pending or rejected listing to active. Approval clears any
/// stored rejection reason.
pub async fn approve_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let current: String = sqlx::query_scalar("SELECT status FROM warehouses WHERE id = $1")
        .bind(warehouse_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if current == "active" {
        return Err(ApiError::bad_request("Listing is already active"));
    }

    sqlx::query(
        r#"
        UPDATE warehouses
        SET status = 'active', rejection_reason = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(warehouse_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to approve listing: {}", e)))?;

    tracing::info!(warehouse_id = %warehouse_id, admin_id = %admin.sub, "Listing approved");

    Ok(Json(json!({ "success": true, "message": "Listing approved" })))
}

/// POST /api/admin/warehouses/:id/reject
///
/// Reject a listing, optionally recording a reason the owner can see.
pub async fn reject_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    admin: RequireAdmin,
    Json(req): Json<RejectListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let current: String = sqlx::query_scalar("SELECT status FROM warehouses WHERE id = $1")
        .bind(warehouse_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if current == "rejected" {
        return Err(ApiError::bad_request("Listing is already rejected"));
    }

    sqlx::query(
        r#"
        UPDATE warehouses
        SET status = 'rejected', rejection_reason = $1, updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(&reason)
    .bind(warehouse_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to reject listing: {}", e)))?;

    tracing::info!(warehouse_id = %warehouse_id, admin_id = %admin.sub, "Listing rejected");

    Ok(Json(json!({ "success": true, "message": "Listing rejected" })))
}

/// GET /api/admin/customers
///
/// Customer directory, newest first.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let data = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, user_id, first_name, last_name, email, mobile, city, state, pincode,
               created_at, updated_at
        FROM customers
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    Ok(Paginated::new(data, &pagination, total as u64))
}

/// GET /api/admin/agents
///
/// Agent directory with verification status and claimed domain, newest
/// first.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents")
        .fetch_one(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let data = sqlx::query_as::<_, AgentWithDomain>(
        r#"
        SELECT a.id, a.user_id, a.first_name, a.last_name, a.email, a.mobile,
               a.company_name, a.license_number, a.experience_years, a.city, a.state,
               a.pincode, a.pan_number, a.aadhar_number, a.profile_photo_url,
               a.kyc_document_url, a.banner_url, a.verification_status,
               a.created_at, a.updated_at,
               d.domain_name
        FROM agents a
        LEFT JOIN agent_domains d ON d.agent_id = a.id
        ORDER BY a.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    Ok(Paginated::new(data, &pagination, total as u64))
}

/// POST /api/admin/agents/:id/verify
///
/// Resolve a pending KYC review. `approve: true` moves the agent to
/// verified, `false` to rejected.
pub async fn verify_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
    admin: RequireAdmin,
    Json(req): Json<VerifyAgentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current: String =
        sqlx::query_scalar("SELECT verification_status FROM agents WHERE id = $1")
            .bind(agent_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
            .ok_or_else(|| ApiError::not_found("Agent not found"))?;

    if current != "pending" {
        return Err(ApiError::bad_request("Agent has already been reviewed"));
    }

    let next = if req.approve {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Rejected
    };

    sqlx::query("UPDATE agents SET verification_status = $1, updated_at = NOW() WHERE id = $2")
        .bind(next.to_string())
        .bind(agent_id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update verification: {}", e)))?;

    tracing::info!(
        agent_id = %agent_id,
        admin_id = %admin.sub,
        status = %next,
        "Agent KYC reviewed"
    );

    Ok(Json(json!({ "success": true, "verification_status": next })))
}

/// DELETE /api/admin/users/:id
///
/// Remove a user account. Profile rows, listings, and upload records go
/// with it through the cascade.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %user_id, admin_id = %admin.sub, "User deleted");

    Ok(Json(json!({ "success": true })))
}
