//! Public warehouse search routes
//!
//! Both endpoints serve anonymous traffic and only ever expose `active`
//! listings. The filter parameters compile to a single parameterized
//! statement; images are attached per row afterwards.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::search::{
    city_prefix, normalize_city, resolve_state, type_filter, BoundsParams, SearchParams,
    SizeBucket,
};
use crate::domain::warehouses::{Warehouse, WarehouseWithImages};
use crate::error::ApiError;

use super::warehouses::{load_images, WAREHOUSE_COLUMNS};

/// Hard cap on map viewport results
const BOUNDS_LIMIT: i64 = 500;

/// GET /api/warehouse/search
///
/// Filter active listings by city (tolerant 7-character prefix match),
/// state (two-letter codes resolve to full names), type, and size bucket.
/// Featured listings sort first, then newest.
pub async fn search_warehouses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let city = params
        .city
        .as_deref()
        .map(normalize_city)
        .filter(|c| !c.is_empty());
    let prefix = city.as_deref().map(city_prefix);
    let state_name = params
        .state
        .as_deref()
        .map(resolve_state)
        .filter(|s| !s.is_empty());
    let warehouse_type = type_filter(params.warehouse_type.as_deref());
    let (min_size, max_size) = params
        .distance
        .map(|d| SizeBucket::from_distance(d).bounds())
        .unwrap_or((None, None));

    let rows = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS}
        FROM warehouses
        WHERE status = 'active'
        AND ($1::text IS NULL OR lower(trim(city)) = $1 OR left(lower(trim(city)), 7) = $2)
        AND ($3::text IS NULL OR lower(trim(state)) = lower(trim($3)))
        AND ($4::text IS NULL OR warehouse_type = $4)
        AND ($5::bigint IS NULL OR warehouse_size >= $5)
        AND ($6::bigint IS NULL OR warehouse_size <= $6)
        ORDER BY is_featured DESC, created_at DESC
        "#
    ))
    .bind(&city)
    .bind(&prefix)
    .bind(&state_name)
    .bind(&warehouse_type)
    .bind(min_size)
    .bind(max_size)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let mut warehouses = Vec::with_capacity(rows.len());
    for listing in rows {
        let images = load_images(&state.db, listing.id).await?;
        warehouses.push(WarehouseWithImages::new(listing, images));
    }

    Ok(Json(json!({
        "success": true,
        "count": warehouses.len(),
        "warehouses": warehouses,
    })))
}

/// GET /api/warehouse/bounds
///
/// Active listings whose coordinates fall inside the map viewport,
/// corners inclusive, newest first, capped at 500 rows.
pub async fn warehouses_in_bounds(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BoundsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rect = params.parse_rect()?;
    let warehouse_type = type_filter(params.warehouse_type.as_deref());

    let rows = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS}
        FROM warehouses
        WHERE status = 'active'
        AND latitude IS NOT NULL AND longitude IS NOT NULL
        AND latitude BETWEEN $1 AND $2
        AND longitude BETWEEN $3 AND $4
        AND ($5::text IS NULL OR warehouse_type = $5)
        ORDER BY created_at DESC
        LIMIT $6
        "#
    ))
    .bind(rect.sw_lat)
    .bind(rect.ne_lat)
    .bind(rect.sw_lng)
    .bind(rect.ne_lng)
    .bind(&warehouse_type)
    .bind(BOUNDS_LIMIT)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let mut warehouses = Vec::with_capacity(rows.len());
    for listing in rows {
        let images = load_images(&state.db, listing.id).await?;
        warehouses.push(WarehouseWithImages::new(listing, images));
    }

    Ok(Json(json!({
        "success": true,
        "count": warehouses.len(),
        "warehouses": warehouses,
    })))
}
