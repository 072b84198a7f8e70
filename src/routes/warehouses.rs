//! Warehouse listing routes
//!
//! Listing creation is a multipart form (fields + images + optional
//! documents). Media is stored before any row is written; the listing and
//! its upload rows commit in one transaction.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::multipart::{validate_file, CollectedForm, FormFile};
use crate::app::AppState;
use crate::auth::{OptionalAuth, RequireAuth};
use crate::domain::warehouses::{
    ListingFields, ListingFor, ListingStatus, UpdateWarehouseRequest, Warehouse, WarehouseImage,
    WarehouseWithImages,
};
use crate::error::{ApiError, ApiResult};
use crate::services::storage::{keys, PendingUpload, StoredObject};
use crate::validation::{validate_mobile, validate_pincode};

const IMAGE_TYPES: &[&str] = &["image/"];
const DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/"];

pub(crate) const WAREHOUSE_COLUMNS: &str =
    "id, owner_id, title, warehouse_type, warehouse_size, price, listing_for, description, \
     address, city, state, pincode, latitude, longitude, amenities, contact_name, \
     contact_mobile, status, is_featured, rejection_reason, created_at, updated_at";

/// Active image attachments for one listing, primary first
pub(crate) async fn load_images(
    db: &PgPool,
    warehouse_id: Uuid,
) -> Result<Vec<WarehouseImage>, ApiError> {
    sqlx::query_as::<_, WarehouseImage>(
        r#"
        SELECT id, file_url, is_primary, display_order
        FROM warehouse_uploads
        WHERE warehouse_id = $1 AND kind = 'image' AND is_active = true
        ORDER BY is_primary DESC, display_order ASC
        "#,
    )
    .bind(warehouse_id)
    .fetch_all(db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))
}

fn validate_coords(latitude: Option<f64>, longitude: Option<f64>) -> ApiResult<()> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ApiError::bad_request("Latitude must be between -90 and 90"));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ApiError::bad_request(
                "Longitude must be between -180 and 180",
            ));
        }
    }
    Ok(())
}

fn parse_listing(form: &CollectedForm) -> ApiResult<ListingFields> {
    let warehouse_size: i64 = form.require("warehouse_size")?.parse().map_err(|_| {
        ApiError::bad_request("Warehouse size must be a whole number of square feet")
    })?;
    if warehouse_size <= 0 {
        return Err(ApiError::bad_request("Warehouse size must be greater than zero"));
    }

    let price = Decimal::from_str(&form.require("price")?)
        .map_err(|_| ApiError::bad_request("Price must be a number"))?;
    if price <= Decimal::ZERO {
        return Err(ApiError::bad_request("Price must be greater than zero"));
    }

    let listing_for_raw = form.require("listing_for")?;
    let listing_for = ListingFor::parse(&listing_for_raw)
        .ok_or_else(|| ApiError::bad_request("Listing must be for rent, sale, or lease"))?;

    let parse_coord = |name: &str| -> ApiResult<Option<f64>> {
        match form.text(name) {
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("{} must be a number", name))),
            None => Ok(None),
        }
    };
    let latitude = parse_coord("latitude")?;
    let longitude = parse_coord("longitude")?;
    validate_coords(latitude, longitude)?;

    let amenities = match form.text("amenities") {
        Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
            .map_err(|_| ApiError::bad_request("Amenities must be a JSON array of strings"))?,
        None => Vec::new(),
    };

    let pincode = form.require("pincode")?;
    validate_pincode(&pincode)?;

    let contact_mobile = form.text("contact_mobile");
    if let Some(mobile) = &contact_mobile {
        validate_mobile(mobile)?;
    }

    Ok(ListingFields {
        title: form.require("title")?,
        warehouse_type: form.require("warehouse_type")?,
        warehouse_size,
        price,
        listing_for: listing_for.to_string(),
        description: form.text("description"),
        address: form.require("address")?,
        city: form.require("city")?,
        state: form.require("state")?,
        pincode,
        latitude,
        longitude,
        amenities,
        contact_name: form.text("contact_name"),
        contact_mobile,
    })
}

async fn insert_listing_records(
    state: &AppState,
    warehouse_id: Uuid,
    owner_id: Uuid,
    fields: &ListingFields,
    images: &[(&FormFile, &StoredObject)],
    documents: &[(&FormFile, &StoredObject)],
) -> ApiResult<()> {
    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO warehouses (id, owner_id, title, warehouse_type, warehouse_size, price,
                                listing_for, description, address, city, state, pincode,
                                latitude, longitude, amenities, contact_name, contact_mobile,
                                status, is_featured, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, 'pending', false, NOW(), NOW())
        "#,
    )
    .bind(warehouse_id)
    .bind(owner_id)
    .bind(&fields.title)
    .bind(&fields.warehouse_type)
    .bind(fields.warehouse_size)
    .bind(fields.price)
    .bind(&fields.listing_for)
    .bind(&fields.description)
    .bind(&fields.address)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.pincode)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(json!(fields.amenities))
    .bind(&fields.contact_name)
    .bind(&fields.contact_mobile)
    .execute(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to create listing: {}", e)))?;

    for (position, (file, object)) in images.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO warehouse_uploads (id, warehouse_id, owner_id, file_url, file_key,
                                           kind, is_primary, display_order, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, 'image', $6, $7, true, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(warehouse_id)
        .bind(owner_id)
        .bind(&object.url)
        .bind(&object.key)
        .bind(position == 0)
        .bind(position as i32)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            ApiError::internal(format!("Failed to record upload '{}': {}", file.file_name, e))
        })?;
    }

    for (position, (file, object)) in documents.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO warehouse_uploads (id, warehouse_id, owner_id, file_url, file_key,
                                           kind, is_primary, display_order, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, 'document', false, $6, true, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(warehouse_id)
        .bind(owner_id)
        .bind(&object.url)
        .bind(&object.key)
        .bind(position as i32)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            ApiError::internal(format!("Failed to record upload '{}': {}", file.file_name, e))
        })?;
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))
}

/// POST /api/warehouse
///
/// Create a listing. It stays pending until a superadmin approves it.
pub async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = CollectedForm::read(multipart, state.settings.max_upload_bytes).await?;
    let fields = parse_listing(&form)?;

    let images = form.files("images");
    if images.is_empty() {
        return Err(ApiError::bad_request("At least one image is required"));
    }
    for image in &images {
        validate_file(image, IMAGE_TYPES)?;
    }
    let documents = form.files("documents");
    for document in &documents {
        validate_file(document, DOCUMENT_TYPES)?;
    }

    // The id is part of every storage key, so generate it before uploading
    let warehouse_id = Uuid::new_v4();

    let mut uploads = Vec::with_capacity(images.len() + documents.len());
    for image in &images {
        uploads.push(PendingUpload {
            key: keys::warehouse_image(auth.sub, warehouse_id, &image.file_name),
            content_type: image.content_type.clone(),
            bytes: image.bytes.clone(),
        });
    }
    for document in &documents {
        uploads.push(PendingUpload {
            key: keys::warehouse_document(auth.sub, warehouse_id, &document.file_name),
            content_type: document.content_type.clone(),
            bytes: document.bytes.clone(),
        });
    }

    let stored = state.storage.upload_all(&uploads).await?;
    let (stored_images, stored_documents) = stored.split_at(images.len());
    let image_pairs: Vec<_> = images.iter().copied().zip(stored_images).collect();
    let document_pairs: Vec<_> = documents.iter().copied().zip(stored_documents).collect();

    if let Err(e) = insert_listing_records(
        &state,
        warehouse_id,
        auth.sub,
        &fields,
        &image_pairs,
        &document_pairs,
    )
    .await
    {
        // Stored files must not outlive a failed listing
        for object in &stored {
            state.storage.delete_quiet(&object.key).await;
        }
        return Err(e);
    }

    tracing::info!(
        warehouse_id = %warehouse_id,
        owner_id = %auth.sub,
        images = images.len(),
        documents = documents.len(),
        "Listing submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": warehouse_id })),
    ))
}

/// GET /api/warehouse/my
///
/// The caller's listings, any status, newest first.
pub async fn my_warehouses(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS}
        FROM warehouses
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(auth.sub)
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

/// GET /api/warehouse/:id
///
/// Listing detail. Non-active listings are visible only to their owner or
/// a superadmin; everyone else sees a 404.
pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    OptionalAuth(session): OptionalAuth,
) -> Result<impl IntoResponse, ApiError> {
    let listing = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        SELECT {WAREHOUSE_COLUMNS}
        FROM warehouses
        WHERE id = $1
        "#
    ))
    .bind(warehouse_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let is_active = ListingStatus::from(listing.status.clone()) == ListingStatus::Active;
    let can_view = is_active
        || session
            .as_ref()
            .is_some_and(|s| s.sub == listing.owner_id || s.is_superadmin());
    if !can_view {
        return Err(ApiError::not_found("Listing not found"));
    }

    let images = load_images(&state.db, listing.id).await?;

    Ok(Json(json!({
        "success": true,
        "warehouse": WarehouseWithImages::new(listing, images),
    })))
}

/// PUT /api/warehouse/:id
///
/// Owner-only partial update. Editing never changes the review status.
pub async fn update_warehouse(
    State(state): State<Arc<AppState>>,
    Path(warehouse_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateWarehouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(size) = req.warehouse_size {
        if size <= 0 {
            return Err(ApiError::bad_request("Warehouse size must be greater than zero"));
        }
    }
    if let Some(price) = req.price {
        if price <= Decimal::ZERO {
            return Err(ApiError::bad_request("Price must be greater than zero"));
        }
    }
    if let Some(listing_for) = &req.listing_for {
        if ListingFor::parse(listing_for).is_none() {
            return Err(ApiError::bad_request("Listing must be for rent, sale, or lease"));
        }
    }
    validate_coords(req.latitude, req.longitude)?;
    if let Some(pincode) = &req.pincode {
        validate_pincode(pincode.trim())?;
    }
    if let Some(mobile) = &req.contact_mobile {
        validate_mobile(mobile.trim())?;
    }

    let owner_id: Uuid = sqlx::query_scalar("SELECT owner_id FROM warehouses WHERE id = $1")
        .bind(warehouse_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if owner_id != auth.sub {
        return Err(ApiError::forbidden("You do not own this listing"));
    }

    sqlx::query(
        r#"
        UPDATE warehouses
        SET title = COALESCE($1, title),
            warehouse_type = COALESCE($2, warehouse_type),
            warehouse_size = COALESCE($3, warehouse_size),
            price = COALESCE($4, price),
            listing_for = COALESCE($5, listing_for),
            description = COALESCE($6, description),
            address = COALESCE($7, address),
            city = COALESCE($8, city),
            state = COALESCE($9, state),
            pincode = COALESCE($10, pincode),
            latitude = COALESCE($11, latitude),
            longitude = COALESCE($12, longitude),
            amenities = COALESCE($13, amenities),
            contact_name = COALESCE($14, contact_name),
            contact_mobile = COALESCE($15, contact_mobile),
            updated_at = NOW()
        WHERE id = $16
        "#,
    )
    .bind(&req.title)
    .bind(&req.warehouse_type)
    .bind(req.warehouse_size)
    .bind(req.price)
    .bind(req.listing_for.as_ref().and_then(|v| ListingFor::parse(v)).map(|v| v.to_string()))
    .bind(&req.description)
    .bind(&req.address)
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.pincode)
    .bind(req.latitude)
    .bind(req.longitude)
    .bind(req.amenities.as_ref().map(|a| json!(a)))
    .bind(&req.contact_name)
    .bind(&req.contact_mobile)
    .bind(warehouse_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Failed to update listing: {}", e)))?;

    Ok(Json(json!({ "success": true })))
}
