//! Warehouse listing domain types
//!
//! A listing is created pending, becomes publicly visible when a superadmin
//! approves it, and carries an ordered set of media attachments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review state of a listing. Only `active` rows are publicly visible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Pending,
    Active,
    Rejected,
}

impl From<String> for ListingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => Self::Active,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// What the listing is offered for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingFor {
    Rent,
    Sale,
    Lease,
}

impl ListingFor {
    /// Strict parse used for input validation
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rent" => Some(Self::Rent),
            "sale" => Some(Self::Sale),
            "lease" => Some(Self::Lease),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rent => write!(f, "rent"),
            Self::Sale => write!(f, "sale"),
            Self::Lease => write!(f, "lease"),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub warehouse_type: String,
    pub warehouse_size: i64,
    pub price: Decimal,
    pub listing_for: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Raw jsonb column; serialized views expose the normalized list instead
    #[serde(skip)]
    pub amenities: serde_json::Value,
    pub contact_name: Option<String>,
    pub contact_mobile: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public subset of an image attachment, ordered primary-first
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseImage {
    pub id: Uuid,
    pub file_url: String,
    pub is_primary: bool,
    pub display_order: i32,
}

/// Listing plus its normalized amenities and ordered images
#[derive(Debug, Serialize)]
pub struct WarehouseWithImages {
    #[serde(flatten)]
    pub listing: Warehouse,
    pub amenities: Vec<String>,
    pub images: Vec<WarehouseImage>,
}

impl WarehouseWithImages {
    pub fn new(listing: Warehouse, images: Vec<WarehouseImage>) -> Self {
        let amenities = normalize_amenities(&listing.amenities);
        Self {
            listing,
            amenities,
            images,
        }
    }
}

/// Payload for PUT /api/warehouse/:id (partial update)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateWarehouseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub warehouse_type: Option<String>,
    #[serde(default)]
    pub warehouse_size: Option<i64>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub listing_for: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_mobile: Option<String>,
}

/// Payload for POST /api/admin/warehouses/:id/reject
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RejectListingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Text fields collected from the listing creation multipart form.
/// Image and document files travel separately.
#[derive(Debug, Clone, Default)]
pub struct ListingFields {
    pub title: String,
    pub warehouse_type: String,
    pub warehouse_size: i64,
    pub price: Decimal,
    pub listing_for: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenities: Vec<String>,
    pub contact_name: Option<String>,
    pub contact_mobile: Option<String>,
}

/// Normalize the stored amenities value to a plain string list.
///
/// The column holds either a JSON array or a JSON-encoded string of one
/// (older rows). Anything malformed reads as empty rather than an error.
pub fn normalize_amenities(raw: &serde_json::Value) -> Vec<String> {
    match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => serde_json::from_str::<Vec<String>>(s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amenities_array_passes_through() {
        let raw = json!(["parking", "cctv", "loading dock"]);
        assert_eq!(
            normalize_amenities(&raw),
            vec!["parking", "cctv", "loading dock"]
        );
    }

    #[test]
    fn amenities_json_encoded_string_is_parsed() {
        let raw = json!("[\"parking\",\"cctv\"]");
        assert_eq!(normalize_amenities(&raw), vec!["parking", "cctv"]);
    }

    #[test]
    fn malformed_amenities_read_as_empty() {
        for raw in [json!("not json"), json!(42), json!(null), json!({"a": 1})] {
            assert!(normalize_amenities(&raw).is_empty(), "{raw}");
        }
    }

    #[test]
    fn non_string_array_entries_are_skipped() {
        let raw = json!(["parking", 7, null, "cctv"]);
        assert_eq!(normalize_amenities(&raw), vec!["parking", "cctv"]);
    }

    #[test]
    fn listing_for_parses_known_values_only() {
        assert_eq!(ListingFor::parse(" Rent "), Some(ListingFor::Rent));
        assert_eq!(ListingFor::parse("LEASE"), Some(ListingFor::Lease));
        assert_eq!(ListingFor::parse("borrow"), None);
    }

    #[test]
    fn listing_status_round_trips_db_strings() {
        assert_eq!(ListingStatus::from("active".to_string()), ListingStatus::Active);
        assert_eq!(ListingStatus::Rejected.to_string(), "rejected");
        assert_eq!(
            ListingStatus::from("garbage".to_string()),
            ListingStatus::Pending
        );
    }
}
