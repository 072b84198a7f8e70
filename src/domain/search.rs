//! Search filter compilation
//!
//! Translates the public search parameters (city, state, type, size bucket,
//! map bounds) into the normalized values the SQL layer binds.

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Query params for GET /api/warehouse/search
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchParams {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "type")]
    pub warehouse_type: Option<String>,
    #[serde(default)]
    pub distance: Option<i64>,
}

/// Query params for GET /api/warehouse/bounds. The viewport corners arrive
/// as strings from the map widget and are validated here.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BoundsParams {
    #[serde(default, rename = "neLat")]
    pub ne_lat: Option<String>,
    #[serde(default, rename = "neLng")]
    pub ne_lng: Option<String>,
    #[serde(default, rename = "swLat")]
    pub sw_lat: Option<String>,
    #[serde(default, rename = "swLng")]
    pub sw_lng: Option<String>,
    #[serde(default, rename = "type")]
    pub warehouse_type: Option<String>,
}

/// A parsed viewport rectangle, corners inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsRect {
    pub ne_lat: f64,
    pub ne_lng: f64,
    pub sw_lat: f64,
    pub sw_lng: f64,
}

impl BoundsParams {
    pub fn parse_rect(&self) -> ApiResult<BoundsRect> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        match (
            parse(&self.ne_lat),
            parse(&self.ne_lng),
            parse(&self.sw_lat),
            parse(&self.sw_lng),
        ) {
            (Some(ne_lat), Some(ne_lng), Some(sw_lat), Some(sw_lng)) => Ok(BoundsRect {
                ne_lat,
                ne_lng,
                sw_lat,
                sw_lng,
            }),
            _ => Err(ApiError::bad_request(
                "Invalid map bounds. neLat, neLng, swLat and swLng must all be numbers.",
            )),
        }
    }
}

/// The `distance` slider doubles as a size filter. Its maximum is a
/// sentinel meaning "this size or larger"; every other value caps the size.
pub const MAX_SIZE_SENTINEL: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBucket {
    AtLeast(i64),
    AtMost(i64),
}

impl SizeBucket {
    pub fn from_distance(distance: i64) -> Self {
        if distance == MAX_SIZE_SENTINEL {
            Self::AtLeast(MAX_SIZE_SENTINEL)
        } else {
            Self::AtMost(distance)
        }
    }

    /// (min, max) bounds to bind into the SQL filter
    pub fn bounds(self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::AtLeast(v) => (Some(v), None),
            Self::AtMost(v) => (None, Some(v)),
        }
    }
}

/// Two-letter state codes resolve to the full names listings are stored
/// under. Unknown inputs pass through unchanged.
const STATE_CODES: &[(&str, &str)] = &[
    ("AN", "Andaman and Nicobar Islands"),
    ("AP", "Andhra Pradesh"),
    ("AR", "Arunachal Pradesh"),
    ("AS", "Assam"),
    ("BR", "Bihar"),
    ("CG", "Chhattisgarh"),
    ("CH", "Chandigarh"),
    ("DL", "Delhi"),
    ("GA", "Goa"),
    ("GJ", "Gujarat"),
    ("HP", "Himachal Pradesh"),
    ("HR", "Haryana"),
    ("JH", "Jharkhand"),
    ("JK", "Jammu and Kashmir"),
    ("KA", "Karnataka"),
    ("KL", "Kerala"),
    ("LA", "Ladakh"),
    ("LD", "Lakshadweep"),
    ("MH", "Maharashtra"),
    ("ML", "Meghalaya"),
    ("MN", "Manipur"),
    ("MP", "Madhya Pradesh"),
    ("MZ", "Mizoram"),
    ("NL", "Nagaland"),
    ("OD", "Odisha"),
    ("PB", "Punjab"),
    ("PY", "Puducherry"),
    ("RJ", "Rajasthan"),
    ("SK", "Sikkim"),
    ("TN", "Tamil Nadu"),
    ("TR", "Tripura"),
    ("TS", "Telangana"),
    ("UK", "Uttarakhand"),
    ("UP", "Uttar Pradesh"),
    ("WB", "West Bengal"),
];

pub fn resolve_state(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() == 2 {
        let code = trimmed.to_uppercase();
        if let Some((_, name)) = STATE_CODES.iter().find(|(c, _)| *c == code) {
            return (*name).to_string();
        }
    }
    trimmed.to_string()
}

pub fn normalize_city(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// First seven characters of the normalized form (whole string when shorter)
pub fn city_prefix(normalized: &str) -> String {
    normalized.chars().take(7).collect()
}

/// Tolerant city predicate: exact match on the normalized forms, or equal
/// 7-character prefixes. Absorbs transliteration variants like
/// Tirupati / Tirupathi at the cost of false positives on similar names.
pub fn city_matches(stored: &str, query: &str) -> bool {
    let stored = normalize_city(stored);
    let query = normalize_city(query);
    stored == query || city_prefix(&stored) == city_prefix(&query)
}

/// Type filter applies only when present and not the literal `all`
pub fn type_filter(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        Some(t) if !t.is_empty() && t != "all" => Some(t.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_distance_means_at_least() {
        assert_eq!(
            SizeBucket::from_distance(10_000),
            SizeBucket::AtLeast(10_000)
        );
        assert_eq!(SizeBucket::from_distance(10_000).bounds(), (Some(10_000), None));
    }

    #[test]
    fn other_distances_cap_the_size() {
        assert_eq!(SizeBucket::from_distance(500), SizeBucket::AtMost(500));
        assert_eq!(SizeBucket::from_distance(500).bounds(), (None, Some(500)));
        assert_eq!(SizeBucket::from_distance(10_001).bounds(), (None, Some(10_001)));
    }

    #[test]
    fn state_codes_resolve_to_full_names() {
        assert_eq!(resolve_state("KA"), "Karnataka");
        assert_eq!(resolve_state("ka"), "Karnataka");
        assert_eq!(resolve_state(" tn "), "Tamil Nadu");
    }

    #[test]
    fn full_names_and_unknown_codes_pass_through() {
        assert_eq!(resolve_state("Karnataka"), "Karnataka");
        assert_eq!(resolve_state("XX"), "XX");
        assert_eq!(resolve_state(""), "");
    }

    #[test]
    fn city_prefix_match_absorbs_spelling_variants() {
        assert!(city_matches("Tirupati", "Tirupathi"));
        assert!(city_matches("  BENGALURU ", "bengaluru"));
        assert!(!city_matches("Mumbai", "Chennai"));
    }

    #[test]
    fn short_city_names_still_need_full_equality() {
        assert!(city_matches("Pune", "pune"));
        assert!(!city_matches("Punecity", "Pune"));
    }

    #[test]
    fn type_all_is_no_filter() {
        assert_eq!(type_filter(Some("all")), None);
        assert_eq!(type_filter(Some("  ")), None);
        assert_eq!(type_filter(None), None);
        assert_eq!(
            type_filter(Some(" cold_storage ")),
            Some("cold_storage".to_string())
        );
    }

    #[test]
    fn bounds_require_four_numeric_corners() {
        let params = BoundsParams {
            ne_lat: Some("13.1".into()),
            ne_lng: Some("77.8".into()),
            sw_lat: Some("12.8".into()),
            sw_lng: Some("77.4".into()),
            warehouse_type: None,
        };
        let rect = params.parse_rect().unwrap();
        assert_eq!(rect.ne_lat, 13.1);
        assert_eq!(rect.sw_lng, 77.4);

        let bad = BoundsParams {
            ne_lat: Some("north".into()),
            ..params.clone()
        };
        assert!(bad.parse_rect().is_err());

        let missing = BoundsParams {
            ne_lat: None,
            ..params
        };
        assert!(missing.parse_rect().is_err());
    }
}
