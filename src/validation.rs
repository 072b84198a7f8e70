//! Field validation for registration and listing payloads
//!
//! Validators return the canonical error message for each field so
//! handlers stay flat.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ApiError, ApiResult};

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("valid regex"));

static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").expect("valid regex"));

static PAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("valid regex"));

static AADHAAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[2-9][0-9]{11}$").expect("valid regex"));

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").expect("valid regex"));

/// Subdomain labels that can never be claimed by an agent.
pub const RESERVED_DOMAINS: &[&str] = &[
    "admin", "api", "www", "app", "mail", "ftp", "blog", "shop", "store", "support", "help",
    "about", "contact", "terms", "privacy", "login", "register", "dashboard", "profile",
    "settings", "search", "static", "assets", "cdn", "media", "images", "js", "css", "fonts",
];

/// 10-digit Indian mobile number starting 6-9.
pub fn validate_mobile(value: &str) -> ApiResult<()> {
    if MOBILE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Invalid mobile number. Must be a 10-digit Indian mobile number.",
        ))
    }
}

/// 6-digit Indian postal code, no leading zero.
pub fn validate_pincode(value: &str) -> ApiResult<()> {
    if PINCODE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "Invalid pincode. Must be a 6-digit Indian postal code.",
        ))
    }
}

/// PAN card number, e.g. ABCDE1234F.
pub fn validate_pan(value: &str) -> ApiResult<()> {
    if PAN_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid PAN format."))
    }
}

/// 12-digit Aadhaar number, first digit 2-9.
pub fn validate_aadhaar(value: &str) -> ApiResult<()> {
    if AADHAAR_RE.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid Aadhaar number."))
    }
}

/// Structural email check. Full verification happens at the provider
/// during OAuth, so this only rejects obviously malformed input.
pub fn validate_email(value: &str) -> ApiResult<()> {
    let valid = value.len() <= 254
        && !value.contains(char::is_whitespace)
        && value.split('@').count() == 2
        && value.split('@').all(|part| !part.is_empty())
        && value
            .rsplit('@')
            .next()
            .is_some_and(|domain| domain.contains('.') && !domain.starts_with('.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid email address."))
    }
}

/// Lowercased, trimmed form used for storage and uniqueness checks.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Subdomain label rules: 3-63 chars, lowercase alphanumerics and
/// hyphens, no edge hyphens, not a reserved word.
pub fn validate_domain_name(normalized: &str) -> ApiResult<()> {
    if normalized.len() < 3 || normalized.len() > 63 {
        return Err(ApiError::bad_request(
            "Domain must be between 3 and 63 characters.",
        ));
    }
    if !DOMAIN_RE.is_match(normalized) {
        return Err(ApiError::bad_request(
            "Domain may only contain lowercase letters, numbers, and hyphens, and cannot start or end with a hyphen.",
        ));
    }
    if RESERVED_DOMAINS.contains(&normalized) {
        return Err(ApiError::bad_request("This domain name is reserved."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_accepts_valid_indian_numbers() {
        for number in ["6000000000", "7123456789", "9876543210"] {
            assert!(validate_mobile(number).is_ok(), "{number}");
        }
    }

    #[test]
    fn mobile_rejects_bad_prefix_length_and_charset() {
        for number in [
            "5876543210",  // leading digit below 6
            "0876543210",  // leading zero
            "987654321",   // 9 digits
            "98765432100", // 11 digits
            "98765a3210",  // non-digit
            "+919876543210",
            "",
        ] {
            assert!(validate_mobile(number).is_err(), "{number}");
        }
    }

    #[test]
    fn pincode_rules() {
        assert!(validate_pincode("560001").is_ok());
        assert!(validate_pincode("060001").is_err());
        assert!(validate_pincode("56001").is_err());
        assert!(validate_pincode("5600011").is_err());
    }

    #[test]
    fn pan_and_aadhaar_rules() {
        assert!(validate_pan("ABCDE1234F").is_ok());
        assert!(validate_pan("abcde1234f").is_err());
        assert!(validate_pan("ABCD12345F").is_err());
        assert!(validate_aadhaar("234567890123").is_ok());
        assert!(validate_aadhaar("123456789012").is_err());
        assert!(validate_aadhaar("23456789012").is_err());
    }

    #[test]
    fn email_structure() {
        assert!(validate_email("agent@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("nodot@localhost").is_err());
    }

    #[test]
    fn domain_rules() {
        assert!(validate_domain_name("acme-storage").is_ok());
        assert!(validate_domain_name("a1").is_err());
        assert!(validate_domain_name("-acme").is_err());
        assert!(validate_domain_name("acme-").is_err());
        assert!(validate_domain_name("Acme").is_err());
        assert!(validate_domain_name("admin").is_err());
        assert!(validate_domain_name(&"x".repeat(64)).is_err());
    }

    #[test]
    fn domain_normalization() {
        assert_eq!(normalize_domain("  Acme-Storage  "), "acme-storage");
    }
}
