//! Agent profile, KYC, and custom domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// KYC review state for agents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl From<String> for VerificationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Agent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub company_name: Option<String>,
    pub license_number: Option<String>,
    pub experience_years: Option<i32>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub pan_number: String,
    pub aadhar_number: String,
    pub profile_photo_url: String,
    pub kyc_document_url: String,
    pub banner_url: Option<String>,
    pub verification_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields collected from the agent registration multipart form.
/// The two required files (profile photo, KYC document) travel separately.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistrationFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub company_name: Option<String>,
    pub license_number: Option<String>,
    pub experience_years: Option<i32>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub pan_number: String,
    pub aadhar_number: String,
    pub domain_name: Option<String>,
}

/// Agent profile joined with its claimed domain, for admin listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AgentWithDomain {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub agent: Agent,
    pub domain_name: Option<String>,
}

/// Payload for POST /api/agent/domain
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimDomainRequest {
    pub domain_name: String,
}

/// Payload for POST /api/admin/agents/:id/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyAgentRequest {
    pub approve: bool,
}
