use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sv_core::domain::entities::{Verification, VerificationStatus};
use sv_core::domain::value_objects::Money;
use sv_core::services::lifecycle::{CreateVerificationRequest, PollBatchResult};
use uuid::Uuid;
use validator::Validate;

static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").unwrap());
static AREA_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3}$").unwrap());

/// Body of `POST /api/v1/verifications`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVerificationBody {
    /// Target service, e.g. "whatsapp"
    #[validate(length(min = 1, max = 64))]
    pub service_name: String,

    /// ISO 3166 alpha-2 country code
    #[validate(regex = "COUNTRY_CODE")]
    pub country: String,

    #[validate(regex = "AREA_CODE")]
    pub area_code: Option<String>,

    #[validate(length(min = 1, max = 32))]
    pub carrier: Option<String>,
}

impl From<CreateVerificationBody> for CreateVerificationRequest {
    fn from(body: CreateVerificationBody) -> Self {
        Self {
            service_name: body.service_name,
            country: body.country,
            area_code: body.area_code,
            carrier: body.carrier,
        }
    }
}

/// `?limit=` for history listings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// A verification as its owner sees it
///
/// Provider bookkeeping (activation ID, wholesale cost) stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub id: Uuid,
    pub service_name: String,
    pub country: String,
    pub phone_number: Option<String>,
    pub status: VerificationStatus,
    pub cost: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_text: Option<String>,
    pub refunded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Verification> for VerificationResponse {
    fn from(v: Verification) -> Self {
        Self {
            id: v.id,
            service_name: v.service_name,
            country: v.country,
            phone_number: v.phone_number,
            status: v.status,
            cost: v.cost,
            sms_code: v.sms_code,
            sms_text: v.sms_text,
            refunded: v.refunded_at.is_some(),
            created_at: v.created_at,
            updated_at: v.updated_at,
            completed_at: v.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollFailureResponse {
    pub verification_id: Uuid,
    pub error: String,
}

/// Outcome of polling every pending record of the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollBatchResponse {
    pub verifications: Vec<VerificationResponse>,
    pub errors: Vec<PollFailureResponse>,
}

impl From<PollBatchResult> for PollBatchResponse {
    fn from(batch: PollBatchResult) -> Self {
        Self {
            verifications: batch.results.into_iter().map(Into::into).collect(),
            errors: batch
                .errors
                .into_iter()
                .map(|f| PollFailureResponse {
                    verification_id: f.verification_id,
                    error: f.error,
                })
                .collect(),
        }
    }
}
