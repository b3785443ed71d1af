use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::blank_date;
use super::enums::Role;

/// Signed-in user as stored under `currentUser`.
///
/// Read-only to the record flow: the dashboard and the exporter only
/// display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub health_id: String,
    pub name: String,
    /// Sensitive national identifier. Render through [`mask_sensitive_id`].
    #[serde(rename = "aadhaar")]
    pub sensitive_id: String,
    pub role: Role,
    // Patient attributes
    #[serde(default, with = "blank_date", skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    // Provider attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_reg_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn masked_id(&self) -> String {
        mask_sensitive_id(&self.sensitive_id)
    }
}

/// Masks a sensitive identifier so only its last 4 characters remain,
/// e.g. `123456789012` → `****-****-9012`.
pub fn mask_sensitive_id(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****-****-{tail}")
}
