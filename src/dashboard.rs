//! Dashboard view assembled from the signed-in profile.

use serde::Serialize;

use crate::models::{Role, UserProfile};
use crate::qr::{self, QrError};

/// A labelled profile attribute. Only present attributes are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileDetail {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub greeting: String,
    pub name: String,
    pub role: &'static str,
    pub health_id: String,
    pub masked_id: String,
    /// Patient: date of birth, gender, phone. Provider: specialization,
    /// hospital/clinic, registration number.
    pub details: Vec<ProfileDetail>,
    pub account_created: Option<String>,
    pub qr_svg: String,
}

pub fn build_dashboard(profile: &UserProfile) -> Result<DashboardView, QrError> {
    Ok(DashboardView {
        greeting: format!("Welcome, {}!", profile.name),
        name: profile.name.clone(),
        role: profile.role.label(),
        health_id: profile.health_id.clone(),
        masked_id: profile.masked_id(),
        details: role_details(profile),
        account_created: profile
            .created_at
            .map(|t| t.date_naive().format("%Y-%m-%d").to_string()),
        qr_svg: qr::health_card_svg(profile)?,
    })
}

fn role_details(profile: &UserProfile) -> Vec<ProfileDetail> {
    let candidates: Vec<(&'static str, Option<String>)> = match profile.role {
        Role::Patient => vec![
            ("Date of Birth", profile.dob.map(|d| d.format("%Y-%m-%d").to_string())),
            ("Gender", profile.gender.clone()),
            ("Phone", profile.phone.clone()),
        ],
        Role::Provider => vec![
            ("Specialization", profile.specialization.clone()),
            ("Hospital/Clinic", profile.hospital.clone()),
            ("Medical Reg. No.", profile.medical_reg_no.clone()),
        ],
    };

    candidates
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|value| ProfileDetail { label, value })
        })
        .collect()
}
