//! Health-card QR code shown on the dashboard.

use serde::Serialize;
use thiserror::Error;

use crate::models::UserProfile;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR generation failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("Cannot serialize QR payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Data encoded in the QR code. The sensitive identifier is masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCardPayload {
    pub health_id: String,
    pub name: String,
    pub role: String,
    pub aadhaar: String,
}

impl From<&UserProfile> for HealthCardPayload {
    fn from(profile: &UserProfile) -> Self {
        Self {
            health_id: profile.health_id.clone(),
            name: profile.name.clone(),
            role: profile.role.as_str().to_string(),
            aadhaar: profile.masked_id(),
        }
    }
}

/// Renders the profile's health card as an SVG QR code.
pub fn health_card_svg(profile: &UserProfile) -> Result<String, QrError> {
    use qrcode::render::svg;
    use qrcode::QrCode;

    let payload = serde_json::to_string(&HealthCardPayload::from(profile))?;
    let code = QrCode::new(payload.as_bytes())?;

    let svg_string = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#1c1917"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build();

    Ok(svg_string)
}
