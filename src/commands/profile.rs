//! Session and dashboard commands:
//! - `sign_in`: store a profile as the current user
//! - `sign_out`: clear the current user
//! - `get_dashboard`: profile view with QR code

use crate::core_state::AppState;
use crate::dashboard::{self, DashboardView};
use crate::models::UserProfile;
use crate::session;

pub fn sign_in(profile: UserProfile, state: &AppState) -> Result<(), String> {
    session::sign_in(state.kv(), &profile).map_err(|e| e.to_string())
}

pub fn sign_out(state: &AppState) -> Result<(), String> {
    session::sign_out(state.kv()).map_err(|e| e.to_string())
}

/// Dashboard for the signed-in user. Errors when nobody is signed in, which
/// front ends treat as "go to login".
pub fn get_dashboard(state: &AppState) -> Result<DashboardView, String> {
    let profile = session::require_user(state.kv()).map_err(|e| e.to_string())?;
    dashboard::build_dashboard(&profile).map_err(|e| e.to_string())
}
