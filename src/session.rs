//! Signed-in user, kept under the `currentUser` storage key.

use thiserror::Error;

use crate::config::CURRENT_USER_KEY;
use crate::models::UserProfile;
use crate::storage::{KeyValueStore, StorageError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No user is signed in")]
    NotSignedIn,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Cannot serialize profile: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Reads the signed-in profile. A missing or unreadable entry means nobody
/// is signed in.
pub fn current_user(kv: &dyn KeyValueStore) -> Option<UserProfile> {
    let bytes = match kv.get(CURRENT_USER_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot read current user");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(error = %e, "Stored current user is corrupt");
            None
        }
    }
}

/// Like [`current_user`], but an absent session is an error.
pub fn require_user(kv: &dyn KeyValueStore) -> Result<UserProfile, SessionError> {
    current_user(kv).ok_or(SessionError::NotSignedIn)
}

/// Stores `profile` as the signed-in user.
pub fn sign_in(kv: &dyn KeyValueStore, profile: &UserProfile) -> Result<(), SessionError> {
    if profile.health_id.trim().is_empty() {
        return Err(SessionError::InvalidProfile("healthId is required".into()));
    }
    if profile.name.trim().is_empty() {
        return Err(SessionError::InvalidProfile("name is required".into()));
    }
    let bytes = serde_json::to_vec(profile)?;
    kv.set(CURRENT_USER_KEY, &bytes)?;
    tracing::info!(health_id = %profile.health_id, "Signed in");
    Ok(())
}

/// Clears the signed-in user. Stored records are untouched.
pub fn sign_out(kv: &dyn KeyValueStore) -> Result<(), SessionError> {
    kv.remove(CURRENT_USER_KEY)?;
    tracing::info!("Signed out");
    Ok(())
}
