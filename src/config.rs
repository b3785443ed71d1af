use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "Health Records";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key holding the signed-in profile.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Prefix of the per-subject record collection key.
pub const RECORDS_KEY_PREFIX: &str = "medical_records_";

/// Storage key for one subject's record collection.
pub fn records_key(health_id: &str) -> String {
    format!("{RECORDS_KEY_PREFIX}{health_id}")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "health_records=info,health_records_lib=info"
}

/// Get the application data directory
/// (platform local data dir, falling back to the working directory)
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("HealthRecords")
}

/// Filesystem locations used by the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// SQLite file backing the key-value store.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.db")
    }

    /// Directory receiving exported PDFs.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(app_data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_key_uses_health_id() {
        assert_eq!(records_key("HID-001"), "medical_records_HID-001");
    }

    #[test]
    fn default_config_under_app_data() {
        let config = AppConfig::default();
        assert!(config.data_dir.ends_with("HealthRecords"));
        assert!(config.storage_path().starts_with(&config.data_dir));
        assert!(config.exports_dir().ends_with("exports"));
    }

    #[test]
    fn custom_data_dir_is_respected() {
        let config = AppConfig::new("/tmp/hr-test");
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/hr-test/local_storage.db"));
        assert_eq!(config.exports_dir(), PathBuf::from("/tmp/hr-test/exports"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
