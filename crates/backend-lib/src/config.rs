// ============================
// confmock-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// What the store does when a read references an unknown ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Unknown IDs surface as 404s.
    Error,
    /// Unknown IDs get a generated mock entity, stashed in the memory
    /// overlay so subsequent reads are consistent.
    Synthesize,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Base URL used in generated links (join_url, download_url, ...)
    pub base_url: String,
    /// Log level
    pub log_level: String,
    /// Read-through cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Default page size for list endpoints
    pub default_page_size: usize,
    /// Maximum page size clamp for list endpoints
    pub max_page_size: usize,
    /// Default `from` date for list endpoints (YYYY-MM-DD)
    pub date_from: String,
    /// Default `to` date for list endpoints (YYYY-MM-DD)
    pub date_to: String,
    /// Unknown-ID read policy
    pub on_missing: MissingPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            base_url: "https://api.zoom.us".to_string(),
            log_level: "info".to_string(),
            cache_ttl_secs: 3600, // 1 hour
            default_page_size: 30,
            max_page_size: 300,
            date_from: "2026-01-01".to_string(),
            date_to: "2026-12-31".to_string(),
            on_missing: MissingPolicy::Error,
        }
    }
}

impl Settings {
    /// Load settings: defaults, then `confmock.toml`, then `CONFMOCK_*` env.
    pub fn load() -> Result<Self> {
        Self::load_from("confmock.toml")
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CONFMOCK_"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !["trace", "debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            anyhow::bail!("invalid log level: {}", self.log_level);
        }
        if self.cache_ttl_secs == 0 {
            anyhow::bail!("cache_ttl_secs must be positive");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size must be in 1..={}",
                self.max_page_size
            );
        }
        for (name, value) in [("date_from", &self.date_from), ("date_to", &self.date_to)] {
            if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                anyhow::bail!("{name} must be a YYYY-MM-DD date, got {value}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.default_page_size, 30);
        assert_eq!(settings.max_page_size, 300);
        assert_eq!(settings.on_missing, MissingPolicy::Error);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.log_level = "loud".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.cache_ttl_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.default_page_size = 500;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.date_from = "Jan 1 2026".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("confmock.toml");
        std::fs::write(
            &path,
            r#"
            base_url = "http://localhost:8000"
            cache_ttl_secs = 60
            on_missing = "synthesize"
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.base_url, "http://localhost:8000");
        assert_eq!(settings.cache_ttl_secs, 60);
        assert_eq!(settings.on_missing, MissingPolicy::Synthesize);
        // untouched keys keep their defaults
        assert_eq!(settings.date_from, "2026-01-01");
    }
}
