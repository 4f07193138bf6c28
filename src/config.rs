use conversion_session::{ArchiveCompression, Quality, SessionConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../assets/png2webp.toml");

/// Application settings, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_quality: Quality,
    pub notice_timeout_secs: u64,
    pub compression: ArchiveCompression,
    /// Where desktop builds write the archive
    pub download_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::default(),
            notice_timeout_secs: 5,
            compression: ArchiveCompression::Stored,
            download_dir: ".".to_string(),
        }
    }
}

impl AppConfig {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Loads the bundled configuration, falling back to defaults
    pub fn load() -> Self {
        match Self::from_toml(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid bundled config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn notice_timeout(&self) -> Duration {
        Duration::from_secs(self.notice_timeout_secs)
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            default_quality: self.default_quality,
            notice_timeout: self.notice_timeout(),
            compression: self.compression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_config_parses() {
        let config = AppConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.default_quality.value(), 80);
        assert_eq!(config.notice_timeout(), Duration::from_secs(5));
        assert_eq!(config.compression, ArchiveCompression::Stored);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_toml("compression = \"deflated\"").unwrap();
        assert_eq!(config.compression, ArchiveCompression::Deflated);
        assert_eq!(config.default_quality, Quality::default());
        assert_eq!(config.download_dir, ".");
    }

    #[test]
    fn test_out_of_range_quality_is_rejected() {
        assert!(AppConfig::from_toml("default_quality = 0").is_err());
        assert!(AppConfig::from_toml("default_quality = 101").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig {
            default_quality: Quality::new(55).unwrap(),
            ..AppConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_session_config() {
        let session = AppConfig::default().session();
        assert_eq!(session.notice_timeout, Duration::from_secs(5));
        assert_eq!(session.default_quality.value(), 80);
    }
}
