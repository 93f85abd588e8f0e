//! Application configuration
//!
//! Loaded from a TOML file. Every section has defaults, so an empty or
//! missing file yields a runnable service.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::application::{BarcodeIssuance, EngineSettings};
use crate::domain::ExtraMinutesPolicy;
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Default location: `<config dir>/admission-service/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("admission-service")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub venue: VenueConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DatabaseConfig::default().url,
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseSection {
    /// `DATABASE_URL` wins over the file.
    pub fn connection_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.url.clone())
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            max_connections: self.pool.max_connections,
            min_connections: self.pool.min_connections,
            connect_timeout_secs: self.pool.connect_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hex SHA-256 digests of accepted staff API keys. Empty disables the check.
    pub api_key_hashes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    /// Wall-clock offset from UTC, in minutes
    pub utc_offset_minutes: i32,
    pub barcode_prefix: String,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            barcode_prefix: "B".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraMinutesSetting {
    #[default]
    PerCharge,
    PerUnit,
}

impl From<ExtraMinutesSetting> for ExtraMinutesPolicy {
    fn from(s: ExtraMinutesSetting) -> Self {
        match s {
            ExtraMinutesSetting::PerCharge => Self::PerCharge,
            ExtraMinutesSetting::PerUnit => Self::PerUnit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceSetting {
    #[default]
    PerGuest,
    PerGroup,
}

impl From<IssuanceSetting> for BarcodeIssuance {
    fn from(s: IssuanceSetting) -> Self {
        match s {
            IssuanceSetting::PerGuest => Self::PerGuest,
            IssuanceSetting::PerGroup => Self::PerGroup,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub extra_minutes_policy: ExtraMinutesSetting,
    pub issuance: IssuanceSetting,
}

impl AppConfig {
    /// Read the file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.server.api_port == 0 {
            return Err(InfraError::InvalidConfig("server.api_port must be non-zero".into()));
        }
        if self.database.connection_url().trim().is_empty() {
            return Err(InfraError::InvalidConfig("database.url is empty".into()));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(InfraError::InvalidConfig(format!(
                "logging.level '{}' is not one of {:?}",
                self.logging.level, LOG_LEVELS
            )));
        }
        // A numeric prefix would make generated numbers indistinguishable from mobiles.
        let prefix = &self.venue.barcode_prefix;
        if prefix.is_empty() || prefix.chars().all(|c| c.is_ascii_digit() || c == '+') {
            return Err(InfraError::InvalidConfig(format!(
                "venue.barcode_prefix '{}' must contain a non-digit character",
                prefix
            )));
        }
        if self.venue.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(InfraError::InvalidConfig(format!(
                "venue.utc_offset_minutes {} is out of range",
                self.venue.utc_offset_minutes
            )));
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, InfraError> {
        FixedOffset::east_opt(self.venue.utc_offset_minutes * 60).ok_or_else(|| {
            InfraError::InvalidConfig(format!(
                "venue.utc_offset_minutes {} is out of range",
                self.venue.utc_offset_minutes
            ))
        })
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, InfraError> {
        Ok(EngineSettings {
            extra_minutes_policy: self.billing.extra_minutes_policy.into(),
            issuance: self.billing.issuance.into(),
            barcode_prefix: self.venue.barcode_prefix.clone(),
            utc_offset: self.utc_offset()?,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.api_port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.venue.barcode_prefix, "B");
        assert_eq!(cfg.billing.extra_minutes_policy, ExtraMinutesSetting::PerCharge);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            api_port = 9100

            [venue]
            utc_offset_minutes = 180

            [billing]
            extra_minutes_policy = "per_unit"
            issuance = "per_group"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.api_port, 9100);
        assert_eq!(cfg.server.api_host, "0.0.0.0");

        let settings = cfg.engine_settings().unwrap();
        assert_eq!(settings.extra_minutes_policy, ExtraMinutesPolicy::PerUnit);
        assert_eq!(settings.issuance, BarcodeIssuance::PerGroup);
        assert_eq!(settings.utc_offset.local_minus_utc(), 180 * 60);
        assert_eq!(settings.barcode_prefix, "B");
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.server.api_port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.venue.barcode_prefix = "+90".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.venue.utc_offset_minutes = 1440;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("admission-cfg-{}", std::process::id()));
        let path = dir.join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.security.api_key_hashes = vec!["ab".repeat(32)];
        cfg.venue.barcode_prefix = "PLAY".into();
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.security.api_key_hashes, cfg.security.api_key_hashes);
        assert_eq!(loaded.venue.barcode_prefix, "PLAY");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = AppConfig::load(Path::new("/nonexistent/admission/config.toml")).unwrap();
        assert_eq!(cfg.database.pool.max_connections, 10);
    }
}
