//! API configuration
//!
//! Values are read from an optional `config/portal.{toml,yaml,json}` file and
//! then from `PORTAL_`-prefixed environment variables. Anything left unset
//! falls back to [`ApiConfig::default`].

use std::time::Duration;

use serde::Deserialize;

use core_kernel::Currency;
use domain_billing::BillingSettings;
use domain_booking::QuotaPolicy;
use infra_db::DatabaseConfig;

/// Where the ports keep their data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Required when `storage` is `postgres`
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Default filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageBackend,
    /// Currency used in user-facing amounts
    pub currency: Currency,
    /// Reject invoice payments for branches without a cash account
    pub require_cash_account: bool,
    pub daily_booking_cap_minutes: i64,
    /// Monthly booking allowance for customers without a package
    pub default_monthly_hours: u32,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: None,
            db_max_connections: 10,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage: StorageBackend::Postgres,
            currency: Currency::USD,
            require_cash_account: true,
            daily_booking_cap_minutes: 120,
            default_monthly_hours: 20,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `config/portal.*` and `PORTAL_*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name("config/portal").required(false))
            .add_source(config::Environment::with_prefix("PORTAL").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations that cannot start a server
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage == StorageBackend::Postgres && self.database_url.is_none() {
            return Err(config::ConfigError::Message(
                "database_url is required for postgres storage".to_string(),
            ));
        }
        if self.daily_booking_cap_minutes <= 0 {
            return Err(config::ConfigError::Message(
                "daily_booking_cap_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn billing_settings(&self) -> BillingSettings {
        BillingSettings {
            currency: self.currency,
            require_cash_account: self.require_cash_account,
        }
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            daily_cap_minutes: self.daily_booking_cap_minutes,
            default_monthly_hours: self.default_monthly_hours,
        }
    }

    /// Pool settings, if a database URL is configured
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database_url
            .as_ref()
            .map(|url| DatabaseConfig::new(url.clone()).max_connections(self.db_max_connections))
    }

    /// True while the placeholder signing secret is in use
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == Self::default().jwt_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.quota_policy().daily_cap_minutes, 120);
        assert_eq!(config.quota_policy().default_monthly_hours, 20);
        assert!(config.billing_settings().require_cash_account);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let config = ApiConfig::default();
        assert!(config.validate().is_err());

        let config = ApiConfig {
            database_url: Some("postgres://localhost/portal".to_string()),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.database_config().map(|c| c.max_connections), Some(10));
    }

    #[test]
    fn test_memory_storage_needs_no_database() {
        let config = ApiConfig {
            storage: StorageBackend::Memory,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.database_config().is_none());
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .and_then(|b| b.set_override("storage", "memory"))
            .and_then(|b| b.set_override("log_format", "json"))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.jwt_expiration_secs, 3600);
    }
}
