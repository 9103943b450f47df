//! # Configuration Management System
//!
//! Hierarchical configuration for the investigation core. Supports loading
//! from multiple sources in order of precedence:
//!
//! 1. **Environment Variables** (highest precedence)
//! 2. **Environment-specific TOML files** (e.g., `config/production.toml`)
//! 3. **Default TOML file** (`config/default.toml`) (lowest precedence)
//!
//! ## Usage
//!
//! ```rust
//! use investigation_core::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! let db_url = &config.database.url;
//! ```
//!
//! ## Environment Selection
//!
//! The configuration system automatically selects the appropriate environment
//! based on the `ENVIRONMENT` environment variable:
//!
//! - `development` (default): uses `config/development.toml`
//! - `testing`: uses `config/testing.toml`
//! - `production`: uses `config/production.toml`
//!
//! ## Configuration Categories
//!
//! - **Database/Redis**: backing store for the screening repository
//! - **Server**: HTTP bind address and request timeout
//! - **Rate limiting**: global dispatcher RPM and per-provider defaults
//! - **Circuit breaker**: failure threshold and open-for duration
//! - **SAR**: confidence thresholds, max iterations, diminishing-returns knobs
//! - **Screening**: per-tier deadlines
//! - **Metrics/CORS**: ambient HTTP surface configuration

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main configuration structure containing all application settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// HTTP server bind address and request timeout
    pub server: ServerConfig,
    /// Database connection and pool configuration (screening repository backing)
    pub database: DatabaseConfig,
    /// Redis caching/session store configuration
    pub redis: RedisConfig,
    /// Rate limiting configuration (global + per-provider)
    pub rate_limit: RateLimitConfig,
    /// Circuit breaker configuration (per-provider)
    pub circuit_breaker: CircuitBreakerConfig,
    /// SAR engine thresholds and iteration policy
    pub sar: SarConfig,
    /// Per-tier screening deadlines
    pub screening: ScreeningConfig,
    /// Application-level settings and feature flags
    pub app: AppConfig,
    /// Prometheus metrics configuration
    pub metrics: MetricsConfig,
    /// Cross-Origin Resource Sharing (CORS) policies
    pub cors: CorsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Default per-request timeout in seconds, applied at the REST boundary.
    pub request_timeout_seconds: u64,
}

/// PostgreSQL database configuration backing the screening repository.
///
/// Persistence itself is out of this crate's scope; these parameters exist
/// so a default repository implementation has somewhere to connect.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration for caching (provider result cache, rate-limit buckets).
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Rate limiting configuration: a global token-bucket RPM for the
/// `PriorityDispatcher` plus per-provider defaults used when a provider has
/// no bucket override configured.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Global dispatcher requests-per-minute ceiling.
    pub global_requests_per_minute: u32,
    /// Default requests-per-minute applied to a provider bucket absent an override.
    pub default_provider_requests_per_minute: u32,
    /// Default burst size for a provider bucket.
    pub default_provider_burst_size: u32,
}

/// Circuit breaker configuration (per-provider; these are defaults, a
/// provider-specific override may exist in a future registry).
#[derive(Debug, Deserialize, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// Duration the breaker stays open before probing half-open, in seconds.
    pub open_for_seconds: u64,
    /// Consecutive successes in half-open required to close the breaker.
    pub half_open_success_threshold: u32,
}

/// SAR engine policy knobs: confidence thresholds, iteration caps, and the
/// diminishing-returns early-stop parameters. Intentionally not hardcoded —
/// `IterationController` reads these instead of baking in constants.
#[derive(Debug, Deserialize, Clone)]
pub struct SarConfig {
    /// Confidence threshold for foundation types (IDENTITY, EMPLOYMENT, EDUCATION).
    pub foundation_confidence_threshold: f64,
    /// Confidence threshold for all other information types.
    pub standard_confidence_threshold: f64,
    /// Max SAR iterations for foundation types.
    pub foundation_max_iterations: u32,
    /// Max SAR iterations for all other information types.
    pub standard_max_iterations: u32,
    /// Diminishing-returns info-gain-rate floor.
    pub diminishing_returns_info_gain_rate: f64,
    /// Diminishing-returns minimum confidence delta between iterations.
    pub diminishing_returns_confidence_delta: f64,
}

/// Per-tier screening deadlines and per-request provider timeout default.
#[derive(Debug, Deserialize, Clone)]
pub struct ScreeningConfig {
    /// Default per-`RoutedRequest` deadline in seconds (provider-specific, overridable).
    pub default_request_deadline_seconds: u64,
    /// Default screening deadline for STANDARD tier, in seconds.
    pub standard_tier_deadline_seconds: u64,
    /// Default screening deadline for ENHANCED tier, in seconds.
    pub enhanced_tier_deadline_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub company_name: String,
    pub base_url: String,
    pub environment: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
    pub namespace: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age: Option<u64>,
    pub allow_credentials: bool,
}

impl Config {
    /// Loads configuration from multiple sources in hierarchical order.
    ///
    /// 1. **Default configuration** (`config/default.toml`) - base values
    /// 2. **Environment-specific configuration** (e.g., `config/production.toml`)
    /// 3. **Environment variables** - runtime overrides (highest precedence)
    ///
    /// The environment is determined by the `ENVIRONMENT` environment
    /// variable, defaulting to `development`.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("").separator("_"));

        let config = builder.build()?;
        let mut loaded_config: Config = config.try_deserialize()?;

        loaded_config.validate(&environment)?;

        Ok(loaded_config)
    }

    /// Validates the loaded configuration and ensures sane cross-field values.
    fn validate(&mut self, environment: &str) -> Result<(), ConfigError> {
        use config::ConfigError;

        if environment == "production" {
            self.validate_production_security()?;
        }

        if !self.database.url.starts_with("postgresql://") {
            return Err(ConfigError::Message(
                "Database URL must be a PostgreSQL connection string starting with 'postgresql://'".to_string(),
            ));
        }

        if !self.redis.url.starts_with("redis://") {
            return Err(ConfigError::Message(
                "Redis URL must be a Redis connection string starting with 'redis://'".to_string(),
            ));
        }

        if self.sar.foundation_confidence_threshold <= 0.0 || self.sar.foundation_confidence_threshold > 1.0 {
            return Err(ConfigError::Message(
                "sar.foundation_confidence_threshold must be in (0, 1]".to_string(),
            ));
        }

        if self.sar.standard_confidence_threshold <= 0.0 || self.sar.standard_confidence_threshold > 1.0 {
            return Err(ConfigError::Message(
                "sar.standard_confidence_threshold must be in (0, 1]".to_string(),
            ));
        }

        if self.screening.enhanced_tier_deadline_seconds <= self.screening.standard_tier_deadline_seconds {
            return Err(ConfigError::Message(
                "screening.enhanced_tier_deadline_seconds must exceed standard_tier_deadline_seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates production-specific security requirements: no placeholder
    /// secrets, no wildcard CORS origins.
    fn validate_production_security(&self) -> Result<(), ConfigError> {
        use config::ConfigError;

        let error_indicators = ["ERROR_", "INSECURE_DEFAULT", "CHANGE_THIS", "NOT_SET", "CHECK_ENVIRONMENT", "PLACEHOLDER"];

        for indicator in &error_indicators {
            if self.database.url.contains(indicator) {
                return Err(ConfigError::Message(format!(
                    "Production deployment detected missing database configuration. Set DATABASE_URL environment variable. Current value contains: {}",
                    indicator
                )));
            }
        }

        for indicator in &error_indicators {
            if self.redis.url.contains(indicator) {
                return Err(ConfigError::Message(format!(
                    "Production deployment detected missing Redis configuration. Set REDIS_URL environment variable. Current value contains: {}",
                    indicator
                )));
            }
        }

        for indicator in &error_indicators {
            if self.app.base_url.contains(indicator) {
                return Err(ConfigError::Message(format!(
                    "Production deployment detected missing base URL. Set BASE_URL environment variable. Current value contains: {}",
                    indicator
                )));
            }
        }

        for origin in &self.cors.allowed_origins {
            for indicator in &error_indicators {
                if origin.contains(indicator) {
                    return Err(ConfigError::Message(format!(
                        "Production deployment detected missing CORS origin. Set FRONTEND_URL environment variable. Current value contains: {}",
                        indicator
                    )));
                }
            }

            if origin == "*" {
                return Err(ConfigError::Message(
                    "Production deployment must not use wildcard (*) CORS origins. Set specific frontend URL via FRONTEND_URL environment variable".to_string(),
                ));
            }
        }

        Ok(())
    }
}
