//! API server configuration

use std::env;
use std::str::FromStr;

use anyhow::{bail, Result};
use parley_shared_config::{parse_env, CommonConfig, Environment};

/// Minimum required length for JWT_SECRET to be considered secure
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Development-only fallback signing secret
const DEV_JWT_SECRET: &str = "parley-development-secret-change-me-before-deploy";

/// A `(period, limit)` pair for one rate limiter instance
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    /// Maximum requests per window
    pub limit: u32,
    /// Window size in seconds
    pub period_secs: u64,
}

impl RateLimitSettings {
    fn from_env(prefix: &str, default_limit: u32, default_period_secs: u64) -> Result<Self> {
        Ok(Self {
            limit: parse_env(&format!("{prefix}_RATE_LIMIT"), default_limit)?,
            period_secs: parse_env(&format!("{prefix}_RATE_PERIOD_SECS"), default_period_secs)?,
        })
    }
}

/// Account lockout policy settings
#[derive(Debug, Clone, Copy)]
pub struct LockoutSettings {
    /// Consecutive failures that trigger a lock
    pub threshold: u32,
    /// Lock duration in seconds
    pub duration_secs: u64,
}

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// JWT signing secret shared with the token issuer
    pub jwt_secret: String,

    /// General write ceiling per client address
    pub write_limit: RateLimitSettings,

    /// Reply creation ceiling per client address
    pub reply_limit: RateLimitSettings,

    /// Short-burst reply ceiling to smooth spikes
    pub reply_burst_limit: RateLimitSettings,

    /// Login/registration ceiling per client address
    pub auth_limit: RateLimitSettings,

    /// Account lockout policy
    pub lockout: LockoutSettings,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode `JWT_SECRET` must be set and at least 32
    /// characters long; in development a (logged) insecure default is
    /// used for convenience.
    pub fn from_env() -> Result<Self> {
        // Determine environment first to know if we need strict validation
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();

        let jwt_secret = Self::load_jwt_secret(environment.is_production())?;

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,
            port: parse_env("PORT", 8080)?,
            jwt_secret,
            write_limit: RateLimitSettings::from_env("WRITE", 30, 60)?,
            reply_limit: RateLimitSettings::from_env("REPLY", 10, 60)?,
            reply_burst_limit: RateLimitSettings::from_env("REPLY_BURST", 3, 10)?,
            auth_limit: RateLimitSettings::from_env("AUTH", 10, 60)?,
            lockout: LockoutSettings {
                threshold: parse_env("LOCKOUT_THRESHOLD", 5)?,
                duration_secs: parse_env("LOCKOUT_DURATION_SECS", 15 * 60)?,
            },
        })
    }

    fn load_jwt_secret(is_production: bool) -> Result<String> {
        match env::var("JWT_SECRET") {
            Ok(secret) => {
                if secret.len() < MIN_JWT_SECRET_LENGTH {
                    if is_production {
                        bail!(
                            "JWT_SECRET must be at least {} characters in production",
                            MIN_JWT_SECRET_LENGTH
                        );
                    }
                    tracing::warn!(
                        "JWT_SECRET is shorter than {} characters; acceptable only outside production",
                        MIN_JWT_SECRET_LENGTH
                    );
                }
                Ok(secret)
            }
            Err(_) if is_production => {
                bail!("JWT_SECRET must be set in production")
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, using insecure development default");
                Ok(DEV_JWT_SECRET.to_string())
            }
        }
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}
