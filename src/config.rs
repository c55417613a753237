//! Token issuer configuration.
//!
//! Built once at process start and passed explicitly to whatever needs it;
//! nothing in this crate reads the environment after startup. A missing or
//! empty signing secret is a construction error, never a silent default.

use secrecy::SecretString;
use tracing::warn;

use crate::error::Error;

pub const ENV_TOKEN_SECRET: &str = "WARDEN_TOKEN_SECRET";
pub const ENV_TOKEN_ISSUER: &str = "WARDEN_TOKEN_ISSUER";
pub const ENV_TOKEN_AUDIENCE: &str = "WARDEN_TOKEN_AUDIENCE";
pub const ENV_TOKEN_TTL_HOURS: &str = "WARDEN_TOKEN_TTL_HOURS";

/// Fallback lifetime when `WARDEN_TOKEN_TTL_HOURS` is absent or unparsable.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

const DEFAULT_ISSUER: &str = "warden";
const DEFAULT_AUDIENCE: &str = "warden-api";

#[derive(Debug, Clone)]
pub struct TokenConfig {
    issuer: String,
    audience: String,
    ttl_hours: i64,
    secret: SecretString,
}

impl TokenConfig {
    /// Create a configuration with the default issuer, audience, and lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] when `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, Error> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::MissingSecret);
        }
        Ok(Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            secret: SecretString::from(secret),
        })
    }

    /// Load the configuration from the process environment.
    ///
    /// `WARDEN_TOKEN_SECRET` is required; issuer, audience, and lifetime fall
    /// back to their defaults. An unparsable lifetime is logged and replaced
    /// by [`DEFAULT_TOKEN_TTL_HOURS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] when the secret is absent or empty.
    pub fn from_env() -> Result<Self, Error> {
        let secret = std::env::var(ENV_TOKEN_SECRET).unwrap_or_default();
        let mut config = Self::new(secret)?;

        if let Ok(issuer) = std::env::var(ENV_TOKEN_ISSUER) {
            if !issuer.is_empty() {
                config.issuer = issuer;
            }
        }
        if let Ok(audience) = std::env::var(ENV_TOKEN_AUDIENCE) {
            if !audience.is_empty() {
                config.audience = audience;
            }
        }
        if let Ok(ttl) = std::env::var(ENV_TOKEN_TTL_HOURS) {
            match ttl.parse::<i64>() {
                Ok(hours) if hours > 0 => config.ttl_hours = hours,
                _ => {
                    warn!(
                        value = %ttl,
                        default = DEFAULT_TOKEN_TTL_HOURS,
                        "unparsable token lifetime, using default"
                    );
                }
            }
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_ttl_hours(mut self, hours: i64) -> Self {
        self.ttl_hours = hours;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.secret
    }
}
