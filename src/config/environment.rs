// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses HTTP, database and membership policy settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::database::{DatabaseConfig, DatabaseUrl};
use crate::constants::database::{DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};
use crate::constants::membership::{DEFAULT_PERIOD_MONTHS, TRAINER_ACCESS_PERIOD_MONTHS};
use crate::constants::ports::DEFAULT_HTTP_PORT;
use crate::constants::revenue::{DEFAULT_CURRENCY, DEFAULT_TRAINER_SHARE_BPS};
use crate::errors::{AppError, AppResult};
use crate::policy::{RefundPolicy, SplitPolicy};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Membership and revenue policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Platform-wide trainer share of membership fees
    pub split: SplitPolicy,
    /// Billing behavior on cancellation
    pub refund_policy: RefundPolicy,
    /// Months covered by an ordinary plan payment
    pub membership_period_months: u32,
    /// Months covered by a trainer-access membership
    pub trainer_access_period_months: u32,
    /// Currency used when a gym has none configured
    pub default_currency: String,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            split: SplitPolicy::default(),
            refund_policy: RefundPolicy::default(),
            membership_period_months: DEFAULT_PERIOD_MONTHS,
            trainer_access_period_months: TRAINER_ACCESS_PERIOD_MONTHS,
            default_currency: DEFAULT_CURRENCY.to_owned(),
        }
    }
}

/// Cross-origin settings for browser clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*` for any
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Membership and revenue policy
    pub membership: MembershipConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            environment: Environment::default(),
            database: DatabaseConfig::default(),
            membership: MembershipConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if any variable is present but invalid
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns a config error if any value is present but invalid
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let trainer_share_bps: u32 = parse_var(
            "TRAINER_SHARE_BPS",
            &var_or("TRAINER_SHARE_BPS", &DEFAULT_TRAINER_SHARE_BPS.to_string()),
        )?;
        let split = SplitPolicy::new(trainer_share_bps)
            .map_err(|e| AppError::config(format!("Invalid TRAINER_SHARE_BPS: {}", e.message)))?;

        let membership = MembershipConfig {
            split,
            refund_policy: parse_var("REFUND_POLICY", &var_or("REFUND_POLICY", "full"))?,
            membership_period_months: positive_months(
                "MEMBERSHIP_PERIOD_MONTHS",
                &var_or(
                    "MEMBERSHIP_PERIOD_MONTHS",
                    &DEFAULT_PERIOD_MONTHS.to_string(),
                ),
            )?,
            trainer_access_period_months: positive_months(
                "TRAINER_ACCESS_PERIOD_MONTHS",
                &var_or(
                    "TRAINER_ACCESS_PERIOD_MONTHS",
                    &TRAINER_ACCESS_PERIOD_MONTHS.to_string(),
                ),
            )?,
            default_currency: var_or("DEFAULT_CURRENCY", DEFAULT_CURRENCY).to_uppercase(),
        };

        let database = DatabaseConfig {
            url: DatabaseUrl::parse_url(&var_or("DATABASE_URL", DEFAULT_DATABASE_URL))?,
            max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                &var_or(
                    "DATABASE_MAX_CONNECTIONS",
                    &DEFAULT_MAX_CONNECTIONS.to_string(),
                ),
            )?,
        };

        Ok(Self {
            http_port: parse_var(
                "HTTP_PORT",
                &var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string()),
            )?,
            environment: Environment::from_str_or_default(&var_or("ENVIRONMENT", "development")),
            database,
            membership,
            cors: CorsConfig {
                allowed_origins: var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        })
    }

    /// One-line, secret-free description for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "GymHub Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {} (max connections: {})\n\
             - Trainer Share: {} bps\n\
             - Refund Policy: {}\n\
             - Membership Period: {} month(s)\n\
             - Trainer Access Period: {} month(s)\n\
             - Default Currency: {}",
            self.http_port,
            self.environment,
            self.database.url,
            self.database.effective_max_connections(),
            self.membership.split.trainer_share_bps(),
            self.membership.refund_policy,
            self.membership.membership_period_months,
            self.membership.trainer_access_period_months,
            self.membership.default_currency,
        )
    }
}

fn parse_var<T>(key: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}")))
}

fn positive_months(key: &str, raw: &str) -> AppResult<u32> {
    let months: u32 = parse_var(key, raw)?;
    if months == 0 {
        return Err(AppError::config(format!("{key} must be at least 1")));
    }
    Ok(months)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.http_port, 8081);
        assert_eq!(config.membership.split.trainer_share_bps(), 5000);
        assert_eq!(config.membership.refund_policy, RefundPolicy::Full);
        assert_eq!(config.membership.membership_period_months, 1);
        assert_eq!(config.membership.trainer_access_period_months, 6);
        assert_eq!(config.membership.default_currency, "INR");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HTTP_PORT", "9000"),
            ("TRAINER_SHARE_BPS", "6000"),
            ("REFUND_POLICY", "none"),
            ("DEFAULT_CURRENCY", "usd"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.membership.split.trainer_share_bps(), 6000);
        assert_eq!(config.membership.refund_policy, RefundPolicy::None);
        assert_eq!(config.membership.default_currency, "USD");
        assert!(config.database.url.is_memory());
        assert!(config.environment.is_production());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for pairs in [
            [("TRAINER_SHARE_BPS", "10001")],
            [("HTTP_PORT", "eighty")],
            [("REFUND_POLICY", "partial")],
            [("MEMBERSHIP_PERIOD_MONTHS", "0")],
        ] {
            let err = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert_eq!(err.http_status(), 500, "{pairs:?}");
        }
    }

    #[test]
    fn test_summary_mentions_policy() {
        let summary = ServerConfig::default().summary();
        assert!(summary.contains("Trainer Share: 5000 bps"));
        assert!(summary.contains("Refund Policy: full"));
    }
}
