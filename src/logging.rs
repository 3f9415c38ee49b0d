// ABOUTME: Logging configuration and structured logging setup for the membership server
// ABOUTME: Configures log levels, formatters, and domain event loggers built on tracing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Tracing subscriber setup and the structured event loggers used by the
//! membership, assignment, ledger and cascade services.
//!
//! `LOG_FORMAT` picks `json`, `compact` or `pretty` output. `RUST_LOG` overrides
//! the default `info` filter. Production deployments also record source
//! locations.

use std::env;
use std::io;

use anyhow::Result;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Service name reported in structured logs
pub const SERVICE_NAME: &str = "gymhub-server";

/// Dependencies kept at a quieter level than the service itself
const QUIET_TARGETS: [&str; 3] = ["hyper=warn", "sqlx=warn", "tower_http=info"];

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line human readable output
    #[default]
    Pretty,
    /// Single-line output without targets
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, defaulting to pretty
    #[must_use]
    pub fn from_str_or_default(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Subscriber settings resolved from the environment
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive applied to this crate when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Record file and line of each event
    pub with_location: bool,
    /// Deployment environment reported at startup
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG`, `LOG_FORMAT`, `LOG_LOCATION` and `ENVIRONMENT`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_owned());
        let production = matches!(environment.as_str(), "production" | "prod");
        Self {
            level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_owned()),
            format: LogFormat::from_str_or_default(lookup("LOG_FORMAT").as_deref()),
            with_location: production || lookup("LOG_LOCATION").is_some(),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        QUIET_TARGETS
            .iter()
            .filter_map(|directive| directive.parse().ok())
            .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
            .add_directive(
                format!("gymhub_server={}", self.level)
                    .parse()
                    .unwrap_or_else(|_| Level::INFO.into()),
            )
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.with_location)
            .with_line_number(self.with_location);

        match self.format {
            LogFormat::Json => registry.with(layer.json()).try_init()?,
            LogFormat::Pretty => registry.with(layer).try_init()?,
            LogFormat::Compact => registry.with(layer.compact().with_target(false)).try_init()?,
        }

        info!(
            service = SERVICE_NAME,
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install the global subscriber from environment variables
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Domain event loggers shared by the services
pub struct AppLogger;

impl AppLogger {
    /// Log a membership status change
    pub fn log_membership_transition(
        membership_id: Uuid,
        gym_id: Uuid,
        from: &str,
        to: &str,
        actor: Uuid,
    ) {
        info!(
            membership.id = %membership_id,
            gym.id = %gym_id,
            membership.from = %from,
            membership.to = %to,
            actor.id = %actor,
            "Membership transition"
        );
    }

    /// Log a trainer assignment status change
    pub fn log_assignment_transition(
        assignment_id: Uuid,
        gym_id: Uuid,
        trainer_id: Uuid,
        from: &str,
        to: &str,
    ) {
        info!(
            assignment.id = %assignment_id,
            gym.id = %gym_id,
            trainer.id = %trainer_id,
            assignment.from = %from,
            assignment.to = %to,
            "Trainer assignment transition"
        );
    }

    /// Log a recorded ledger event
    pub fn log_revenue_recorded(event_id: Uuid, payee: Option<Uuid>, amount: i64, kind: &str) {
        info!(
            revenue.id = %event_id,
            revenue.payee = ?payee,
            revenue.amount = amount,
            revenue.kind = %kind,
            "Revenue event recorded"
        );
    }

    /// Log a rejected authorization check
    pub fn log_authorization_denied(actor: Uuid, action: &str, resource: &str) {
        warn!(
            actor.id = %actor,
            auth.action = %action,
            auth.resource = %resource,
            "Authorization denied"
        );
    }

    /// Log one step of a deletion cascade
    pub fn log_cascade_step(root: &str, root_id: Uuid, step: &str, affected: u64) {
        info!(
            cascade.root = %root,
            cascade.root_id = %root_id,
            cascade.step = %step,
            cascade.affected = affected,
            "Cascade step"
        );
    }
}
