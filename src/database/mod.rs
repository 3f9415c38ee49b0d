// ABOUTME: SQLite persistence for users, gyms, memberships, trainer assignments and the revenue ledger
// ABOUTME: Owns the connection pool, schema migrations and shared row-decoding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! `Database` wraps a `SqlitePool`. Each entity module exposes connection-level
//! functions taking `&mut SqliteConnection`, so the services can run a whole
//! operation on the connection owned by one [`TransactionGuard`]. The
//! `Database` read helpers acquire a pooled connection and delegate to the same
//! functions.
//!
//! Never touch the pool while a transaction guard is alive: an in-memory
//! database has exactly one connection.

/// Trainer assignments and roster entries
pub mod assignments;
/// Gym directory rows, analytics counters and trainer rosters
pub mod gyms;
/// Gym listing plan subscriptions
pub mod listings;
/// Memberships and the non-terminal uniqueness index
pub mod memberships;
/// Marketplace orders
pub mod orders;
/// Trainer progress records
pub mod progress;
/// Append-only revenue ledger
pub mod revenue;
/// RAII transaction guard and retry helper
pub mod transactions;
/// Users and their aggregate metrics
pub mod users;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

pub use transactions::{retry_transaction, TransactionGuard};

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::constants::database::BUSY_TIMEOUT_MS;
use crate::errors::{AppError, AppResult};

/// Database manager for the membership core
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for `database_url` and run migrations
    ///
    /// In-memory databases always get a single, never-recycled connection so
    /// every query sees the same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the database cannot be opened, or a
    /// migration fails
    pub async fn new(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let config = DatabaseConfig {
            url: DatabaseUrl::parse_url(database_url)?,
            max_connections,
        };
        Self::from_config(&config).await
    }

    /// Open a pool from a parsed configuration and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or a migration fails
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        if let DatabaseUrl::SQLite { path } = &config.url {
            ensure_parent_dir(path).await?;
        }

        let connect_options = SqliteConnectOptions::from_str(&config.url.to_connection_string())
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

        let connect_options = if config.url.is_memory() {
            connect_options
        } else {
            connect_options.journal_mode(SqliteJournalMode::Wal)
        };

        let mut pool_options =
            SqlitePoolOptions::new().max_connections(config.effective_max_connections());
        if config.url.is_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(database = %config.url, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction wrapped in a rollback-on-drop guard
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be acquired
    pub async fn begin(&self) -> AppResult<TransactionGuard> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        Ok(TransactionGuard::new(tx))
    }

    /// Acquire a pooled connection for reads outside a transaction
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be acquired
    pub async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index cannot be created
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_gyms().await?;
        self.migrate_memberships().await?;
        self.migrate_assignments().await?;
        self.migrate_revenue().await?;
        self.migrate_listings().await?;
        self.migrate_orders().await?;
        self.migrate_progress().await?;
        Ok(())
    }

    /// Run one schema statement
    async fn execute_schema(&self, statement: &str) -> AppResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

async fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::config(format!("Cannot create database directory: {e}"))),
        _ => Ok(()),
    }
}

/// Map a `SQLx` error, turning unique violations into conflicts
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict(format!("{context}: a conflicting record already exists"))
        }
        _ => AppError::database(format!("{context}: {e}")),
    }
}

pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Invalid UUID: {e}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>) -> AppResult<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid date: {e}")))
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

pub(crate) fn parse_enum<T>(value: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    value
        .parse()
        .map_err(|e: AppError| AppError::database(e.message))
}

pub(crate) fn parse_string_list(value: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| AppError::database(format!("Invalid JSON list: {e}")))
}
