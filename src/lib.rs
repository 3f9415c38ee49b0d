// ABOUTME: Main library entry point for the GymHub membership server
// ABOUTME: Memberships, trainer assignments, the revenue ledger and admin deletion cascades over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy.
#![deny(unsafe_code)]

//! # GymHub Server
//!
//! The transactional core of a gym marketplace: trainees join gyms and pay
//! monthly fees that are split between the gym owner and the assigned trainer,
//! trainers request access to gyms and owners approve, decline or remove them,
//! and admins delete users or gym listings with every dependent record torn
//! down in the same transaction.
//!
//! ## Architecture
//!
//! - **Database**: `SQLite` persistence with one transaction per operation
//! - **Services**: membership lifecycle, trainer assignments, ledger and cascades
//! - **Routes**: Axum handlers mapping service results to HTTP statuses
//! - **Config**: environment-only configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gymhub_server::config::ServerConfig;
//! use gymhub_server::database::Database;
//! use gymhub_server::errors::AppResult;
//! use gymhub_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::from_config(&config.database).await?;
//!     let resources = ServerResources::new(database, Arc::new(config));
//!     let _router = gymhub_server::routes::router(Arc::new(resources));
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the server binary and integration tests (tests/).

/// Principal extraction from identity proxy headers
pub mod auth;
/// Environment configuration
pub mod config;
/// Domain constants re-exported from the core crate
pub mod constants;
/// `SQLite` persistence and transactions
pub mod database;
/// Unified error handling re-exported from the core crate
pub mod errors;
/// Structured logging setup and domain event loggers
pub mod logging;
/// HTTP middleware for request ids, tracing and CORS
pub mod middleware;
/// Domain models re-exported from the core crate
pub mod models;
/// Revenue split and refund policies
pub mod policy;
/// Shared state handed to every route
pub mod resources;
/// HTTP routes
pub mod routes;
/// Transactional domain services
pub mod services;
