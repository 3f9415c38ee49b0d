// ABOUTME: Health check route handler for service monitoring
// ABOUTME: Liveness endpoint used by load balancers and the test harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{routing::get, Json, Router};
use chrono::Utc;

use crate::constants::endpoints::HEALTH_CHECK;
use crate::logging::SERVICE_NAME;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes() -> Router {
        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "service": SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": Utc::now().to_rfc3339()
            }))
        }

        Router::new().route(HEALTH_CHECK, get(health_handler))
    }
}
