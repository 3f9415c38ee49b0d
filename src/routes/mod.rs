// ABOUTME: Route module organization for the GymHub HTTP API
// ABOUTME: Thin axum handlers grouped by domain, merged into one router with shared middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the GymHub server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that authenticate the caller and delegate to a service.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::middleware::{request_id_layers, setup_cors, trace_layer};
use crate::resources::ServerResources;

/// Admin deletion and reconciliation routes
pub mod admin;
/// Trainer assignment routes for gym owners
pub mod assignments;
/// Liveness route
pub mod health;
/// Membership lifecycle routes
pub mod memberships;
/// Ledger read routes
pub mod revenue;

pub use admin::AdminRoutes;
pub use assignments::AssignmentRoutes;
pub use health::HealthRoutes;
pub use memberships::MembershipRoutes;
pub use revenue::RevenueRoutes;

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();
    let cors = setup_cors(&resources.config.cors);

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(MembershipRoutes::routes(resources.clone()))
        .merge(AssignmentRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources.clone()))
        .merge(RevenueRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id)
                .layer(trace_layer())
                .layer(propagate_request_id)
                .layer(cors),
        )
}

/// Parse a UUID path segment, reporting the segment name on failure
pub(crate) fn parse_path_id(raw: &str, name: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_input(format!("Invalid {name} id: {raw}")))
}
