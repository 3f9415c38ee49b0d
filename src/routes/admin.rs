// ABOUTME: Admin route handlers for deletion cascades and counter repair
// ABOUTME: Delete users and gym listings, reconcile gym analytics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};

use super::parse_path_id;
use crate::auth::authenticate;
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Admin routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/users/:id", delete(Self::handle_delete_user))
            .route("/api/admin/gyms/:id", delete(Self::handle_delete_gym))
            .route(
                "/api/admin/gyms/:id/reconcile",
                post(Self::handle_reconcile_gym),
            )
            .with_state(resources)
    }

    /// Handle DELETE /api/admin/users/:id - Delete a user and cascade
    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let user_id = parse_path_id(&id, "user")?;

        let report = resources.cascade.delete_user(principal, user_id).await?;
        Ok((StatusCode::OK, Json(report)).into_response())
    }

    /// Handle DELETE /api/admin/gyms/:id - Delete a gym listing and cascade
    async fn handle_delete_gym(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let gym_id = parse_path_id(&id, "gym")?;

        let report = resources
            .cascade
            .delete_gym_listing(principal, gym_id)
            .await?;
        Ok((StatusCode::OK, Json(report)).into_response())
    }

    /// Handle POST /api/admin/gyms/:id/reconcile - Recompute gym counters
    async fn handle_reconcile_gym(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let gym_id = parse_path_id(&id, "gym")?;

        let analytics = resources.cascade.reconcile_gym(principal, gym_id).await?;
        Ok((StatusCode::OK, Json(analytics)).into_response())
    }
}
