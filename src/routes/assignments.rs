// ABOUTME: Route handlers for gym owners managing trainer access
// ABOUTME: List, read, approve, decline and remove trainer assignments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::parse_path_id;
use crate::auth::authenticate;
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Trainer assignment routes handler
pub struct AssignmentRoutes;

impl AssignmentRoutes {
    /// Create all assignment routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/gyms/:gym_id/assignments", get(Self::handle_list))
            .route("/api/assignments/:id", get(Self::handle_get))
            .route("/api/assignments/:id/approve", post(Self::handle_approve))
            .route("/api/assignments/:id/decline", post(Self::handle_decline))
            .route("/api/assignments/:id/remove", post(Self::handle_remove))
            .with_state(resources)
    }

    /// Handle GET /api/gyms/:gym_id/assignments - Owner dashboard listing
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(gym_id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let gym_id = parse_path_id(&gym_id, "gym")?;

        let assignments = resources
            .assignments
            .list_for_gym(principal, gym_id)
            .await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "total": assignments.len(), "assignments": assignments })),
        )
            .into_response())
    }

    /// Handle GET /api/assignments/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let assignment_id = parse_path_id(&id, "assignment")?;

        let assignment = resources.assignments.get(principal, assignment_id).await?;
        Ok((StatusCode::OK, Json(assignment)).into_response())
    }

    /// Handle POST /api/assignments/:id/approve
    async fn handle_approve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let assignment_id = parse_path_id(&id, "assignment")?;

        let assignment = resources
            .assignments
            .approve(principal, assignment_id)
            .await?;
        Ok((StatusCode::OK, Json(assignment)).into_response())
    }

    /// Handle POST /api/assignments/:id/decline
    async fn handle_decline(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let assignment_id = parse_path_id(&id, "assignment")?;

        resources
            .assignments
            .decline(principal, assignment_id)
            .await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "id": assignment_id, "declined": true })),
        )
            .into_response())
    }

    /// Handle POST /api/assignments/:id/remove
    async fn handle_remove(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let assignment_id = parse_path_id(&id, "assignment")?;

        let assignment = resources
            .assignments
            .remove(principal, assignment_id)
            .await?;
        Ok((StatusCode::OK, Json(assignment)).into_response())
    }
}
