// ABOUTME: Route handlers for membership join, cancel, pause and resume
// ABOUTME: Maps join outcomes to 201 (active) and 202 (trainer access pending)
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

use super::parse_path_id;
use crate::auth::authenticate;
use crate::errors::AppError;
use crate::models::JoinRequest;
use crate::resources::ServerResources;
use crate::services::JoinOutcome;

/// Membership routes handler
pub struct MembershipRoutes;

impl MembershipRoutes {
    /// Create all membership routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/gyms/:gym_id/memberships", post(Self::handle_join))
            .route("/api/memberships/:id", get(Self::handle_get))
            .route("/api/memberships/:id/cancel", post(Self::handle_cancel))
            .route("/api/memberships/:id/pause", post(Self::handle_pause))
            .route("/api/memberships/:id/resume", post(Self::handle_resume))
            .with_state(resources)
    }

    /// Handle POST /api/gyms/:gym_id/memberships - Join a gym or request trainer access
    async fn handle_join(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(gym_id): Path<String>,
        Json(request): Json<JoinRequest>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let gym_id = parse_path_id(&gym_id, "gym")?;

        let outcome = resources
            .memberships
            .join_gym(principal, gym_id, request)
            .await?;

        let status = match outcome {
            JoinOutcome::Activated { .. } => StatusCode::CREATED,
            JoinOutcome::AccessRequested { .. } => StatusCode::ACCEPTED,
        };
        Ok((status, Json(outcome)).into_response())
    }

    /// Handle GET /api/memberships/:id - Read one membership
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let membership_id = parse_path_id(&id, "membership")?;

        let membership = resources
            .memberships
            .get_membership(principal, membership_id)
            .await?;
        Ok((StatusCode::OK, Json(membership)).into_response())
    }

    /// Handle POST /api/memberships/:id/cancel - Leave a gym
    async fn handle_cancel(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let membership_id = parse_path_id(&id, "membership")?;

        let outcome = resources
            .memberships
            .leave_gym(principal, membership_id)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle POST /api/memberships/:id/pause
    async fn handle_pause(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let membership_id = parse_path_id(&id, "membership")?;

        let membership = resources
            .memberships
            .pause_membership(principal, membership_id)
            .await?;
        Ok((StatusCode::OK, Json(membership)).into_response())
    }

    /// Handle POST /api/memberships/:id/resume
    async fn handle_resume(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let membership_id = parse_path_id(&id, "membership")?;

        let membership = resources
            .memberships
            .resume_membership(principal, membership_id)
            .await?;
        Ok((StatusCode::OK, Json(membership)).into_response())
    }
}
