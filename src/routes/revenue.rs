// ABOUTME: Ledger read routes
// ABOUTME: The caller's own balance and events, and a gym's tagged events for its owner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::parse_path_id;
use crate::auth::authenticate;
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Revenue routes handler
pub struct RevenueRoutes;

impl RevenueRoutes {
    /// Create all revenue routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/revenue", get(Self::handle_summary))
            .route("/api/gyms/:gym_id/revenue", get(Self::handle_gym_events))
            .with_state(resources)
    }

    /// Handle GET /api/revenue - Caller's ledger and balance
    async fn handle_summary(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let summary = resources.ledger.summary_for(principal).await?;
        Ok((StatusCode::OK, Json(summary)).into_response())
    }

    /// Handle GET /api/gyms/:gym_id/revenue - Events tagged with a gym
    async fn handle_gym_events(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(gym_id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = authenticate(&headers)?;
        let gym_id = parse_path_id(&gym_id, "gym")?;

        let events = resources.ledger.events_for_gym(principal, gym_id).await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "gym_id": gym_id, "events": events })),
        )
            .into_response())
    }
}
