// ABOUTME: HTTP middleware layers applied to the whole router
// ABOUTME: CORS, request ids and request tracing built on tower-http
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Cross-origin resource sharing configuration
pub mod cors;
/// Request id propagation and per-request tracing spans
pub mod tracing;

pub use cors::setup_cors;
pub use tracing::{request_id_layers, trace_layer};
