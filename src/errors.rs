// ABOUTME: Re-exports the error types from gymhub-core for unified type identity
// ABOUTME: AppError, ErrorCode and AppResult are the same types across all workspace crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use gymhub_core::errors::*;
