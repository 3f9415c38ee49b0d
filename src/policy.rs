// ABOUTME: Re-exports revenue split and refund policies from gymhub-core
// ABOUTME: Keeps policy types identical between the services and the core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use gymhub_core::policy::*;
