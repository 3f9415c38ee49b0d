// ABOUTME: Re-exports the domain constants from gymhub-core
// ABOUTME: Membership windows, revenue share defaults, header names, ports and database defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use gymhub_core::constants::*;
