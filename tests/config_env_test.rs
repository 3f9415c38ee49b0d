// ABOUTME: Tests for loading server configuration from process environment variables
// ABOUTME: Serialized because they mutate the shared process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::env;

use gymhub_server::config::ServerConfig;
use gymhub_server::errors::ErrorCode;
use gymhub_server::policy::RefundPolicy;
use serial_test::serial;

const VARS: [&str; 6] = [
    "HTTP_PORT",
    "DATABASE_URL",
    "TRAINER_SHARE_BPS",
    "REFUND_POLICY",
    "TRAINER_ACCESS_PERIOD_MONTHS",
    "CORS_ALLOWED_ORIGINS",
];

fn clear_vars() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_reads_overrides() {
    clear_vars();
    env::set_var("HTTP_PORT", "9191");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("TRAINER_SHARE_BPS", "7000");
    env::set_var("REFUND_POLICY", "none");
    env::set_var("TRAINER_ACCESS_PERIOD_MONTHS", "12");
    env::set_var("CORS_ALLOWED_ORIGINS", "https://gymhub.example");

    let config = ServerConfig::from_env().unwrap();
    clear_vars();

    assert_eq!(config.http_port, 9191);
    assert!(config.database.url.is_memory());
    assert_eq!(config.membership.split.trainer_share_bps(), 7000);
    assert_eq!(config.membership.refund_policy, RefundPolicy::None);
    assert_eq!(config.membership.trainer_access_period_months, 12);
    assert_eq!(config.cors.allowed_origins, "https://gymhub.example");
}

#[test]
#[serial]
fn test_from_env_rejects_out_of_range_share() {
    clear_vars();
    env::set_var("TRAINER_SHARE_BPS", "12000");

    let err = ServerConfig::from_env().unwrap_err();
    clear_vars();

    assert_eq!(err.code, ErrorCode::ConfigError);
}

#[test]
#[serial]
fn test_from_env_without_overrides_uses_defaults() {
    clear_vars();

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.membership.split.trainer_share_bps(), 5000);
    assert_eq!(config.membership.refund_policy, RefundPolicy::Full);
    assert_eq!(config.cors.allowed_origins, "*");
}
