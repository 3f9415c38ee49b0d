// ABOUTME: Principal extraction from identity headers set by the upstream auth proxy
// ABOUTME: Missing or malformed identity headers are rejected with 401
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Token validation happens in front of this service. The proxy forwards the
//! verified identity as `x-user-id` and `x-user-role`; this module only turns
//! those headers into a [`Principal`]. Ownership is never taken from headers,
//! services re-check it against stored gyms and assignments.

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::constants::headers::{USER_ID, USER_ROLE};
use crate::errors::{AppError, AppResult};
use crate::models::{Principal, UserRole};

/// Build the calling principal from request headers
///
/// # Errors
///
/// Returns `AuthRequired` when either header is missing and `AuthInvalid` when a
/// value cannot be parsed
pub fn authenticate(headers: &HeaderMap) -> AppResult<Principal> {
    let id = header_value(headers, USER_ID)?;
    let role = header_value(headers, USER_ROLE)?;

    let id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::auth_invalid(format!("Malformed {USER_ID} header")))?;
    let role: UserRole = role
        .trim()
        .parse()
        .map_err(|_| AppError::auth_invalid(format!("Unknown role in {USER_ROLE} header")))?;

    Ok(Principal::new(id, role))
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> AppResult<&'h str> {
    let value = headers.get(name).ok_or_else(AppError::auth_required)?;
    value
        .to_str()
        .map_err(|_| AppError::auth_invalid(format!("Non-ASCII {name} header")))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(id: &str, role: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID, HeaderValue::from_str(id).unwrap());
        headers.insert(USER_ROLE, HeaderValue::from_str(role).unwrap());
        headers
    }

    #[test]
    fn test_valid_headers() {
        let id = Uuid::new_v4();
        let principal = authenticate(&headers(&id.to_string(), "gym_owner")).unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.role, UserRole::GymOwner);
    }

    #[test]
    fn test_missing_headers_are_401() {
        let err = authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn test_malformed_id_is_401() {
        let err = authenticate(&headers("not-a-uuid", "trainee")).unwrap_err();
        assert_eq!(err.http_status(), 401);

        let err = authenticate(&headers(&Uuid::new_v4().to_string(), "wizard")).unwrap_err();
        assert_eq!(err.http_status(), 401);
    }
}
