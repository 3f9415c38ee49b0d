// ABOUTME: Transaction management with RAII guards and retry patterns for database operations
// ABOUTME: Provides automatic rollback on drop and exponential backoff for transient SQLite contention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction management with RAII guards and retry patterns
//!
//! Every membership, assignment and cascade operation runs as one unit of work:
//!
//! ```text
//! retry_transaction(|| async move {
//!     let mut guard = database.begin().await?;
//!     memberships::insert(guard.executor()?, &membership).await?;
//!     revenue::insert(guard.executor()?, &event).await?;
//!     guard.commit().await
//! }, TRANSACTION_MAX_RETRIES).await?;
//! ```
//!
//! If any step returns early the guard is dropped and `SQLx` rolls the
//! transaction back, so a failed join leaves neither a membership nor a ledger row.

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult, ErrorCode};

/// Retry a unit of work if it fails due to transient store contention
///
/// Only `DatabaseError` failures whose message indicates locking, busy or timeout
/// conditions are retried. Domain errors (validation, authorization, conflicts)
/// are returned immediately, so a conflicting join surfaces its 409 on the first
/// attempt.
///
/// # Errors
///
/// Returns the last error if the operation failed after `max_retries` attempts,
/// or the first non-retryable error
///
/// # Exponential Backoff
/// - Attempt 1: 20ms
/// - Attempt 2: 40ms
/// - Attempt 3: 80ms
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if !is_retryable_error(&e) {
                    if e.code.is_client_error() {
                        debug!(code = ?e.code, "Unit of work rejected");
                    } else {
                        error!(attempts, error = %e, "Transaction failed with non-retryable error");
                    }
                    return Err(e);
                }
                if attempts >= max_retries {
                    error!(
                        attempts,
                        max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                let backoff_ms = 10 * (1_u64 << attempts);
                warn!(
                    attempt = attempts,
                    max_retries,
                    backoff_ms,
                    error = %e,
                    "Transaction failed with retryable error, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// Check if an error is transient store contention
fn is_retryable_error(error: &AppError) -> bool {
    if error.code != ErrorCode::DatabaseError {
        return false;
    }
    let message = error.message.to_lowercase();

    if message.contains("unique constraint")
        || message.contains("foreign key constraint")
        || message.contains("check constraint")
        || message.contains("not null constraint")
    {
        return false;
    }

    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("busy")
        || message.contains("timed out")
        || message.contains("timeout")
}

/// Open `SQLite` transaction that rolls back unless committed
///
/// Dropping the guard without `commit()` rolls the transaction back; `commit`
/// consumes the guard so it cannot be committed twice.
pub struct TransactionGuard {
    transaction: Option<Transaction<'static, Sqlite>>,
}

impl TransactionGuard {
    /// Wrap a freshly started pool transaction
    #[must_use]
    pub fn new(transaction: Transaction<'static, Sqlite>) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }

    /// Commit and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already committed"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Transaction commit failed: {e}")))?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Connection to run the unit of work's statements on
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already committed
    pub fn executor(&mut self) -> AppResult<&mut SqliteConnection> {
        self.transaction
            .as_deref_mut()
            .ok_or_else(|| AppError::internal("Transaction used after commit"))
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            debug!("Unit of work abandoned, rolling back");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_retries_locked_database_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_transaction(
            || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::database("database is locked"))
                } else {
                    Ok(7)
                }
            },
            3,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_domain_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_transaction(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::conflict("database is busy with an open membership"))
            },
            3,
        )
        .await;

        assert_eq!(result.unwrap_err().code, ErrorCode::ResourceConflict);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_transaction(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::database("database is locked"))
            },
            3,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
