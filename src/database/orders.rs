// ABOUTME: Marketplace order storage used by the user deletion cascade
// ABOUTME: Cancels a user's outstanding orders whether they bought or sold
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::{db_error, parse_enum, parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{MarketplaceOrder, OrderStatus};

impl Database {
    pub(super) async fn migrate_orders(&self) -> AppResult<()> {
        self.execute_schema(
            r"
            CREATE TABLE IF NOT EXISTS marketplace_orders (
                id TEXT PRIMARY KEY,
                buyer_id TEXT NOT NULL,
                seller_id TEXT NOT NULL,
                total INTEGER NOT NULL CHECK (total >= 0),
                status TEXT NOT NULL
                    CHECK (status IN ('pending', 'paid', 'shipped', 'delivered', 'cancelled')),
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_marketplace_orders_buyer ON marketplace_orders(buyer_id)",
        )
        .await?;
        self.execute_schema(
            "CREATE INDEX IF NOT EXISTS idx_marketplace_orders_seller ON marketplace_orders(seller_id)",
        )
        .await
    }

    /// Store an order
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_order(&self, order: &MarketplaceOrder) -> AppResult<Uuid> {
        let mut conn = self.acquire().await?;
        sqlx::query(
            r"
            INSERT INTO marketplace_orders (id, buyer_id, seller_id, total, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order.id.to_string())
        .bind(order.buyer_id.to_string())
        .bind(order.seller_id.to_string())
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to create order"))?;

        Ok(order.id)
    }

    /// Get an order by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<Option<MarketplaceOrder>> {
        let mut conn = self.acquire().await?;
        let row = sqlx::query(
            r"
            SELECT id, buyer_id, seller_id, total, status, created_at
            FROM marketplace_orders WHERE id = $1
            ",
        )
        .bind(order_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to get order"))?;

        row.as_ref().map(row_to_order).transpose()
    }
}

/// Cancel outstanding orders where the user is buyer or seller
///
/// # Errors
///
/// Returns an error if the update fails
pub async fn cancel_outstanding_for_user(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> AppResult<u64> {
    let outstanding: Vec<&str> = OrderStatus::ALL
        .iter()
        .filter(|status| status.is_outstanding())
        .map(OrderStatus::as_str)
        .collect();
    let placeholders = (0..outstanding.len())
        .map(|i| format!("${}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let statement = format!(
        "UPDATE marketplace_orders SET status = 'cancelled' \
         WHERE (buyer_id = $1 OR seller_id = $1) AND status IN ({placeholders})"
    );

    let mut query = sqlx::query(&statement).bind(user_id.to_string());
    for status in outstanding {
        query = query.bind(status);
    }
    let result = query
        .execute(conn)
        .await
        .map_err(db_error("Failed to cancel outstanding orders"))?;

    Ok(result.rows_affected())
}

fn row_to_order(row: &SqliteRow) -> AppResult<MarketplaceOrder> {
    let id: String = row.get("id");
    let buyer_id: String = row.get("buyer_id");
    let seller_id: String = row.get("seller_id");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(MarketplaceOrder {
        id: parse_uuid(&id)?,
        buyer_id: parse_uuid(&buyer_id)?,
        seller_id: parse_uuid(&seller_id)?,
        total: row.get("total"),
        status: parse_enum(&status)?,
        created_at: parse_timestamp(&created_at)?,
    })
}
