use log::{debug, trace};
use splitpay_common::Paise;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CoPayment, CoPaymentStatus, OrderId},
    traits::CoPaymentRef,
};

/// Inserts a new co-payment row. This is not atomic. Embed the call in a transaction together with the contributor
/// inserts, and pass `&mut *tx` as the connection argument.
pub async fn insert_co_payment(
    order_id: &OrderId,
    total_amount: Paise,
    currency: &str,
    order_data: &str,
    conn: &mut SqliteConnection,
) -> Result<CoPayment, sqlx::Error> {
    let co_payment: CoPayment = sqlx::query_as(
        r#"
            INSERT INTO co_payments (order_id, total_amount, currency, order_data)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(total_amount)
    .bind(currency)
    .bind(order_data)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Co-payment #{} inserted for order {order_id}", co_payment.id);
    Ok(co_payment)
}

pub async fn fetch_co_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM co_payments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_co_payment_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM co_payments WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_by_ref(
    co_payment: &CoPaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<CoPayment>, sqlx::Error> {
    match co_payment {
        CoPaymentRef::Id(id) => fetch_co_payment(*id, conn).await,
        CoPaymentRef::Order(order_id) => fetch_co_payment_for_order(order_id, conn).await,
    }
}

/// Increments the row version and returns the updated row, or `None` if the co-payment does not exist.
///
/// Issue this as the first statement of a transaction. Being a write, it acquires SQLite's write lock immediately, so
/// the reads that follow in the same transaction cannot be invalidated by a concurrent writer.
pub async fn bump_version(
    co_payment: &CoPaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<CoPayment>, sqlx::Error> {
    let query = match co_payment {
        CoPaymentRef::Id(id) => {
            sqlx::query_as("UPDATE co_payments SET version = version + 1 WHERE id = $1 RETURNING *;").bind(*id)
        },
        CoPaymentRef::Order(order_id) => {
            sqlx::query_as("UPDATE co_payments SET version = version + 1 WHERE order_id = $1 RETURNING *;")
                .bind(order_id.as_str())
        },
    };
    let result: Option<CoPayment> = query.fetch_optional(conn).await?;
    if let Some(c) = &result {
        trace!("🗃️ Co-payment #{} is now at version {}", c.id, c.version);
    }
    Ok(result)
}

/// Updates the status and collected amount of a non-terminal co-payment. Use [`mark_completed`] for the `Completed`
/// transition and [`mark_failed`] for `Failed`.
///
/// Returns `None` if the co-payment has reached a terminal status in the meantime.
pub async fn update_progress(
    id: i64,
    status: CoPaymentStatus,
    collected_amount: Paise,
    conn: &mut SqliteConnection,
) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE co_payments SET status = $1, collected_amount = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status IN ('Pending', 'Partial')
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(collected_amount)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// The conditional `Completed` write. It only succeeds while `completed_at` is still null, so at most one caller ever
/// gets `Some` back.
pub async fn mark_completed(
    id: i64,
    collected_amount: Paise,
    conn: &mut SqliteConnection,
) -> Result<Option<CoPayment>, sqlx::Error> {
    let result: Option<CoPayment> = sqlx::query_as(
        r#"
            UPDATE co_payments SET
                status = 'Completed',
                collected_amount = $1,
                completed_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND completed_at IS NULL AND status IN ('Pending', 'Partial')
            RETURNING *;
        "#,
    )
    .bind(collected_amount)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if result.is_some() {
        debug!("🗃️ Co-payment #{id} marked as completed");
    }
    Ok(result)
}

/// Keeps the collected amount cache in step with the contributor rows without touching the status.
pub async fn update_collected_amount(
    id: i64,
    collected_amount: Paise,
    conn: &mut SqliteConnection,
) -> Result<CoPayment, sqlx::Error> {
    sqlx::query_as(
        "UPDATE co_payments SET collected_amount = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *;",
    )
    .bind(collected_amount)
    .bind(id)
    .fetch_one(conn)
    .await
}

/// The conditional confirmation write. Only succeeds for a completed co-payment whose `confirmed_at` is still null.
pub async fn mark_confirmed(id: i64, conn: &mut SqliteConnection) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE co_payments SET confirmed_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Completed' AND confirmed_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn mark_failed(id: i64, conn: &mut SqliteConnection) -> Result<Option<CoPayment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE co_payments SET status = 'Failed', version = version + 1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('Pending', 'Partial')
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_unconfirmed(conn: &mut SqliteConnection) -> Result<Vec<CoPayment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM co_payments WHERE status = 'Completed' AND confirmed_at IS NULL ORDER BY completed_at, id",
    )
    .fetch_all(conn)
    .await
}
