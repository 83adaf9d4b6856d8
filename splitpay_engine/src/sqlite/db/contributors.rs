use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Contributor, NewContributor};

pub async fn insert_contributor(
    co_payment_id: i64,
    contributor: &NewContributor,
    conn: &mut SqliteConnection,
) -> Result<Contributor, sqlx::Error> {
    let contributor: Contributor = sqlx::query_as(
        r#"
            INSERT INTO contributors (co_payment_id, name, email, phone, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(co_payment_id)
    .bind(&contributor.name)
    .bind(contributor.email.as_deref())
    .bind(contributor.phone.as_deref())
    .bind(contributor.amount)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ {} added to co-payment #{co_payment_id}", contributor.label());
    Ok(contributor)
}

/// All contributors of the co-payment, in the order they were added.
pub async fn fetch_contributors(co_payment_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Contributor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM contributors WHERE co_payment_id = $1 ORDER BY id")
        .bind(co_payment_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_contributor(id: i64, conn: &mut SqliteConnection) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM contributors WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Looks up the contributor that owns `payment_link_id`, but only within the given co-payment.
pub async fn fetch_contributor_by_link(
    co_payment_id: i64,
    payment_link_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM contributors WHERE co_payment_id = $1 AND payment_link_id = $2")
        .bind(co_payment_id)
        .bind(payment_link_id)
        .fetch_optional(conn)
        .await
}

/// Stores the link details and makes the contributor `Pending` again. A `Failed` contributor's dead link is replaced.
/// Returns `None` if the contributor does not exist, or already has a link and has not failed.
pub async fn set_payment_link(
    id: i64,
    payment_link_id: &str,
    payment_url: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE contributors SET
                payment_link_id = $1,
                payment_url = $2,
                last_issue_error = NULL,
                status = 'Pending',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND (payment_link_id IS NULL OR status = 'Failed')
            RETURNING *;
        "#,
    )
    .bind(payment_link_id)
    .bind(payment_url)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn set_issue_error(
    id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE contributors SET last_issue_error = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *;",
    )
    .bind(reason)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Marks the contributor as paid. `paid_at` is only ever set once. Returns `None` if the contributor was already paid.
pub async fn mark_paid(id: i64, conn: &mut SqliteConnection) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE contributors SET
                status = 'Paid',
                paid_at = COALESCE(paid_at, CURRENT_TIMESTAMP),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status != 'Paid'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Marks a pending contributor as failed. Paid contributors are never downgraded, so this returns `None` for them.
pub async fn mark_failed(id: i64, conn: &mut SqliteConnection) -> Result<Option<Contributor>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE contributors SET status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}
