use log::debug;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Order, OrderId, OrderItemRecord, OrderStatusHistory, OrderStatusType, PaymentStatusType},
    order_snapshot::{OrderDraft, OrderItem},
};

/// Creates the order row and its item rows from a draft. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order_from_draft(
    order_id: &OrderId,
    draft: &OrderDraft,
    status: OrderStatusType,
    payment_status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                vendor_id,
                status,
                payment_method,
                payment_status,
                total_amount,
                delivery_amount,
                discount_amount,
                final_amount,
                delivery_address,
                delivery_date,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(draft.customer_id.as_deref())
    .bind(draft.vendor_id)
    .bind(status)
    .bind(&draft.payment_method)
    .bind(payment_status)
    .bind(draft.total_amount)
    .bind(draft.delivery_amount)
    .bind(draft.discount_amount)
    .bind(draft.final_amount)
    .bind(Json(&draft.delivery_address))
    .bind(draft.delivery_date.as_deref())
    .bind(draft.notes.as_deref())
    .fetch_one(&mut *conn)
    .await?;
    insert_items(order.id, &draft.items, conn).await?;
    debug!("📝️ Order [{}] inserted with id {} and {} items", order.order_id, order.id, draft.items.len());
    Ok(order)
}

async fn insert_items(order_id: i64, items: &[OrderItem], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder =
        QueryBuilder::<Sqlite>::new("INSERT INTO order_items (order_id, cake_id, name, quantity, unit_price, weight, message) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_id)
            .push_bind(item.cake_id)
            .push_bind(item.name.clone())
            .push_bind(item.quantity)
            .push_bind(item.unit_price)
            .push_bind(item.weight.clone())
            .push_bind(item.message.clone());
    });
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_order_items(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT order_items.* FROM order_items
            JOIN orders ON orders.id = order_items.order_id
            WHERE orders.order_id = $1
            ORDER BY order_items.id
        "#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await
}

/// Sets the order status and payment status. Returns `None` if the order does not exist.
pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, payment_status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(payment_status)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("📝️ Order {order_id} is now {status} with payment status {payment_status}");
    }
    Ok(order)
}

pub async fn insert_status_history(
    order_id: &OrderId,
    status: OrderStatusType,
    message: &str,
    actor: &str,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusHistory, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, status, message, actor)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(status)
    .bind(message)
    .bind(actor)
    .fetch_one(conn)
    .await
}

pub async fn fetch_status_history(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}
