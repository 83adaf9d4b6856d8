//! Vendors and cakes. The split payment flow never writes to these tables; they exist so that orders can reference
//! real rows.
use splitpay_common::Paise;
use sqlx::SqliteConnection;

use crate::db_types::{Cake, Vendor};

pub async fn insert_vendor(name: &str, conn: &mut SqliteConnection) -> Result<Vendor, sqlx::Error> {
    sqlx::query_as("INSERT INTO vendors (name) VALUES ($1) RETURNING *;").bind(name).fetch_one(conn).await
}

pub async fn insert_cake(
    vendor_id: i64,
    name: &str,
    price: Paise,
    conn: &mut SqliteConnection,
) -> Result<Cake, sqlx::Error> {
    sqlx::query_as("INSERT INTO cakes (vendor_id, name, price) VALUES ($1, $2, $3) RETURNING *;")
        .bind(vendor_id)
        .bind(name)
        .bind(price)
        .fetch_one(conn)
        .await
}

pub async fn fetch_vendor(id: i64, conn: &mut SqliteConnection) -> Result<Option<Vendor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vendors WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_cake(id: i64, conn: &mut SqliteConnection) -> Result<Option<Cake>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cakes WHERE id = $1").bind(id).fetch_optional(conn).await
}
