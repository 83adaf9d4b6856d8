use splitpay_common::Paise;

use crate::{
    db_types::{Cake, Vendor},
    order_snapshot::{DeliveryAddress, OrderDraft, OrderItem, SPLIT_PAYMENT_METHOD},
    SqliteDatabase,
};

/// Adds a vendor with a single cake to the catalogue.
pub async fn seed_catalog(db: &SqliteDatabase) -> (Vendor, Cake) {
    let vendor = db.insert_vendor("Sugar & Spice Kitchen").await.expect("Error inserting vendor");
    let cake = db.insert_cake(vendor.id, "Chocolate Truffle", Paise::from_rupees(500)).await.expect("Error inserting cake");
    (vendor, cake)
}

pub fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        recipient_name: "Meera Iyer".into(),
        phone: "9876543210".into(),
        line1: "12 MG Road".into(),
        line2: Some("Flat 4B".into()),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        pincode: "560001".into(),
    }
}

/// A one-item order with no delivery charge or discount, so the final amount equals `amount`.
pub fn cake_order(vendor_id: i64, cake_id: i64, amount: Paise) -> OrderDraft {
    OrderDraft {
        customer_id: None,
        vendor_id,
        items: vec![OrderItem {
            cake_id,
            name: "Chocolate Truffle".into(),
            quantity: 1,
            unit_price: amount,
            weight: Some("1kg".into()),
            message: Some("Happy birthday!".into()),
        }],
        delivery_address: delivery_address(),
        total_amount: amount,
        delivery_amount: Paise::default(),
        discount_amount: Paise::default(),
        final_amount: amount,
        payment_method: SPLIT_PAYMENT_METHOD.into(),
        delivery_date: Some("2024-06-15".into()),
        notes: None,
    }
}
