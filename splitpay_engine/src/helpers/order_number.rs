use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderId;

pub const ORDER_NUMBER_PREFIX: &str = "CK";

/// A human-readable order number such as `CK20240611-3F9A1C`.
pub fn generate_order_number() -> OrderId {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    OrderId(format!("{ORDER_NUMBER_PREFIX}{}-{suffix:06X}", Utc::now().format("%Y%m%d")))
}
