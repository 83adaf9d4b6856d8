mod contact;
mod order_number;

pub use contact::{is_valid_email, normalize_phone};
pub use order_number::{generate_order_number, ORDER_NUMBER_PREFIX};
