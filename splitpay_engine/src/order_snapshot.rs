//! The draft order captured when a split payment is created.
//!
//! The draft is stored on the co-payment row as JSON with an explicit `version` tag, so that old rows remain readable
//! when the draft format evolves. A row with an unknown version fails to decode with [`SnapshotError`] rather than
//! being silently misread.
use serde::{Deserialize, Serialize};
use splitpay_common::Paise;
use thiserror::Error;

pub const SPLIT_PAYMENT_METHOD: &str = "split";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("The order snapshot could not be decoded. {0}")]
    Unreadable(String),
    #[error("The order snapshot could not be encoded. {0}")]
    Unwritable(String),
    #[error("The draft order is invalid. {0}")]
    InvalidDraft(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryAddress {
    pub recipient_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub cake_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Paise,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OrderItem {
    /// `None` if the line total does not fit in an `i64`.
    pub fn line_total(&self) -> Option<Paise> {
        self.unit_price.checked_mul(self.quantity)
    }
}

fn default_payment_method() -> String {
    SPLIT_PAYMENT_METHOD.to_string()
}

/// An order that has not been persisted yet. Amounts are in paise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub vendor_id: i64,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub total_amount: Paise,
    #[serde(default)]
    pub delivery_amount: Paise,
    #[serde(default)]
    pub discount_amount: Paise,
    pub final_amount: Paise,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderDraft {
    /// Checks that the draft is internally consistent: it has items, every quantity is positive and the final amount
    /// equals `total + delivery - discount`.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.items.is_empty() {
            return Err(SnapshotError::InvalidDraft("The order has no items".into()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(SnapshotError::InvalidDraft(format!(
                "Item '{}' has a non-positive quantity ({})",
                item.name, item.quantity
            )));
        }
        if self.items.iter().any(|i| i.unit_price.value() < 0) ||
            self.delivery_amount.value() < 0 ||
            self.discount_amount.value() < 0
        {
            return Err(SnapshotError::InvalidDraft("Amounts may not be negative".into()));
        }
        if let Some(item) = self.items.iter().find(|i| i.line_total().is_none()) {
            return Err(SnapshotError::InvalidDraft(format!("The line total for item '{}' is too large", item.name)));
        }
        let expected = self
            .total_amount
            .checked_add(self.delivery_amount)
            .and_then(|a| a.checked_sub(self.discount_amount))
            .ok_or_else(|| SnapshotError::InvalidDraft("The order amounts are too large".into()))?;
        if expected != self.final_amount {
            return Err(SnapshotError::InvalidDraft(format!(
                "The final amount ({}) does not equal total + delivery - discount ({expected})",
                self.final_amount
            )));
        }
        if !self.final_amount.is_positive() {
            return Err(SnapshotError::InvalidDraft("The final amount must be positive".into()));
        }
        Ok(())
    }
}

/// The versioned envelope stored in `co_payments.order_data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "version")]
pub enum OrderSnapshot {
    #[serde(rename = "1")]
    V1(OrderDraft),
}

impl OrderSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Unreadable(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Unwritable(e.to_string()))
    }

    pub fn draft(&self) -> &OrderDraft {
        match self {
            Self::V1(draft) => draft,
        }
    }

    pub fn into_draft(self) -> OrderDraft {
        match self {
            Self::V1(draft) => draft,
        }
    }
}

impl From<OrderDraft> for OrderSnapshot {
    fn from(draft: OrderDraft) -> Self {
        Self::V1(draft)
    }
}
