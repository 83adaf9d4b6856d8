//! Data types that are stored in, and read from, the split payment database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use splitpay_common::Paise;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

use crate::order_snapshot::{DeliveryAddress, OrderSnapshot, SnapshotError};

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

/// Implements `Display`, `FromStr` and a lenient `From<String>` for the simple status enums below.
macro_rules! status_strings {
    ($name:ident, $default:ident, [$($variant:ident),+]) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => write!(f, stringify!($variant)),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{s} is not a valid {}", stringify!($name)))),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!("Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($name), stringify!($default));
                    $name::$default
                })
            }
        }
    };
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The human-readable order number, e.g. `CK20240611-3F9A1C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed, but is awaiting payment.
    Pending,
    /// Payment is complete and the vendor has been asked to fulfil the order.
    Confirmed,
    /// The vendor is baking.
    Preparing,
    OutForDelivery,
    Delivered,
    /// The order has been cancelled by the customer, vendor or admin.
    Cancelled,
}

status_strings!(OrderStatusType, Pending, [Pending, Confirmed, Preparing, OutForDelivery, Delivered, Cancelled]);

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    Pending,
    Partial,
    Completed,
    Failed,
}

status_strings!(PaymentStatusType, Pending, [Pending, Partial, Completed, Failed]);

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: Option<String>,
    pub vendor_id: i64,
    pub status: OrderStatusType,
    pub payment_method: String,
    pub payment_status: PaymentStatusType,
    pub total_amount: Paise,
    pub delivery_amount: Paise,
    pub discount_amount: Paise,
    pub final_amount: Paise,
    pub delivery_address: Json<DeliveryAddress>,
    pub delivery_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub id: i64,
    /// The internal id of the order this item belongs to
    pub order_id: i64,
    pub cake_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Paise,
    pub weight: Option<String>,
    pub message: Option<String>,
}

//--------------------------------------  OrderStatusHistory   ---------------------------------------------------------
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub message: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------  CoPaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CoPaymentStatus {
    /// No contributor has paid yet
    Pending,
    /// At least one, but not every, contributor has paid
    Partial,
    /// Every contributor has paid. Terminal.
    Completed,
    /// The co-payment was abandoned. Terminal.
    Failed,
}

status_strings!(CoPaymentStatus, Pending, [Pending, Partial, Completed, Failed]);

impl CoPaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Derives the aggregate status from contributor counts. Terminal statuses are sticky, so once a co-payment is
    /// completed or failed, this always returns the current status.
    pub fn recompute(self, paid: usize, total: usize) -> Self {
        if self.is_terminal() {
            return self;
        }
        match (paid, total) {
            (_, 0) => Self::Pending,
            (p, t) if p >= t => Self::Completed,
            (0, _) => Self::Pending,
            _ => Self::Partial,
        }
    }
}

//--------------------------------------      CoPayment        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CoPayment {
    pub id: i64,
    pub order_id: OrderId,
    pub total_amount: Paise,
    /// A cache of the sum of paid contributions. Contributor rows are authoritative.
    pub collected_amount: Paise,
    pub currency: String,
    pub status: CoPaymentStatus,
    /// The versioned JSON snapshot of the draft order. See [`OrderSnapshot`].
    pub order_data: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl CoPayment {
    pub fn snapshot(&self) -> Result<OrderSnapshot, SnapshotError> {
        OrderSnapshot::from_json(&self.order_data)
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }
}

//-------------------------------------- ContributorStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ContributorStatus {
    Pending,
    Paid,
    Failed,
}

status_strings!(ContributorStatus, Pending, [Pending, Paid, Failed]);

//--------------------------------------     Contributor       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contributor {
    pub id: i64,
    pub co_payment_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub amount: Paise,
    pub status: ContributorStatus,
    pub payment_link_id: Option<String>,
    pub payment_url: Option<String>,
    /// Why the last attempt to issue a payment link for this contributor failed, if it did.
    pub last_issue_error: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contributor {
    pub fn has_link(&self) -> bool {
        self.payment_link_id.is_some()
    }

    /// True if the contributor has no link yet, or their link expired or was cancelled before they paid.
    pub fn needs_new_link(&self) -> bool {
        !self.has_link() || self.status == ContributorStatus::Failed
    }

    /// A short label for log messages that does not leak the full email address or phone number.
    pub fn label(&self) -> String {
        format!("contributor #{} ({})", self.id, self.name)
    }
}

/// Contributor counts, derived from the contributor rows of one co-payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorTally {
    pub total: usize,
    pub paid: usize,
    pub pending: usize,
    pub failed: usize,
    /// The sum of the amounts of the paid contributors
    pub collected: Paise,
}

impl ContributorTally {
    pub fn new(contributors: &[Contributor]) -> Self {
        contributors.iter().fold(Self::default(), |mut tally, c| {
            tally.total += 1;
            match c.status {
                ContributorStatus::Paid => {
                    tally.paid += 1;
                    tally.collected = tally.collected.saturating_add(c.amount);
                },
                ContributorStatus::Pending => tally.pending += 1,
                ContributorStatus::Failed => tally.failed += 1,
            }
            tally
        })
    }

    /// `paid / total * 100`, rounded to the nearest integer.
    pub fn completion_percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.paid * 100 + self.total / 2) / self.total;
        u8::try_from(pct.min(100)).unwrap_or(100)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.total > 0 && self.paid == self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewContributor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub amount: Paise,
}

impl NewContributor {
    pub fn with_email<S: Into<String>>(name: S, email: S, amount: Paise) -> Self {
        Self { name: name.into(), email: Some(email.into()), phone: None, amount }
    }

    pub fn with_phone<S: Into<String>>(name: S, phone: S, amount: Paise) -> Self {
        Self { name: name.into(), email: None, phone: Some(phone.into()), amount }
    }
}

//--------------------------------------    NewCoPayment       ---------------------------------------------------------
/// A validated request to store a new co-payment aggregate and its contributors.
#[derive(Debug, Clone)]
pub struct NewCoPayment {
    pub order_id: OrderId,
    pub total_amount: Paise,
    pub currency: String,
    pub snapshot: OrderSnapshot,
    pub contributors: Vec<NewContributor>,
}

//--------------------------------------       Catalog         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cake {
    pub id: i64,
    pub vendor_id: i64,
    pub name: String,
    pub price: Paise,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
