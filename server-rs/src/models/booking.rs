use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle. Statuses only ever move forward:
/// pending -> confirmed, or pending -> failed. Canceled is reserved for
/// future cancellation support and never set by the checkout path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// One row shape shared by all four per-vertical booking tables.
/// Invariants: `amount_due = total_amount - coins_used` and
/// `coins_used <= total_amount / 2`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Vertical-specific identifying data (hotel/flight/train/bus),
    /// embedded as a structured sub-document.
    pub item_ref: serde_json::Value,
    pub passengers: serde_json::Value,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub total_amount: i64,
    pub coins_used: i64,
    pub amount_due: i64,
    pub payment_status: String,
    pub status: String,
    pub gateway_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
