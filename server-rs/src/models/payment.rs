use pricing_engine::AddOnSelection;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Payment step submission for any vertical. The server reprices the order
/// and clamps the coin redemption; client-side numbers are advisory only.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Identifying data for the booked item (hotel/flight/train/bus).
    #[serde(rename = "itemRef")]
    pub item_ref: Value,
    /// Passenger or guest details as entered on the form.
    pub passengers: Vec<Value>,
    #[serde(rename = "contactEmail")]
    pub contact_email: String,
    #[serde(rename = "contactPhone")]
    pub contact_phone: Option<String>,
    #[serde(rename = "baseFare")]
    pub base_fare: i64,
    #[serde(default, rename = "addOns")]
    pub add_ons: AddOnSelection,
    #[serde(default, rename = "coinsToUse")]
    pub coins_to_use: i64,
    /// "demo" or "razorpay".
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
}

/// Gateway callback payload forwarded by the client after the payment
/// widget succeeds.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    #[serde(rename = "bookingType")]
    pub booking_type: String,
    #[serde(rename = "razorpayOrderId")]
    pub razorpay_order_id: String,
    #[serde(rename = "razorpayPaymentId")]
    pub razorpay_payment_id: String,
    #[serde(rename = "razorpaySignature")]
    pub razorpay_signature: String,
}
