//! Checkout orchestration: booking creation, coin settlement, and payment
//! confirmation. The one multi-step, partial-failure path in the system,
//! so the stage sequence is an explicit tagged type with guarded
//! transitions rather than an implicit convention. A failed payment step
//! compensates: redeemed coins are refunded and the booking is marked
//! failed instead of dangling in pending.

use pricing_engine::{AddOnSelection, Quote, Vertical};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::booking::{BookingStatus, PaymentStatus};
use crate::models::payment::{CheckoutRequest, VerifyPaymentRequest};
use crate::services::ledger;
use crate::AppState;

/// Booking table per vertical.
pub fn table_for(vertical: Vertical) -> &'static str {
    match vertical {
        Vertical::Hotel => "hotel_bookings",
        Vertical::Flight => "flight_bookings",
        Vertical::Train => "train_bookings",
        Vertical::Bus => "bus_bookings",
    }
}

/// Stages of a single checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    BookingCreated,
    CoinsApplied,
    PaymentInvoked,
    Confirmed,
    Failed,
}

impl CheckoutStage {
    pub fn can_transition(self, next: CheckoutStage) -> bool {
        use CheckoutStage::*;
        matches!(
            (self, next),
            (BookingCreated, CoinsApplied)
                | (BookingCreated, PaymentInvoked)
                | (BookingCreated, Confirmed)
                | (BookingCreated, Failed)
                | (CoinsApplied, PaymentInvoked)
                | (CoinsApplied, Confirmed)
                | (CoinsApplied, Failed)
                | (PaymentInvoked, Confirmed)
                | (PaymentInvoked, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CheckoutStage::Confirmed | CheckoutStage::Failed)
    }

    /// Moves to `next`, or reports the illegal transition. Handlers drive
    /// this forward only; a booking never travels backward.
    pub fn advance(&mut self, next: CheckoutStage) -> AppResult<()> {
        if !self.can_transition(next) {
            return Err(AppError::Internal(format!(
                "illegal checkout transition {:?} -> {:?}",
                self, next
            )));
        }
        *self = next;
        Ok(())
    }
}

/// Order handle returned to the client so it can open the gateway widget.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderInfo {
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// Amount in paise, as the gateway expects.
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "keyId")]
    pub key_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    #[serde(flatten)]
    pub quote: Quote,
    pub status: BookingStatus,
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<GatewayOrderInfo>,
}

/// Add-on amounts come straight off the client form; a negative value
/// would otherwise lower the priced total below the base fare.
fn check_add_ons(add_ons: &AddOnSelection) -> AppResult<()> {
    if add_ons.seat_upgrade < 0 || add_ons.meal < 0 {
        return Err(AppError::BadRequest(
            "Add-on amounts cannot be negative".into(),
        ));
    }
    Ok(())
}

/// Submits the payment step: prices the order server-side, inserts the
/// booking row and redeems coins in one transaction, then either confirms
/// immediately (demo payment) or creates a gateway order.
pub async fn submit(
    state: &AppState,
    user_id: Uuid,
    vertical: Vertical,
    req: CheckoutRequest,
) -> AppResult<CheckoutOutcome> {
    if req.passengers.is_empty() {
        return Err(AppError::BadRequest(
            "At least one passenger or guest is required".into(),
        ));
    }
    if req.contact_email.trim().is_empty() {
        return Err(AppError::BadRequest("Contact email is required".into()));
    }
    if req.base_fare <= 0 {
        return Err(AppError::BadRequest("Base fare must be positive".into()));
    }
    check_add_ons(&req.add_ons)?;
    match req.payment_method.as_str() {
        "demo" => {
            if !state.config.razorpay.demo_enabled {
                return Err(AppError::BadRequest("Demo payments are disabled".into()));
            }
        }
        "razorpay" => {
            if state.razorpay.is_none() {
                return Err(AppError::Internal("Payment gateway not configured".into()));
            }
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown payment method: {}",
                other
            )));
        }
    }

    // Server-side pricing; the client's numbers are advisory. The quote
    // clamps the coin redemption to the 50% cap and the live balance.
    let balance = ledger::balance(&state.db, user_id).await?;
    let quote = pricing_engine::quote(
        vertical,
        req.base_fare,
        &req.add_ons,
        req.coins_to_use,
        balance,
    );

    let table = table_for(vertical);
    let mut stage;

    // Booking insert and coin redemption commit or roll back together.
    let mut tx = state.db.begin().await?;

    let booking_id: Uuid = sqlx::query_scalar(&format!(
        r#"INSERT INTO {table}
            (id, user_id, item_ref, passengers, contact_email, contact_phone,
             total_amount, coins_used, amount_due, payment_status, status, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, 'pending', 'pending', NOW(), NOW())
        RETURNING id"#
    ))
    .bind(user_id)
    .bind(&req.item_ref)
    .bind(serde_json::Value::Array(req.passengers.clone()))
    .bind(req.contact_email.trim())
    .bind(&req.contact_phone)
    .bind(quote.total_amount)
    .bind(quote.coins_applied)
    .bind(quote.amount_due)
    .fetch_one(&mut *tx)
    .await?;

    stage = CheckoutStage::BookingCreated;

    if quote.coins_applied > 0 {
        let reference = booking_id.to_string();
        ledger::redeem(&mut *tx, user_id, quote.coins_applied, Some(&reference)).await?;
        stage.advance(CheckoutStage::CoinsApplied)?;
    }

    if req.payment_method == "demo" {
        sqlx::query(&format!(
            "UPDATE {table} SET status = 'confirmed', payment_status = 'completed', updated_at = NOW() WHERE id = $1"
        ))
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;
        stage.advance(CheckoutStage::Confirmed)?;
        tx.commit().await?;

        tracing::info!(%booking_id, vertical = vertical.as_str(), "demo checkout confirmed");
        return Ok(CheckoutOutcome {
            booking_id,
            quote,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Completed,
            order: None,
        });
    }

    // Booking and redemption are durable before the gateway is involved.
    tx.commit().await?;

    let gateway = state
        .razorpay
        .as_ref()
        .ok_or_else(|| AppError::Internal("Payment gateway not configured".into()))?;

    let receipt = format!("bnb_{}", &booking_id.simple().to_string()[..20]);
    let order = match gateway
        .create_order(
            quote.amount_due * 100,
            &state.config.razorpay.currency,
            &receipt,
            &booking_id.to_string(),
            vertical.as_str(),
        )
        .await
    {
        Ok(order) => order,
        Err(e) => {
            // Compensate: refund the coins and mark the booking failed
            // rather than leaving a dangling pending row.
            fail_booking(&state.db, vertical, booking_id).await?;
            return Err(e);
        }
    };

    let order_id = order["id"].as_str().unwrap_or("").to_string();
    sqlx::query(&format!(
        "UPDATE {table} SET gateway_order_id = $1, updated_at = NOW() WHERE id = $2"
    ))
    .bind(&order_id)
    .bind(booking_id)
    .execute(&state.db)
    .await?;
    stage.advance(CheckoutStage::PaymentInvoked)?;

    tracing::info!(%booking_id, %order_id, vertical = vertical.as_str(), "payment order created");
    Ok(CheckoutOutcome {
        booking_id,
        quote,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        order: Some(GatewayOrderInfo {
            order_id,
            amount: quote.amount_due * 100,
            currency: state.config.razorpay.currency.clone(),
            key_id: gateway.key_id().to_string(),
        }),
    })
}

/// Verifies the gateway callback signature and settles the booking. A bad
/// signature fails the booking and refunds its coins.
pub async fn confirm_payment(
    state: &AppState,
    user_id: Uuid,
    req: VerifyPaymentRequest,
) -> AppResult<serde_json::Value> {
    let vertical: Vertical = req
        .booking_type
        .parse()
        .map_err(|e: pricing_engine::UnknownVertical| AppError::BadRequest(e.to_string()))?;
    let table = table_for(vertical);

    let row: Option<(Uuid, String, Option<String>)> = sqlx::query_as(&format!(
        "SELECT user_id, status, gateway_order_id FROM {table} WHERE id = $1"
    ))
    .bind(req.booking_id)
    .fetch_optional(&state.db)
    .await?;

    let (owner, status, gateway_order_id) =
        row.ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
    if owner != user_id {
        return Err(AppError::NotFound("Booking not found".into()));
    }

    // Verification retries after success are no-ops.
    if status == BookingStatus::Confirmed.as_str() {
        return Ok(json!({ "success": true, "status": "confirmed" }));
    }
    if status != BookingStatus::Pending.as_str() {
        return Err(AppError::Conflict(format!(
            "Booking is {} and cannot be confirmed",
            status
        )));
    }

    if gateway_order_id.as_deref() != Some(req.razorpay_order_id.as_str()) {
        return Err(AppError::BadRequest(
            "Order does not belong to this booking".into(),
        ));
    }

    let gateway = state
        .razorpay
        .as_ref()
        .ok_or_else(|| AppError::Internal("Payment gateway not configured".into()))?;

    if !gateway.verify_payment_signature(
        &req.razorpay_order_id,
        &req.razorpay_payment_id,
        &req.razorpay_signature,
    ) {
        tracing::warn!(booking_id = %req.booking_id, "payment signature verification failed");
        fail_booking(&state.db, vertical, req.booking_id).await?;
        return Err(AppError::BadRequest(
            "Payment signature verification failed".into(),
        ));
    }

    confirm_booking(&state.db, vertical, req.booking_id).await?;
    tracing::info!(booking_id = %req.booking_id, "payment verified, booking confirmed");
    Ok(json!({ "success": true, "status": "confirmed" }))
}

/// PaymentInvoked -> Confirmed. The WHERE guard makes the transition
/// idempotent and forward-only; a failed or canceled booking stays put.
pub async fn confirm_booking(db: &PgPool, vertical: Vertical, booking_id: Uuid) -> AppResult<bool> {
    let table = table_for(vertical);
    let result = sqlx::query(&format!(
        r#"UPDATE {table} SET status = 'confirmed', payment_status = 'completed', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'"#
    ))
    .bind(booking_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// PaymentInvoked/CoinsApplied -> Failed, with compensation: coins redeemed
/// for this booking are credited back in the same transaction that marks it
/// failed. Safe to call repeatedly; only the first call does anything.
pub async fn fail_booking(db: &PgPool, vertical: Vertical, booking_id: Uuid) -> AppResult<bool> {
    let table = table_for(vertical);
    let mut tx = db.begin().await?;

    let row: Option<(Uuid, i64)> = sqlx::query_as(&format!(
        r#"UPDATE {table} SET status = 'failed', payment_status = 'failed', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING user_id, coins_used"#
    ))
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((owner, coins_used)) = row else {
        tx.rollback().await?;
        return Ok(false);
    };

    if coins_used > 0 {
        let reference = booking_id.to_string();
        ledger::refund(&mut *tx, owner, coins_used, Some(&reference)).await?;
    }

    tx.commit().await?;
    tracing::info!(%booking_id, coins_refunded = coins_used, "booking failed, coins refunded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_path_without_coins_confirms_directly() {
        let mut stage = CheckoutStage::BookingCreated;
        assert!(stage.advance(CheckoutStage::Confirmed).is_ok());
        assert!(stage.is_terminal());
    }

    #[test]
    fn full_gateway_path_is_legal() {
        let mut stage = CheckoutStage::BookingCreated;
        stage.advance(CheckoutStage::CoinsApplied).unwrap();
        stage.advance(CheckoutStage::PaymentInvoked).unwrap();
        stage.advance(CheckoutStage::Confirmed).unwrap();
        assert_eq!(stage, CheckoutStage::Confirmed);
    }

    #[test]
    fn failed_payment_is_terminal() {
        let mut stage = CheckoutStage::PaymentInvoked;
        stage.advance(CheckoutStage::Failed).unwrap();
        assert!(stage.is_terminal());
        assert!(stage.advance(CheckoutStage::Confirmed).is_err());
        assert!(stage.advance(CheckoutStage::PaymentInvoked).is_err());
    }

    #[test]
    fn bookings_never_travel_backward() {
        let mut stage = CheckoutStage::Confirmed;
        assert!(stage.advance(CheckoutStage::BookingCreated).is_err());
        assert!(stage.advance(CheckoutStage::CoinsApplied).is_err());

        let mut stage = CheckoutStage::PaymentInvoked;
        assert!(stage.advance(CheckoutStage::CoinsApplied).is_err());
    }

    #[test]
    fn coins_cannot_be_applied_twice() {
        let mut stage = CheckoutStage::CoinsApplied;
        assert!(stage.advance(CheckoutStage::CoinsApplied).is_err());
        assert!(stage.advance(CheckoutStage::PaymentInvoked).is_ok());
    }

    #[test]
    fn coinless_gateway_failure_is_a_legal_exit() {
        // Order creation can fail before any coins were redeemed.
        let mut stage = CheckoutStage::BookingCreated;
        stage.advance(CheckoutStage::Failed).unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn negative_add_ons_are_rejected_before_pricing() {
        let add_ons = AddOnSelection {
            seat_upgrade: -3000,
            ..Default::default()
        };
        assert!(check_add_ons(&add_ons).is_err());

        let add_ons = AddOnSelection {
            meal: -1,
            ..Default::default()
        };
        assert!(check_add_ons(&add_ons).is_err());

        assert!(check_add_ons(&AddOnSelection::default()).is_ok());
    }

    #[test]
    fn each_vertical_has_its_own_table() {
        let tables: std::collections::HashSet<_> =
            Vertical::ALL.iter().map(|v| table_for(*v)).collect();
        assert_eq!(tables.len(), 4);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a Postgres instance"]
    async fn failing_a_booking_refunds_its_coins(pool: sqlx::PgPool) {
        let user = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
            .bind(user)
            .bind(format!("{user}@test.local"))
            .execute(&pool)
            .await
            .unwrap();
        ledger::earn(&pool, user, 100, "signup_bonus", None)
            .await
            .unwrap();

        let booking_id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO hotel_bookings
                (id, user_id, item_ref, passengers, contact_email, total_amount, coins_used, amount_due)
            VALUES ($1, $2, '{}', '[]', 'guest@test.local', 800, 40, 760)"#,
        )
        .bind(booking_id)
        .bind(user)
        .execute(&pool)
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        ledger::redeem(&mut conn, user, 40, None).await.unwrap();
        drop(conn);
        assert_eq!(ledger::balance(&pool, user).await.unwrap(), 60);

        assert!(fail_booking(&pool, Vertical::Hotel, booking_id)
            .await
            .unwrap());
        assert_eq!(ledger::balance(&pool, user).await.unwrap(), 100);

        let (status, payment_status): (String, String) =
            sqlx::query_as("SELECT status, payment_status FROM hotel_bookings WHERE id = $1")
                .bind(booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "failed");
        assert_eq!(payment_status, "failed");

        // Repeat calls find nothing pending and refund nothing.
        assert!(!fail_booking(&pool, Vertical::Hotel, booking_id)
            .await
            .unwrap());
        assert_eq!(ledger::balance(&pool, user).await.unwrap(), 100);
    }
}
