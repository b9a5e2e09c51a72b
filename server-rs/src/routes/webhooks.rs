use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use pricing_engine::Vertical;
use uuid::Uuid;

use crate::services::checkout;
use crate::AppState;

/// Razorpay webhook: HMAC-verified raw body, DB-backed idempotency, and the
/// same guarded booking transitions the verify endpoint uses. Payment
/// capture confirms the booking; payment failure fails it and refunds the
/// redeemed coins.
pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let gateway = match &state.razorpay {
        Some(g) => g,
        None => return Ok(StatusCode::OK),
    };

    let sig = headers
        .get("x-razorpay-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let event = match gateway.verify_webhook_signature(&body, sig) {
        Ok(e) => e,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let event_id = event_id(&headers);
    let event_type = event["event"].as_str().unwrap_or("");

    // Idempotency check; deliveries without an id skip the bookkeeping
    // entirely, otherwise one id-less event would shadow all the rest.
    if let Some(id) = event_id {
        let already_processed: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM gateway_events WHERE id = $1)")
                .bind(id)
                .fetch_one(&state.db)
                .await
                .unwrap_or(false);

        if already_processed {
            return Ok(StatusCode::OK);
        }
    }

    // The order was created with the booking id and vertical as notes.
    let notes = &event["payload"]["payment"]["entity"]["notes"];
    let booking_id = notes["bookingId"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok());
    let vertical = notes["bookingType"]
        .as_str()
        .and_then(|s| s.parse::<Vertical>().ok());

    let result = match (event_type, booking_id, vertical) {
        ("payment.captured", Some(id), Some(v)) => {
            checkout::confirm_booking(&state.db, v, id).await.map(|_| ())
        }
        ("payment.failed", Some(id), Some(v)) => {
            checkout::fail_booking(&state.db, v, id).await.map(|_| ())
        }
        _ => Ok(()),
    };

    let status = if result.is_ok() { "processed" } else { "failed" };

    // Record event
    if let Some(id) = event_id {
        let _ = sqlx::query(
            "INSERT INTO gateway_events (id, event_type, payload, status) VALUES ($1, $2, $3, $4) ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(event_type)
        .bind(&event)
        .bind(status)
        .execute(&state.db)
        .await;
    }

    Ok(StatusCode::OK)
}

/// Non-empty delivery id from the gateway headers.
fn event_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-razorpay-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_requires_a_non_empty_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(event_id(&headers), None);

        headers.insert("x-razorpay-event-id", "".parse().unwrap());
        assert_eq!(event_id(&headers), None);

        headers.insert("x-razorpay-event-id", "evt_123".parse().unwrap());
        assert_eq!(event_id(&headers), Some("evt_123"));
    }
}
