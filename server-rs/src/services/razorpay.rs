use serde_json::{json, Value};

use crate::config::RazorpayConfig;
use crate::error::{AppError, AppResult};

/// Lightweight Razorpay client wrapping raw HTTP calls. The gateway's own
/// order/sign/verify protocol is consumed as-is: orders are created
/// server-side, the client widget collects the payment, and the signed
/// callback payload is verified here.
#[derive(Clone)]
pub struct RazorpayClient {
    key_id: String,
    key_secret: String,
    webhook_secret: String,
    client: reqwest::Client,
}

pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig) -> Option<Self> {
        if config.key_id.is_empty() || config.key_secret.is_empty() {
            return None;
        }
        Some(Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
            client: reqwest::Client::new(),
        })
    }

    /// Public key id handed to the client so it can open the payment widget.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn post(&self, path: &str, body: Value) -> AppResult<Value> {
        let url = format!("https://api.razorpay.com/v1{}", path);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay request failed: {}", e)))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay response parse failed: {}", e)))?;

        if !status.is_success() {
            let msg = body["error"]["description"]
                .as_str()
                .unwrap_or("Unknown Razorpay error");
            return Err(AppError::Gateway(format!("Razorpay error: {}", msg)));
        }
        Ok(body)
    }

    /// Creates a gateway order for `amount_paise`. The booking id and
    /// vertical ride along as notes so webhooks can find their way back.
    pub async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        booking_id: &str,
        booking_type: &str,
    ) -> AppResult<Value> {
        self.post(
            "/orders",
            json!({
                "amount": amount_paise,
                "currency": currency,
                "receipt": receipt,
                "notes": {
                    "bookingId": booking_id,
                    "bookingType": booking_type,
                }
            }),
        )
        .await
    }

    /// Checks the signature the client callback carries:
    /// HMAC-SHA256 over "order_id|payment_id" keyed with the API secret.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let payload = format!("{}|{}", order_id, payment_id);
        let expected = hmac_sha256_hex(self.key_secret.as_bytes(), payload.as_bytes());
        expected == signature
    }

    /// Verifies the webhook HMAC over the raw body and parses the event.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> AppResult<Value> {
        if signature_header.is_empty() {
            return Err(AppError::BadRequest("Missing webhook signature".into()));
        }

        let expected = hmac_sha256_hex(self.webhook_secret.as_bytes(), payload);
        if expected != signature_header {
            return Err(AppError::BadRequest(
                "Webhook signature verification failed".into(),
            ));
        }

        serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> RazorpayClient {
        RazorpayClient::new(&RazorpayConfig {
            key_id: "rzp_test_key".into(),
            key_secret: "test_secret".into(),
            webhook_secret: "whsec".into(),
            currency: "INR".into(),
            demo_enabled: true,
        })
        .unwrap()
    }

    // RFC 4231 test vectors for HMAC-SHA256.
    #[test]
    fn hmac_matches_rfc4231_case_1() {
        let key = [0x0bu8; 20];
        assert_eq!(
            hmac_sha256_hex(&key, b"Hi There"),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    #[test]
    fn hmac_matches_rfc4231_case_2() {
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn payment_signature_accepts_matching_hmac() {
        let client = test_client();
        let sig = hmac_sha256_hex(b"test_secret", b"order_abc|pay_xyz");
        assert!(client.verify_payment_signature("order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn payment_signature_rejects_tampered_payment_id() {
        let client = test_client();
        let sig = hmac_sha256_hex(b"test_secret", b"order_abc|pay_xyz");
        assert!(!client.verify_payment_signature("order_abc", "pay_other", &sig));
        assert!(!client.verify_payment_signature("order_abc", "pay_xyz", "deadbeef"));
    }

    #[test]
    fn webhook_signature_gates_the_payload() {
        let client = test_client();
        let body = br#"{"event":"payment.captured"}"#;
        let sig = hmac_sha256_hex(b"whsec", body);

        let event = client.verify_webhook_signature(body, &sig).unwrap();
        assert_eq!(event["event"], "payment.captured");

        assert!(client.verify_webhook_signature(body, "bogus").is_err());
        assert!(client.verify_webhook_signature(body, "").is_err());
    }

    #[test]
    fn client_requires_keys() {
        let cfg = RazorpayConfig {
            key_id: "".into(),
            key_secret: "".into(),
            webhook_secret: "".into(),
            currency: "INR".into(),
            demo_enabled: true,
        };
        assert!(RazorpayClient::new(&cfg).is_none());
    }
}
