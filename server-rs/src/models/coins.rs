use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinWallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub lifetime_earned: i64,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry. The sum of deltas for a user always equals the wallet
/// balance; earn/refund are positive, redeem is negative.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub delta: i64,
    pub balance_after: i64,
    pub tx_type: String,
    pub reason: String,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EarnRequest {
    pub amount: i64,
    /// Free-text label for the audit trail, e.g. "signup_bonus" or "referral".
    pub source: String,
    #[serde(rename = "referenceId")]
    pub reference_id: Option<String>,
}
