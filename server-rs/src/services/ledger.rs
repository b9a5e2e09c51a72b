//! Loyalty ledger: a non-negative coin balance per user plus an append-only
//! transaction trail whose deltas sum to the balance.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub async fn balance(db: &PgPool, user_id: Uuid) -> AppResult<i64> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM coin_wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(balance.unwrap_or(0))
}

/// Credits `amount` coins, creating the wallet on first earn. Returns the
/// new balance.
pub async fn earn(
    db: &PgPool,
    user_id: Uuid,
    amount: i64,
    source: &str,
    reference_id: Option<&str>,
) -> AppResult<i64> {
    if amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let mut tx = db.begin().await?;

    let balance: i64 = sqlx::query_scalar(
        r#"INSERT INTO coin_wallets (user_id, balance, lifetime_earned, updated_at)
        VALUES ($1, $2, $2, NOW())
        ON CONFLICT (user_id) DO UPDATE SET
            balance = coin_wallets.balance + $2,
            lifetime_earned = coin_wallets.lifetime_earned + $2,
            updated_at = NOW()
        RETURNING balance"#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut *tx)
    .await?;

    record_transaction(&mut *tx, user_id, amount, balance, "earn", source, reference_id).await?;

    tx.commit().await?;
    Ok(balance)
}

/// Debits `amount` coins as a single atomic conditional update; the WHERE
/// guard is what keeps two concurrent redemptions from over-spending.
/// Runs on the caller's connection so checkout can join it to the booking
/// insert transaction. Fails with `InsufficientBalance` and leaves the
/// balance untouched when the wallet cannot cover the amount.
pub async fn redeem(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    reference_id: Option<&str>,
) -> AppResult<i64> {
    if amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let balance: Option<i64> = sqlx::query_scalar(
        r#"UPDATE coin_wallets SET balance = balance - $2, updated_at = NOW()
        WHERE user_id = $1 AND balance >= $2
        RETURNING balance"#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    let balance = balance.ok_or(AppError::InsufficientBalance)?;

    record_transaction(
        conn,
        user_id,
        -amount,
        balance,
        "redeem",
        "checkout",
        reference_id,
    )
    .await?;

    Ok(balance)
}

/// Compensation credit: returns coins redeemed for a booking whose payment
/// subsequently failed. Does not count toward lifetime earnings.
pub async fn refund(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    reference_id: Option<&str>,
) -> AppResult<i64> {
    if amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let balance: i64 = sqlx::query_scalar(
        r#"INSERT INTO coin_wallets (user_id, balance, lifetime_earned, updated_at)
        VALUES ($1, $2, 0, NOW())
        ON CONFLICT (user_id) DO UPDATE SET
            balance = coin_wallets.balance + $2,
            updated_at = NOW()
        RETURNING balance"#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut *conn)
    .await?;

    record_transaction(
        conn,
        user_id,
        amount,
        balance,
        "refund",
        "checkout refund",
        reference_id,
    )
    .await?;

    Ok(balance)
}

async fn record_transaction(
    conn: &mut PgConnection,
    user_id: Uuid,
    delta: i64,
    balance_after: i64,
    tx_type: &str,
    reason: &str,
    reference_id: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO coin_transactions (user_id, delta, balance_after, tx_type, reason, reference_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())"#,
    )
    .bind(user_id)
    .bind(delta)
    .bind(balance_after)
    .bind(tx_type)
    .bind(reason)
    .bind(reference_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
            .bind(id)
            .bind(format!("{id}@test.local"))
            .execute(pool)
            .await
            .unwrap();
        id
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a Postgres instance"]
    async fn earns_aggregate_into_one_balance(pool: PgPool) {
        let user = seed_user(&pool).await;

        earn(&pool, user, 10, "signup_bonus", None).await.unwrap();
        let after = earn(&pool, user, 15, "referral", None).await.unwrap();
        assert_eq!(after, 25);
        assert_eq!(balance(&pool, user).await.unwrap(), 25);

        // The trail records both movements and their running balances.
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT delta, balance_after FROM coin_transactions WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows, vec![(10, 10), (15, 25)]);
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL pointing at a Postgres instance"]
    async fn over_redeeming_fails_and_leaves_the_balance(pool: PgPool) {
        let user = seed_user(&pool).await;
        earn(&pool, user, 40, "signup_bonus", None).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let err = redeem(&mut conn, user, 41, None).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance));
        drop(conn);

        assert_eq!(balance(&pool, user).await.unwrap(), 40);

        // No redeem row was written for the rejected attempt.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coin_transactions WHERE user_id = $1 AND tx_type = 'redeem'",
        )
        .bind(user)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 0);
    }
}
