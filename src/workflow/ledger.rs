//! Per-(user, leave type, year) balance ledger.
//!
//! All mutations ride the caller's transaction and use guarded single-row
//! updates, so two concurrent approvals against the same balance key cannot
//! both deduct.

use sqlx::{MySql, MySqlPool, Transaction};

use crate::error::WorkflowError;

/// Remaining days, falling back to the leave type's annual allocation
/// (`max_days`) when no row has been materialized yet.
pub async fn fetch_balance(
    pool: &MySqlPool,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<i64, WorkflowError> {
    let existing: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT balance_days
        FROM leave_balances
        WHERE user_id = ? AND leave_type_id = ? AND year = ?
        "#,
    )
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .fetch_optional(pool)
    .await?;

    if let Some(days) = existing {
        return Ok(days);
    }

    let allocation: Option<u32> =
        sqlx::query_scalar("SELECT max_days FROM leave_types WHERE id = ?")
            .bind(leave_type_id)
            .fetch_optional(pool)
            .await?;

    allocation
        .map(i64::from)
        .ok_or(WorkflowError::NotFound("leave type"))
}

/// Materializes the default-allocation row if absent. Idempotent under the
/// (user_id, leave_type_id, year) unique key.
async fn ensure_row(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<(), WorkflowError> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO leave_balances (user_id, leave_type_id, year, balance_days)
        SELECT ?, ?, ?, max_days FROM leave_types WHERE id = ?
        "#,
    )
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .bind(leave_type_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn current_balance(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
) -> Result<i64, WorkflowError> {
    let days: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT balance_days
        FROM leave_balances
        WHERE user_id = ? AND leave_type_id = ? AND year = ?
        "#,
    )
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .fetch_optional(&mut **tx)
    .await?;
    days.ok_or(WorkflowError::NotFound("leave balance"))
}

/// Atomically deducts `days`, failing with `InsufficientBalance` when the
/// guard (`balance_days >= days`) does not hold. Returns the new balance.
pub async fn deduct(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
    days: i64,
) -> Result<i64, WorkflowError> {
    ensure_row(tx, user_id, leave_type_id, year).await?;

    let result = sqlx::query(
        r#"
        UPDATE leave_balances
        SET balance_days = balance_days - ?
        WHERE user_id = ? AND leave_type_id = ? AND year = ?
        AND balance_days >= ?
        "#,
    )
    .bind(days)
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .bind(days)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let available = current_balance(tx, user_id, leave_type_id, year).await.unwrap_or(0);
        return Err(WorkflowError::InsufficientBalance {
            requested: days,
            available,
        });
    }

    current_balance(tx, user_id, leave_type_id, year).await
}

/// Restores `days` to the balance (cancellation, or rejection after a
/// deduction has already happened). Returns the new balance.
pub async fn restore(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    leave_type_id: u64,
    year: i32,
    days: i64,
) -> Result<i64, WorkflowError> {
    ensure_row(tx, user_id, leave_type_id, year).await?;

    sqlx::query(
        r#"
        UPDATE leave_balances
        SET balance_days = balance_days + ?
        WHERE user_id = ? AND leave_type_id = ? AND year = ?
        "#,
    )
    .bind(days)
    .bind(user_id)
    .bind(leave_type_id)
    .bind(year)
    .execute(&mut **tx)
    .await?;

    current_balance(tx, user_id, leave_type_id, year).await
}
