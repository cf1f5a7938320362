use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => employee number is TAKEN
/// false => employee number is AVAILABLE (usually we store only taken)
pub static EMPLOYEE_NUMBER_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single employee number as taken
pub async fn mark_taken(employee_number: &str) {
    EMPLOYEE_NUMBER_CACHE
        .insert(employee_number.trim().to_owned(), true)
        .await;
}

/// Check if an employee number is taken
pub async fn is_taken(employee_number: &str) -> bool {
    EMPLOYEE_NUMBER_CACHE
        .get(employee_number.trim())
        .await
        .unwrap_or(false)
}

/// Batch mark employee numbers as taken
async fn batch_mark(employee_numbers: &[String]) {
    let futures: Vec<_> = employee_numbers
        .iter()
        .map(|n| EMPLOYEE_NUMBER_CACHE.insert(n.trim().to_owned(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only RECENTLY ACTIVE employee numbers into the cache (batched)
pub async fn warmup_employee_number_cache(
    pool: &MySqlPool,
    days: u32,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT employee_number
        FROM users
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_number,) = row?;
        batch.push(employee_number);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining numbers
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Employee number cache warmup complete: {} recent users (last {} days)",
        total_count,
        days
    );

    Ok(())
}
