use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::planning::normalize_code;

/// employee_code => employee id, for resolving planning rows without a
/// round trip per row.
pub static EMPLOYEE_ID_CACHE: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn remember(code: &str, id: u64) {
    EMPLOYEE_ID_CACHE.insert(normalize_code(code), id).await;
}

pub async fn lookup(code: &str) -> Option<u64> {
    EMPLOYEE_ID_CACHE.get(&normalize_code(code)).await
}

/// Cache first, database second. A hit from the database is remembered.
pub async fn resolve(pool: &MySqlPool, code: &str) -> Result<Option<u64>, sqlx::Error> {
    if let Some(id) = lookup(code).await {
        return Ok(Some(id));
    }
    let id = crate::model::employee::id_by_code(pool, &normalize_code(code)).await?;
    if let Some(id) = id {
        remember(code, id).await;
    }
    Ok(id)
}

/// Batch insert code => id pairs
async fn batch_remember(pairs: &[(String, u64)]) {
    let futures: Vec<_> = pairs
        .iter()
        .map(|(code, id)| EMPLOYEE_ID_CACHE.insert(normalize_code(code), *id))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load active employees into the in-memory cache (batched)
pub async fn warmup_employee_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64)>(
        r#"
        SELECT employee_code, id
        FROM employees
        WHERE is_active = TRUE
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let pair = row?;
        batch.push(pair);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining pairs
    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!(
        "Employee cache warmup complete: {} active employees",
        total_count
    );

    Ok(())
}
