use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_NUMBER_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(employee_number: &str) -> String {
    employee_number.trim().to_owned()
}

/// Check if an employee number might be registered (false positives possible)
pub fn might_exist(employee_number: &str) -> bool {
    let employee_number = normalize(employee_number);
    EMPLOYEE_NUMBER_FILTER
        .read()
        .expect("employee number filter poisoned")
        .contains(&employee_number)
}

/// Insert a single employee number into the filter
pub fn insert(employee_number: &str) {
    let employee_number = normalize(employee_number);
    EMPLOYEE_NUMBER_FILTER
        .write()
        .expect("employee number filter poisoned")
        .add(&employee_number);
}

/// Remove an employee number from the filter
pub fn remove(employee_number: &str) {
    let employee_number = normalize(employee_number);
    EMPLOYEE_NUMBER_FILTER
        .write()
        .expect("employee number filter poisoned")
        .remove(&employee_number);
}

/// Warm up the filter from the users table using streaming + batching
pub async fn warmup_employee_number_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT employee_number FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_number,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&employee_number));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee number filter warmup complete: {} users", total);
    Ok(())
}

fn insert_batch(employee_numbers: &[String]) {
    let mut filter = EMPLOYEE_NUMBER_FILTER
        .write()
        .expect("employee number filter poisoned");

    for employee_number in employee_numbers {
        filter.add(employee_number);
    }
}
