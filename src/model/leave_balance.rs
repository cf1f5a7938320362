use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Remaining days for one (leave type, year), joined with the type so the
/// caller can render allocation alongside. Rows that were never materialized
/// read as the type's full `max_days` allocation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "leave_type_id": 1,
    "leave_type_name": "Annual Leave",
    "max_days": 30,
    "year": 2026,
    "balance_days": 23
}))]
pub struct LeaveBalanceView {
    pub leave_type_id: u64,
    pub leave_type_name: String,
    pub max_days: u32,
    pub year: i32,
    pub balance_days: i64,
}
