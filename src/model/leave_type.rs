use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Annual Leave",
    "description": "30 days annual leave excluding weekends",
    "max_days": 30,
    "is_active": true
}))]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    /// Maximum working days per request; also the default annual allocation.
    pub max_days: u32,
    pub is_active: bool,
}
