use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct SignupReq {
    #[schema(example = "4821")]
    pub employee_number: String,
    #[schema(example = "jane.wanjiku@ministry.go.ke", format = "email")]
    pub email: String,
    #[schema(example = "+254712345678")]
    pub phone_number: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Wanjiku")]
    pub last_name: String,
    pub password: String,
    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "4821")]
    pub employee_number: String,
    pub password: String,
}

/// Credential row fetched at login time.
#[derive(FromRow)]
pub struct UserCredentials {
    pub id: u64,
    pub employee_number: String,
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub is_active: bool,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Employee number.
    pub sub: String,
    /// Role id, see `Role::from_id`.
    pub role: u8,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if the user belongs to a department.
    pub department_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
