use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Closed set of workflow roles. Persisted as snake_case strings; carried in
/// JWT claims as numeric ids.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Hod,
    PrincipalSecretary,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Staff),
            2 => Some(Role::Hod),
            3 => Some(Role::PrincipalSecretary),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Role::Staff => 1,
            Role::Hod => 2,
            Role::PrincipalSecretary => 3,
        }
    }

    /// Advisory classification from an employee-number's length.
    ///
    /// Used as a signup hint only. The persisted role is whatever the server
    /// assigns; this is never consulted for access control.
    pub fn from_employee_number(employee_number: &str) -> Option<Self> {
        if employee_number.is_empty() || !employee_number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match employee_number.len() {
            4 => Some(Role::Staff),
            5 => Some(Role::Hod),
            6 => Some(Role::PrincipalSecretary),
            _ => None,
        }
    }

    /// Roles that hold a review queue.
    pub fn is_reviewer(self) -> bool {
        matches!(self, Role::Hod | Role::PrincipalSecretary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn classifies_by_employee_number_length() {
        assert_eq!(Role::from_employee_number("1234"), Some(Role::Staff));
        assert_eq!(Role::from_employee_number("12345"), Some(Role::Hod));
        assert_eq!(
            Role::from_employee_number("123456"),
            Some(Role::PrincipalSecretary)
        );
    }

    #[test]
    fn rejects_unclassifiable_numbers() {
        assert_eq!(Role::from_employee_number("12"), None);
        assert_eq!(Role::from_employee_number("1234567"), None);
        assert_eq!(Role::from_employee_number(""), None);
        assert_eq!(Role::from_employee_number("12a4"), None);
        assert_eq!(Role::from_employee_number("12 34"), None);
    }

    #[test]
    fn round_trips_ids_and_names() {
        for role in [Role::Staff, Role::Hod, Role::PrincipalSecretary] {
            assert_eq!(Role::from_id(role.id()), Some(role));
            assert_eq!(Role::from_str(role.as_ref()).ok(), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(4), None);
        assert_eq!(Role::PrincipalSecretary.as_ref(), "principal_secretary");
    }
}
