use crate::api::department::{CreateDepartment, UpdateDepartment};
use crate::api::leave::{
    ApplicationFilter, ApplicationListResponse, ApplyLeaveRequest, AvailabilityQuery,
    BalanceQuery, DecisionBody, LeaveApplicationRow,
};
use crate::api::user::{SetDepartmentReq, SetRoleReq, UserListResponse, UserQuery};
use crate::error::FieldError;
use crate::model::department::Department;
use crate::model::leave_application::{LeaveStatus, SalaryPaymentPreference};
use crate::model::leave_balance::LeaveBalanceView;
use crate::model::leave_type::LeaveType;
use crate::model::notification::Notification;
use crate::model::role::Role;
use crate::model::user::UserSummary;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Employee Leave Management System

This API powers a multi-level **leave request workflow**: staff submit leave
applications, heads of department and a principal secretary approve or reject
them in sequence, and dashboards surface balances, history and calendars.

### 🔹 Key Features
- **Leave Applications**
  - Apply with working-day counting (weekends excluded), delegate handover
    and salary payment preferences
  - Sequential approval: staff → HOD → Principal Secretary
- **Leave Balances**
  - Per user, leave type and year; deducted on final approval
- **Departments & Users**
  - Department administration, HOD assignment, role administration
- **Dashboards**
  - Status counts, leave calendars and countdowns

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Review and administration operations are restricted to **HOD** and
**Principal Secretary** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::leave_types,
        crate::api::leave::leave_balances,
        crate::api::leave::apply_leave,
        crate::api::leave::my_applications,
        crate::api::leave::pending_applications,
        crate::api::leave::get_application,
        crate::api::leave::approve_application,
        crate::api::leave::reject_application,
        crate::api::leave::delegate_availability,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::set_role,
        crate::api::user::set_department,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::dashboard::dashboard_stats,
        crate::api::dashboard::dashboard_calendar,
        crate::api::dashboard::leave_countdown,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_notification_read
    ),
    components(
        schemas(
            Role,
            LeaveStatus,
            SalaryPaymentPreference,
            LeaveType,
            LeaveBalanceView,
            LeaveApplicationRow,
            ApplicationFilter,
            ApplicationListResponse,
            ApplyLeaveRequest,
            AvailabilityQuery,
            BalanceQuery,
            DecisionBody,
            Department,
            CreateDepartment,
            UpdateDepartment,
            UserSummary,
            UserQuery,
            UserListResponse,
            SetRoleReq,
            SetDepartmentReq,
            Notification,
            FieldError
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave application workflow APIs"),
        (name = "User", description = "User directory and role administration APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Dashboard", description = "Read-side dashboard APIs"),
        (name = "Notification", description = "In-app notification APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
