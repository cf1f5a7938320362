use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::WorkflowError;
use crate::model::leave_application::{LeaveStatus, SalaryPaymentPreference};
use crate::model::leave_balance::LeaveBalanceView;
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use crate::workflow::machine::{self, ApplicationView, Decision};
use crate::workflow::validator::{self, LeaveDraft, ValidationContext};
use crate::workflow::workdays;
use crate::workflow::ledger;

/// Application joined with applicant and leave-type context, the shape every
/// read endpoint returns.
#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplicationRow {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 10)]
    pub applicant_id: u64,
    pub leave_type_id: u64,
    pub subject: Option<String>,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 5)]
    pub days_requested: u32,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_to: Option<NaiveDate>,
    pub contact_info: String,
    pub salary_payment_preference: SalaryPaymentPreference,
    pub salary_payment_address: Option<String>,
    pub permission_note_country: Option<String>,
    pub person_handling_duties_id: Option<u64>,
    #[schema(example = "pending_hod_approval")]
    pub status: LeaveStatus,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_comments: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "Jane Wanjiku")]
    pub applicant_name: String,
    #[schema(example = "4821")]
    pub applicant_employee_number: String,
    pub applicant_department_id: Option<u64>,
    #[schema(example = "Annual Leave")]
    pub leave_type_name: String,
}

pub(crate) const APPLICATION_SELECT: &str = r#"
    SELECT a.id, a.applicant_id, a.leave_type_id, a.subject, a.start_date, a.end_date,
           a.days_requested, a.last_leave_from, a.last_leave_to, a.contact_info,
           a.salary_payment_preference, a.salary_payment_address, a.permission_note_country,
           a.person_handling_duties_id, a.status, a.approved_by, a.decided_at,
           a.decision_comments, a.created_at,
           CONCAT(u.first_name, ' ', u.last_name) AS applicant_name,
           u.employee_number AS applicant_employee_number,
           u.department_id AS applicant_department_id,
           lt.name AS leave_type_name
    FROM leave_applications a
    JOIN users u ON u.id = a.applicant_id
    JOIN leave_types lt ON lt.id = a.leave_type_id
"#;

async fn fetch_application(
    pool: &MySqlPool,
    id: u64,
) -> Result<LeaveApplicationRow, WorkflowError> {
    let sql = format!("{APPLICATION_SELECT} WHERE a.id = ?");
    sqlx::query_as::<_, LeaveApplicationRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(WorkflowError::NotFound("leave application"))
}

/// Pending/approved date windows of one user, the overlap inputs for the
/// validator and the availability check.
async fn open_windows(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Vec<(NaiveDate, NaiveDate)>, WorkflowError> {
    let windows = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
        r#"
        SELECT start_date, end_date
        FROM leave_applications
        WHERE applicant_id = ?
        AND status IN ('pending_hod_approval', 'pending_principal_secretary_approval', 'approved')
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(windows)
}

/* =========================
List leave types
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/types",
    responses(
        (status = 200, description = "Active leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_types(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let types = sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, description, max_days, is_active FROM leave_types WHERE is_active = TRUE ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "leave_types": types })))
}

/* =========================
Own balances
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct BalanceRow {
    leave_type_id: u64,
    leave_type_name: String,
    max_days: u32,
    balance_days: i64,
}

/// Per-type balances for a year; also feeds the dashboard.
pub(crate) async fn balances_for(
    pool: &MySqlPool,
    user_id: u64,
    year: i32,
) -> Result<Vec<LeaveBalanceView>, WorkflowError> {
    // Missing rows read as the type's full allocation.
    let rows = sqlx::query_as::<_, BalanceRow>(
        r#"
        SELECT lt.id AS leave_type_id, lt.name AS leave_type_name, lt.max_days,
               CAST(COALESCE(lb.balance_days, lt.max_days) AS SIGNED) AS balance_days
        FROM leave_types lt
        LEFT JOIN leave_balances lb
            ON lb.leave_type_id = lt.id AND lb.user_id = ? AND lb.year = ?
        WHERE lt.is_active = TRUE
        ORDER BY lt.id
        "#,
    )
    .bind(user_id)
    .bind(year)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| LeaveBalanceView {
            leave_type_id: r.leave_type_id,
            leave_type_name: r.leave_type_name,
            max_days: r.max_days,
            year,
            balance_days: r.balance_days,
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Per-type remaining days for the year"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let balances = balances_for(pool.get_ref(), auth.user_id, year).await?;

    Ok(HttpResponse::Ok().json(json!({ "balances": balances })))
}

/* =========================
Submit application
========================= */
#[derive(Deserialize, ToSchema)]
pub struct ApplyLeaveRequest {
    #[schema(example = 1)]
    pub leave_type_id: Option<u64>,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    pub subject: Option<String>,
    #[schema(example = "+254712345678")]
    pub contact_info: Option<String>,
    #[schema(example = "bank_account")]
    pub salary_payment_preference: Option<SalaryPaymentPreference>,
    pub salary_payment_address: Option<String>,
    pub permission_note_country: Option<String>,
    #[schema(example = 99, nullable = true)]
    pub person_handling_duties_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_leave_to: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/v1/leave/apply",
    request_body = ApplyLeaveRequest,
    responses(
        (status = 201, description = "Application submitted", body = LeaveApplicationRow),
        (status = 422, description = "Validation failed, one message per field"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ApplyLeaveRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let today = Utc::now().date_naive();

    let draft = LeaveDraft {
        leave_type_id: payload.leave_type_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        subject: payload.subject,
        contact_info: payload.contact_info,
        salary_payment_preference: payload.salary_payment_preference,
        salary_payment_address: payload.salary_payment_address,
        permission_note_country: payload.permission_note_country,
        person_handling_duties_id: payload.person_handling_duties_id,
        last_leave_from: payload.last_leave_from,
        last_leave_to: payload.last_leave_to,
    };

    // Gather everything the pure validator needs.
    let leave_type = match draft.leave_type_id {
        Some(id) => sqlx::query_as::<_, LeaveType>(
            "SELECT id, name, description, max_days, is_active FROM leave_types WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?,
        None => None,
    };

    let balance_year = draft
        .start_date
        .map(|d| d.year())
        .unwrap_or_else(|| today.year());
    let balance_days = match &leave_type {
        Some(lt) => ledger::fetch_balance(pool.get_ref(), auth.user_id, lt.id, balance_year)
            .await
            .map_err(actix_web::Error::from)?,
        None => 0,
    };

    let own_windows = open_windows(pool.get_ref(), auth.user_id).await?;

    let (delegate_known, delegate_windows) = match draft.person_handling_duties_id {
        Some(delegate_id) if delegate_id != auth.user_id => {
            let known =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                    .bind(delegate_id)
                    .fetch_one(pool.get_ref())
                    .await
                    .map_err(WorkflowError::from)?;
            let windows = if known {
                open_windows(pool.get_ref(), delegate_id).await?
            } else {
                Vec::new()
            };
            (known, windows)
        }
        _ => (false, Vec::new()),
    };

    let holidays = match (config.exclude_public_holidays, draft.start_date, draft.end_date) {
        (true, Some(start), Some(end)) if start <= end => (start.year()..=end.year())
            .flat_map(workdays::public_holidays)
            .collect(),
        _ => Vec::new(),
    };

    let ctx = ValidationContext {
        today,
        leave_type: leave_type.as_ref(),
        balance_days,
        own_windows: &own_windows,
        delegate_known,
        delegate_windows: &delegate_windows,
        holidays: &holidays,
    };

    let validated = validator::validate(&draft, auth.user_id, &ctx)?;
    let status = machine::initial_status(auth.role, auth.department_id.is_some());

    let result = sqlx::query(
        r#"
        INSERT INTO leave_applications
            (applicant_id, leave_type_id, subject, start_date, end_date, days_requested,
             last_leave_from, last_leave_to, contact_info, salary_payment_preference,
             salary_payment_address, permission_note_country, person_handling_duties_id, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(validated.leave_type_id)
    .bind(&validated.subject)
    .bind(validated.start_date)
    .bind(validated.end_date)
    .bind(validated.days_requested)
    .bind(validated.last_leave_from)
    .bind(validated.last_leave_to)
    .bind(&validated.contact_info)
    .bind(validated.salary_payment_preference.as_ref())
    .bind(&validated.salary_payment_address)
    .bind(&validated.permission_note_country)
    .bind(validated.person_handling_duties_id)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, applicant_id = auth.user_id, "Failed to create leave application");
        WorkflowError::from(e)
    })?;

    let application = fetch_application(pool.get_ref(), result.last_insert_id()).await?;

    notify_reviewers(pool.get_ref(), &application, auth.department_id).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave application submitted successfully",
        "application": application,
    })))
}

/// Best-effort: a failed notification never fails the submission.
async fn notify_reviewers(
    pool: &MySqlPool,
    application: &LeaveApplicationRow,
    applicant_department_id: Option<u64>,
) {
    let message = format!(
        "New {} application from {}",
        application.leave_type_name, application.applicant_name
    );

    let result = match application.status {
        LeaveStatus::PendingHodApproval => {
            sqlx::query(
                r#"
                INSERT INTO notifications
                    (user_id, title, message, notification_type, leave_application_id)
                SELECT d.hod_id, 'New Leave Application', ?, 'leave_application', ?
                FROM departments d
                WHERE d.id = ? AND d.hod_id IS NOT NULL
                "#,
            )
            .bind(&message)
            .bind(application.id)
            .bind(applicant_department_id)
            .execute(pool)
            .await
        }
        _ => {
            sqlx::query(
                r#"
                INSERT INTO notifications
                    (user_id, title, message, notification_type, leave_application_id)
                SELECT u.id, 'New Leave Application', ?, 'leave_application', ?
                FROM users u
                WHERE u.role = 'principal_secretary'
                "#,
            )
            .bind(&message)
            .bind(application.id)
            .execute(pool)
            .await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, application_id = application.id, "Reviewer notification failed");
    }
}

/* =========================
Own history
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ApplicationFilter {
    /// `pending` matches both review stages
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ApplicationListResponse {
    pub data: Vec<LeaveApplicationRow>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    I32(i32),
    Str(&'a str),
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/applications",
    params(ApplicationFilter),
    responses(
        (status = 200, description = "Own applications, newest first", body = ApplicationListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_applications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ApplicationFilter>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE a.applicant_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(auth.user_id)];

    match query.status.as_deref() {
        // The summary meaning of "pending" covers both review stages.
        Some("pending") => {
            where_sql.push_str(
                " AND a.status IN ('pending_hod_approval', 'pending_principal_secretary_approval')",
            );
        }
        Some(status) => {
            where_sql.push_str(" AND a.status = ?");
            args.push(FilterValue::Str(status));
        }
        None => {}
    }

    if let Some(year) = query.year {
        where_sql.push_str(" AND YEAR(a.start_date) = ?");
        args.push(FilterValue::I32(year));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_applications a{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::I32(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    let data_sql = format!(
        "{APPLICATION_SELECT} {} ORDER BY a.created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut data_q = sqlx::query_as::<_, LeaveApplicationRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::I32(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let applications = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(ApplicationListResponse {
        data: applications,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Reviewer queue
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/pending",
    responses(
        (status = 200, description = "Applications awaiting this reviewer", body = [LeaveApplicationRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a reviewer")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_applications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer().map_err(actix_web::Error::from)?;

    let applications = match auth.role {
        Role::Hod => {
            let sql = format!(
                "{APPLICATION_SELECT} WHERE a.status = 'pending_hod_approval' AND u.department_id = ? ORDER BY a.created_at DESC"
            );
            sqlx::query_as::<_, LeaveApplicationRow>(&sql)
                .bind(auth.department_id)
                .fetch_all(pool.get_ref())
                .await
        }
        _ => {
            let sql = format!(
                "{APPLICATION_SELECT} WHERE a.status = 'pending_principal_secretary_approval' ORDER BY a.created_at DESC"
            );
            sqlx::query_as::<_, LeaveApplicationRow>(&sql)
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "applications": applications })))
}

/* =========================
Single application
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{application_id}",
    params(("application_id" = u64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application found", body = LeaveApplicationRow),
        (status = 403, description = "Not visible to this user"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_application(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let application = fetch_application(pool.get_ref(), path.into_inner()).await?;

    let view = ApplicationView {
        id: application.id,
        applicant_id: application.applicant_id,
        applicant_department_id: application.applicant_department_id,
        status: application.status,
    };
    if !machine::can_view(&view, &auth.actor()) {
        return Err(WorkflowError::UnauthorizedAction(
            "application is not visible to this user",
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(application))
}

/* =========================
Approve / reject
========================= */
#[derive(Deserialize, ToSchema)]
pub struct DecisionBody {
    #[schema(example = "Enjoy your leave")]
    pub comments: Option<String>,
}

async fn decide(
    auth: &AuthUser,
    pool: &MySqlPool,
    application_id: u64,
    decision: Decision,
    comments: Option<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let application = fetch_application(pool, application_id).await?;

    let view = ApplicationView {
        id: application.id,
        applicant_id: application.applicant_id,
        applicant_department_id: application.applicant_department_id,
        status: application.status,
    };
    let next = machine::next_status(&view, &auth.actor(), decision)?;

    let mut tx = pool.begin().await.map_err(WorkflowError::from)?;

    // Guarded on the status we decided against: of two concurrent reviewers
    // exactly one update matches, the other observes a conflict.
    let updated = sqlx::query(
        r#"
        UPDATE leave_applications
        SET status = ?, approved_by = ?, decided_at = ?, decision_comments = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.as_ref())
    .bind(auth.user_id)
    .bind(Utc::now())
    .bind(&comments)
    .bind(application.id)
    .bind(application.status.as_ref())
    .execute(&mut *tx)
    .await
    .map_err(WorkflowError::from)?;

    if updated.rows_affected() == 0 {
        return Err(WorkflowError::Conflict.into());
    }

    if next == LeaveStatus::Approved {
        // Insufficient balance here is a consistency bug: submission already
        // checked it. The ledger error rolls the transaction back.
        ledger::deduct(
            &mut tx,
            application.applicant_id,
            application.leave_type_id,
            application.start_date.year(),
            i64::from(application.days_requested),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                application_id = application.id,
                applicant_id = application.applicant_id,
                error = %e,
                "Balance deduction failed at final approval"
            );
            e
        })?;
    }

    let (title, message) = match decision {
        Decision::Approve => (
            "Leave Application Approved",
            format!("Your {} application has been approved", application.leave_type_name),
        ),
        Decision::Reject => (
            "Leave Application Rejected",
            match &comments {
                Some(c) if !c.trim().is_empty() => format!(
                    "Your {} application has been rejected. Reason: {}",
                    application.leave_type_name, c
                ),
                _ => format!(
                    "Your {} application has been rejected",
                    application.leave_type_name
                ),
            },
        ),
    };
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, title, message, notification_type, leave_application_id)
        VALUES (?, ?, ?, 'leave_decision', ?)
        "#,
    )
    .bind(application.applicant_id)
    .bind(title)
    .bind(&message)
    .bind(application.id)
    .execute(&mut *tx)
    .await
    .map_err(WorkflowError::from)?;

    tx.commit().await.map_err(WorkflowError::from)?;

    let application = fetch_application(pool, application_id).await?;
    let message = match (decision, application.status) {
        (Decision::Approve, LeaveStatus::PendingPrincipalSecretaryApproval) => {
            "Application approved, pending principal secretary approval"
        }
        (Decision::Approve, _) => "Application approved",
        (Decision::Reject, _) => "Application rejected",
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "application": application,
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{application_id}/approve",
    params(("application_id" = u64, Path, description = "Application ID")),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Application advanced", body = LeaveApplicationRow),
        (status = 400, description = "Application already processed or not in a valid state"),
        (status = 403, description = "Actor not authorized for this stage"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Concurrent decision lost the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_application(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<DecisionBody>>,
) -> actix_web::Result<impl Responder> {
    let comments = body.and_then(|b| b.into_inner().comments);
    decide(&auth, pool.get_ref(), path.into_inner(), Decision::Approve, comments).await
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{application_id}/reject",
    params(("application_id" = u64, Path, description = "Application ID")),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Application rejected", body = LeaveApplicationRow),
        (status = 400, description = "Application already processed or not in a valid state"),
        (status = 403, description = "Actor not authorized for this stage"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Concurrent decision lost the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_application(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<DecisionBody>>,
) -> actix_web::Result<impl Responder> {
    let comments = body.and_then(|b| b.into_inner().comments);
    decide(&auth, pool.get_ref(), path.into_inner(), Decision::Reject, comments).await
}

/* =========================
Delegate availability
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    #[schema(example = 99)]
    pub user_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Whether the user has no overlapping pending/approved leave"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Inverted date range")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delegate_availability(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AvailabilityQuery>,
) -> actix_web::Result<impl Responder> {
    if query.end_date < query.start_date {
        return Err(WorkflowError::Validation(vec![crate::error::FieldError::new(
            "end_date",
            "end date cannot be before start date",
        )])
        .into());
    }

    let overlapping = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM leave_applications
        WHERE applicant_id = ?
        AND status IN ('pending_hod_approval', 'pending_principal_secretary_approval', 'approved')
        AND start_date <= ? AND end_date >= ?
        "#,
    )
    .bind(query.user_id)
    .bind(query.end_date)
    .bind(query.start_date)
    .fetch_one(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": query.user_id,
        "available": overlapping == 0,
    })))
}
