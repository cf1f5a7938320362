//! Read-side composition: counts, countdowns and calendars computed from the
//! applications and balances on every query. No state of its own.

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::leave::{APPLICATION_SELECT, LeaveApplicationRow, balances_for};
use crate::auth::auth::AuthUser;
use crate::error::WorkflowError;
use crate::model::leave_application::LeaveApplication;
use crate::model::role::Role;

const OWN_APPLICATION_SELECT: &str = r#"
    SELECT id, applicant_id, leave_type_id, subject, start_date, end_date,
           days_requested, last_leave_from, last_leave_to, contact_info,
           salary_payment_preference, salary_payment_address, permission_note_country,
           person_handling_duties_id, status, approved_by, decided_at,
           decision_comments, created_at
    FROM leave_applications
"#;

async fn current_leave(
    pool: &MySqlPool,
    user_id: u64,
    today: NaiveDate,
) -> Result<Option<LeaveApplication>, WorkflowError> {
    let sql = format!(
        "{OWN_APPLICATION_SELECT} WHERE applicant_id = ? AND status = 'approved' AND start_date <= ? AND end_date >= ? LIMIT 1"
    );
    let leave = sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(user_id)
        .bind(today)
        .bind(today)
        .fetch_optional(pool)
        .await?;
    Ok(leave.filter(|l| l.is_current(today)))
}

async fn upcoming_leaves(
    pool: &MySqlPool,
    user_id: u64,
    today: NaiveDate,
    limit: u32,
) -> Result<Vec<LeaveApplication>, WorkflowError> {
    let sql = format!(
        "{OWN_APPLICATION_SELECT} WHERE applicant_id = ? AND status = 'approved' AND start_date > ? ORDER BY start_date LIMIT ?"
    );
    let leaves = sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(user_id)
        .bind(today)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(leaves)
}

/* =========================
Stats
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics for the caller"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let now = Utc::now();
    let today = now.date_naive();
    let current_year = today.year();

    let balances = balances_for(pool.get_ref(), auth.user_id, current_year).await?;

    // Count by raw status, then fold the two review stages into "pending".
    let status_rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM leave_applications
        WHERE applicant_id = ? AND YEAR(start_date) = ?
        GROUP BY status
        "#,
    )
    .bind(auth.user_id)
    .bind(current_year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    let mut pending = 0i64;
    let mut approved = 0i64;
    let mut rejected = 0i64;
    for (status, count) in &status_rows {
        match status.as_str() {
            "pending_hod_approval" | "pending_principal_secretary_approval" => pending += count,
            "approved" => approved += count,
            "rejected" => rejected += count,
            _ => {}
        }
    }
    let applications_this_year: i64 = status_rows.iter().map(|(_, c)| c).sum();

    let current = current_leave(pool.get_ref(), auth.user_id, today).await?;
    let upcoming = upcoming_leaves(pool.get_ref(), auth.user_id, today, 5).await?;

    let current_leave_json = match &current {
        Some(leave) => json!({
            "is_on_leave": true,
            "application": leave,
            "days_remaining": (leave.end_date - today).num_days(),
        }),
        None => json!({ "is_on_leave": false }),
    };

    let next_leave_countdown: Value = match upcoming.first() {
        Some(next) => json!({
            "application": next,
            "days_until": (next.start_date - today).num_days(),
        }),
        None => Value::Null,
    };

    let unread_notifications = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
    )
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    let mut stats = json!({
        "current_year": current_year,
        "today": today,
        "leave_balances": balances,
        "applications_this_year": applications_this_year,
        "applications_by_status": {
            "pending": pending,
            "approved": approved,
            "rejected": rejected,
        },
        "current_leave": current_leave_json,
        "upcoming_leaves": upcoming,
        "next_leave_countdown": next_leave_countdown,
        "unread_notifications": unread_notifications,
    });

    if auth.role.is_reviewer() {
        let pending_to_review = match auth.role {
            Role::Hod => sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM leave_applications a
                JOIN users u ON u.id = a.applicant_id
                WHERE a.status = 'pending_hod_approval' AND u.department_id = ?
                "#,
            )
            .bind(auth.department_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(WorkflowError::from)?,
            _ => sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM leave_applications WHERE status = 'pending_principal_secretary_approval'",
            )
            .fetch_one(pool.get_ref())
            .await
            .map_err(WorkflowError::from)?,
        };
        stats["pending_to_review"] = json!(pending_to_review);
    }

    if auth.role == Role::PrincipalSecretary {
        let role_counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT role, COUNT(*) FROM users WHERE is_active = TRUE GROUP BY role",
        )
        .fetch_all(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

        let count_of = |name: &str| {
            role_counts
                .iter()
                .find(|(role, _)| role == name)
                .map(|(_, c)| *c)
                .unwrap_or(0)
        };

        let on_leave_today = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leave_applications
            WHERE status = 'approved' AND start_date <= ? AND end_date >= ?
            "#,
        )
        .bind(today)
        .bind(today)
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

        let applications_this_month = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leave_applications
            WHERE YEAR(created_at) = ? AND MONTH(created_at) = ?
            "#,
        )
        .bind(today.year())
        .bind(today.month())
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

        stats["organization"] = json!({
            "total_staff": count_of("staff"),
            "total_hods": count_of("hod"),
            "total_principal_secretaries": count_of("principal_secretary"),
            "currently_on_leave": on_leave_today,
            "applications_this_month": applications_this_month,
        });
    }

    Ok(HttpResponse::Ok().json(stats))
}

/* =========================
Calendar
========================= */
#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = 3)]
    pub month: Option<u32>,
    /// `personal` or `team`
    #[schema(example = "personal")]
    pub view: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Approved leave events overlapping the month"),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard_calendar(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let window_start = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Invalid month"
            })));
        }
    };
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid calendar date");
    let window_end = next_month - Duration::days(1);

    let can_view_team = auth.role.is_reviewer();
    let view = match query.view.as_deref() {
        Some("team") if can_view_team => "team",
        _ => "personal",
    };

    // Approved applications whose range overlaps the month window.
    let mut where_sql =
        String::from(" WHERE a.status = 'approved' AND a.start_date <= ? AND a.end_date >= ?");
    match (view, auth.role) {
        ("team", Role::Hod) => where_sql.push_str(" AND u.department_id = ?"),
        ("team", _) => {}
        _ => where_sql.push_str(" AND a.applicant_id = ?"),
    }

    let sql = format!("{APPLICATION_SELECT} {} ORDER BY a.start_date", where_sql);
    let mut q = sqlx::query_as::<_, LeaveApplicationRow>(&sql)
        .bind(window_end)
        .bind(window_start);
    q = match (view, auth.role) {
        ("team", Role::Hod) => q.bind(auth.department_id),
        ("team", _) => q,
        _ => q.bind(auth.user_id),
    };

    let leaves = q
        .fetch_all(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    let events: Vec<Value> = leaves
        .iter()
        .map(|leave| {
            json!({
                "id": leave.id,
                "title": format!("{} - {}", leave.applicant_name, leave.leave_type_name),
                "applicant_name": leave.applicant_name,
                "leave_type": leave.leave_type_name,
                // Clamped to the requested month window.
                "start_date": leave.start_date.max(window_start),
                "end_date": leave.end_date.min(window_end),
                "full_start_date": leave.start_date,
                "full_end_date": leave.end_date,
                "days_requested": leave.days_requested,
                "is_current_user": leave.applicant_id == auth.user_id,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "year": year,
        "month": month,
        "view": view,
        "can_view_team": can_view_team,
        "total_events": events.len(),
        "events": events,
    })))
}

/* =========================
Countdown
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/countdown",
    responses(
        (status = 200, description = "Nearest leave boundary for the caller"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn leave_countdown(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let today = Utc::now().date_naive();

    if let Some(leave) = current_leave(pool.get_ref(), auth.user_id, today).await? {
        let total_days = (leave.end_date - leave.start_date).num_days().max(1);
        let days_remaining = (leave.end_date - today).num_days();
        return Ok(HttpResponse::Ok().json(json!({
            "countdown": {
                "type": "current_leave",
                "status": "on_leave",
                "days_remaining": days_remaining,
                "end_date": leave.end_date,
                "progress_percentage": (total_days - days_remaining) * 100 / total_days,
                "leave": leave,
            }
        })));
    }

    let upcoming = upcoming_leaves(pool.get_ref(), auth.user_id, today, 1).await?;
    if let Some(next) = upcoming.into_iter().next().filter(|l| l.is_upcoming(today)) {
        let days_until = (next.start_date - today).num_days();
        return Ok(HttpResponse::Ok().json(json!({
            "countdown": {
                "type": "upcoming_leave",
                "status": "waiting",
                "days_until": days_until,
                "start_date": next.start_date,
                "end_date": next.end_date,
                "leave": next,
            }
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "countdown": null })))
}
