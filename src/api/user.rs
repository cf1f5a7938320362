use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::WorkflowError;
use crate::model::role::Role;
use crate::model::user::{User, UserSummary};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub department_id: Option<u64>,
    /// Search by name or employee number
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Directory listing, used by the delegate and HOD pickers.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user directory", body = UserListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // Helper enum for typed SQLx binding
    enum FilterValue {
        U64(u64),
        Str(String),
    }

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = vec!["is_active = TRUE"];
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(role) = query.role {
        conditions.push("role = ?");
        bindings.push(FilterValue::Str(role.as_ref().to_owned()));
    }

    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(FilterValue::U64(department_id));
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR employee_number LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Str(s) => count_query.bind(s.clone()),
        };
    }
    let total = count_query
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    let data_sql = format!(
        r#"
        SELECT id, employee_number, first_name, last_name, email, role, department_id
        FROM users {}
        ORDER BY last_name, first_name
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, UserSummary>(&data_sql);
    for b in bindings {
        data_query = match b {
            FilterValue::U64(v) => data_query.bind(v),
            FilterValue::Str(s) => data_query.bind(s),
        };
    }

    let users = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page,
        total,
    }))
}

/// Full profile: self or a principal secretary only.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found"),
        (status = 403, description = "Not visible to this user"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    if auth.user_id != user_id {
        auth.require_principal_secretary()
            .map_err(actix_web::Error::from)?;
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, employee_number, email, phone_number, first_name, last_name,
               password_hash, role, department_id, is_active,
               failed_login_attempts, is_locked, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(WorkflowError::NotFound("user").into()),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetRoleReq {
    #[schema(example = "hod")]
    pub role: Role,
}

/// Role administration. Roles are never derived from employee numbers at
/// runtime; granting one is an explicit principal-secretary decision.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/role",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body = SetRoleReq,
    responses(
        (status = 200, description = "Role updated"),
        (status = 403, description = "Principal secretary only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn set_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SetRoleReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_principal_secretary()
        .map_err(actix_web::Error::from)?;

    let user_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;
    if !exists {
        return Err(WorkflowError::NotFound("user").into());
    }

    let mut tx = pool.begin().await.map_err(WorkflowError::from)?;

    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(payload.role.as_ref())
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(WorkflowError::from)?;

    // A department head reference must always point at a user with role hod.
    if payload.role != Role::Hod {
        sqlx::query("UPDATE departments SET hod_id = NULL WHERE hod_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(WorkflowError::from)?;
    }

    tx.commit().await.map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Role updated successfully"
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct SetDepartmentReq {
    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,
}

/// Move a user between departments (or detach them).
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/department",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body = SetDepartmentReq,
    responses(
        (status = 200, description = "Department updated"),
        (status = 403, description = "Principal secretary only"),
        (status = 404, description = "User or department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn set_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SetDepartmentReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_principal_secretary()
        .map_err(actix_web::Error::from)?;

    let user_id = path.into_inner();

    if let Some(department_id) = payload.department_id {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)")
                .bind(department_id)
                .fetch_one(pool.get_ref())
                .await
                .map_err(WorkflowError::from)?;
        if !exists {
            return Err(WorkflowError::NotFound("department").into());
        }
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;
    if !exists {
        return Err(WorkflowError::NotFound("user").into());
    }

    sqlx::query("UPDATE users SET department_id = ? WHERE id = ?")
        .bind(payload.department_id)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to update user department");
            WorkflowError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department updated successfully"
    })))
}
