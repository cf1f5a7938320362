use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::WorkflowError;
use crate::model::department::Department;
use crate::model::role::Role;

const DEPARTMENT_SELECT: &str =
    "SELECT id, name, description, hod_id, created_at FROM departments";

async fn fetch_department(pool: &MySqlPool, id: u64) -> Result<Department, WorkflowError> {
    let sql = format!("{DEPARTMENT_SELECT} WHERE id = ?");
    sqlx::query_as::<_, Department>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(WorkflowError::NotFound("department"))
}

/// The hod reference invariant: it must point at a user with role `hod`.
async fn check_hod_eligible(pool: &MySqlPool, hod_id: u64) -> Result<(), WorkflowError> {
    let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
        .bind(hod_id)
        .fetch_optional(pool)
        .await?;

    match role {
        None => Err(WorkflowError::NotFound("user")),
        Some(Role::Hod) => Ok(()),
        Some(_) => Err(WorkflowError::UnauthorizedAction(
            "user is not eligible to head a department",
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("{DEPARTMENT_SELECT} ORDER BY name");
    let departments = sqlx::query_as::<_, Department>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "departments": departments })))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let department = fetch_department(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Finance")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 20, nullable = true)]
    pub hod_id: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "Principal secretary only"),
        (status = 409, description = "Department name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_principal_secretary()
        .map_err(actix_web::Error::from)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Department name is required"
        })));
    }

    if let Some(hod_id) = payload.hod_id {
        check_hod_eligible(pool.get_ref(), hod_id).await?;
    }

    let result = sqlx::query(
        "INSERT INTO departments (name, description, hod_id) VALUES (?, ?, ?)",
    )
    .bind(name)
    .bind(&payload.description)
    .bind(payload.hod_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            let department = fetch_department(pool.get_ref(), res.last_insert_id()).await?;
            Ok(HttpResponse::Created().json(json!({
                "message": "Department created successfully",
                "department": department,
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Department already exists"
                    })));
                }
            }
            error!(error = %e, "Failed to create department");
            Err(WorkflowError::from(e).into())
        }
    }
}

// Distinguishes an absent `hod_id` (keep current) from an explicit null
// (leave the department headless).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Set to null to leave the department headless
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u64>)]
    pub hod_id: Option<Option<u64>>,
}

#[utoipa::path(
    put,
    path = "/api/v1/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 403, description = "Principal secretary only"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_principal_secretary()
        .map_err(actix_web::Error::from)?;

    let department_id = path.into_inner();
    let current = fetch_department(pool.get_ref(), department_id).await?;

    let name = match &payload.name {
        Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => current.name,
    };
    let description = payload
        .description
        .clone()
        .or(current.description);
    let hod_id = match payload.hod_id {
        Some(hod_id) => hod_id,
        None => current.hod_id,
    };

    if let Some(hod_id) = hod_id {
        check_hod_eligible(pool.get_ref(), hod_id).await?;
    }

    let result = sqlx::query(
        "UPDATE departments SET name = ?, description = ?, hod_id = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&description)
    .bind(hod_id)
    .bind(department_id)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code() == Some("23000".into()) {
                return Ok(HttpResponse::Conflict().json(json!({
                    "error": "Department name already exists"
                })));
            }
        }
        error!(error = %e, department_id, "Failed to update department");
        return Err(WorkflowError::from(e).into());
    }

    let department = fetch_department(pool.get_ref(), department_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Department updated successfully",
        "department": department,
    })))
}

/// Deleting a department detaches its members; it never deletes users.
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted, members detached"),
        (status = 403, description = "Principal secretary only"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_principal_secretary()
        .map_err(actix_web::Error::from)?;

    let department_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(WorkflowError::from)?;

    sqlx::query("UPDATE users SET department_id = NULL WHERE department_id = ?")
        .bind(department_id)
        .execute(&mut *tx)
        .await
        .map_err(WorkflowError::from)?;

    let deleted = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department_id)
        .execute(&mut *tx)
        .await
        .map_err(WorkflowError::from)?;

    if deleted.rows_affected() == 0 {
        return Err(WorkflowError::NotFound("department").into());
    }

    tx.commit().await.map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted successfully"
    })))
}
