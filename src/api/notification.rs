use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::error::WorkflowError;
use crate::model::notification::Notification;

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Own notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, title, message, notification_type, is_read,
               leave_application_id, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "notifications": notifications })))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{notification_id}/read",
    params(("notification_id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_notification_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let notification_id = path.into_inner();

    // Scoped to the owner so one user cannot touch another's notifications.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM notifications WHERE id = ? AND user_id = ?)",
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    if !exists {
        return Err(WorkflowError::NotFound("notification").into());
    }

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Notification marked as read"
    })))
}
