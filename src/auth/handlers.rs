use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::auth::{
    jwt::{TokenIdentity, generate_access_token, generate_refresh_token, verify_token},
    password::{hash_password, verify_password},
};
use crate::config::Config;
use crate::error::{FieldError, WorkflowError};
use crate::model::role::Role;
use crate::models::{LoginReq, SignupReq, TokenType, UserCredentials};
use crate::utils::employee_number_cache;
use crate::utils::employee_number_filter;

/// true  => employee number AVAILABLE
/// false => employee number TAKEN
pub async fn is_employee_number_available(employee_number: &str, pool: &MySqlPool) -> bool {
    let employee_number = employee_number.trim();

    // 1. Cuckoo filter: a definite "not seen" means available.
    if !employee_number_filter::might_exist(employee_number) {
        return true;
    }

    // 2. Moka cache: fast positive.
    if employee_number_cache::is_taken(employee_number).await {
        return false;
    }

    // 3. Database fallback.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE employee_number = ? LIMIT 1)",
    )
    .bind(employee_number)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

fn validate_signup(payload: &SignupReq) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if Role::from_employee_number(payload.employee_number.trim()).is_none() {
        errors.push(FieldError::new(
            "employee_number",
            "employee number must be 4, 5 or 6 digits",
        ));
    }

    let email = payload.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        errors.push(FieldError::new("email", "invalid email format"));
    }

    let phone = payload.phone_number.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new("phone_number", "invalid phone number"));
    }

    if payload.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "first name is required"));
    }
    if payload.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "last name is required"));
    }
    if payload.password.len() < 8 {
        errors.push(FieldError::new(
            "password",
            "password must be at least 8 characters",
        ));
    }

    errors
}

/// Self-service registration. Always persists role `staff`; elevated roles
/// are granted separately by a principal secretary.
pub async fn signup(
    payload: web::Json<SignupReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let errors = validate_signup(&payload);
    if !errors.is_empty() {
        return Err(WorkflowError::Validation(errors).into());
    }

    let employee_number = payload.employee_number.trim();

    if !is_employee_number_available(employee_number, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "error": "Employee number already registered"
        })));
    }

    if let Some(department_id) = payload.department_id {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)")
                .bind(department_id)
                .fetch_one(pool.get_ref())
                .await
                .map_err(WorkflowError::from)?;
        if !exists {
            return Err(WorkflowError::Validation(vec![FieldError::new(
                "department_id",
                "unknown department",
            )])
            .into());
        }
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (employee_number, email, phone_number, first_name, last_name,
             password_hash, role, department_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_number)
    .bind(payload.email.trim())
    .bind(payload.phone_number.trim())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(&hashed)
    .bind(Role::Staff.as_ref())
    .bind(payload.department_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            employee_number_filter::insert(employee_number);
            employee_number_cache::mark_taken(employee_number).await;

            Ok(HttpResponse::Created().json(json!({
                "message": "User registered successfully",
                // Advisory only; the persisted role is staff until changed
                // by a principal secretary.
                "role_hint": Role::from_employee_number(employee_number),
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Employee number or email already registered"
                    })));
                }
            }
            error!(error = %e, "Failed to register user");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}

#[derive(Deserialize)]
pub struct RoleHintQuery {
    pub employee_number: String,
}

/// Advisory classifier for the signup form: maps employee-number length to a
/// role tier. Never consulted for access control.
pub async fn role_hint(query: web::Query<RoleHintQuery>) -> impl Responder {
    match Role::from_employee_number(query.employee_number.trim()) {
        Some(role) => HttpResponse::Ok().json(json!({
            "employee_number": query.employee_number.trim(),
            "role": role,
        })),
        None => HttpResponse::UnprocessableEntity().json(json!({
            "error": "Employee number cannot be classified"
        })),
    }
}

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, payload),
    fields(employee_number = %payload.employee_number)
)]
pub async fn login(
    payload: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if payload.employee_number.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty employee number or password");
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Employee number and password are required"
        })));
    }

    debug!("Fetching user from database");

    let user = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, employee_number, password_hash, role, department_id,
               is_active, is_locked, failed_login_attempts
        FROM users
        WHERE employee_number = ?
        "#,
    )
    .bind(payload.employee_number.trim())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    let user = match user {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Ok(HttpResponse::Unauthorized().json(json!({
                "error": "Invalid credentials"
            })));
        }
    };

    if user.is_locked {
        info!(user_id = user.id, "Login attempt on locked account");
        return Ok(HttpResponse::Locked().json(json!({
            "error": "Account locked, contact the administrator"
        })));
    }

    if !user.is_active {
        return Ok(HttpResponse::Forbidden().json(json!({
            "error": "Account is not active"
        })));
    }

    if verify_password(&payload.password, &user.password_hash).is_err() {
        let attempts = user.failed_login_attempts + 1;
        let lock_now = attempts >= config.max_failed_logins;

        sqlx::query("UPDATE users SET failed_login_attempts = ?, is_locked = ? WHERE id = ?")
            .bind(attempts)
            .bind(lock_now)
            .bind(user.id)
            .execute(pool.get_ref())
            .await
            .map_err(WorkflowError::from)?;

        if lock_now {
            info!(user_id = user.id, "Account locked after repeated failures");
            return Ok(HttpResponse::Locked().json(json!({
                "error": "Account locked, contact the administrator"
            })));
        }

        info!(user_id = user.id, attempts, "Invalid credentials: password mismatch");
        return Ok(HttpResponse::Unauthorized().json(json!({
            "error": format!(
                "Invalid credentials. {} attempts remaining.",
                config.max_failed_logins - attempts
            )
        })));
    }

    debug!("Password verified");

    let identity = TokenIdentity {
        user_id: user.id,
        employee_number: user.employee_number.clone(),
        role: user.role,
        department_id: user.department_id,
    };

    let access_token = generate_access_token(&identity, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(&identity, &config.jwt_secret, config.refresh_token_ttl).map_err(
            |e| {
                error!(error = %e, "Failed to sign refresh token");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            },
        )?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    // Reset the failure counter; losing this update is not fatal.
    if let Err(e) = sqlx::query(
        "UPDATE users SET failed_login_attempts = 0, last_login_at = NOW() WHERE id = ?",
    )
    .bind(user.id)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to reset login failure counter");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    }))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::Unauthorized().json(json!({"error": "No token"})));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return Ok(HttpResponse::Unauthorized().finish()),
    };

    if claims.token_type != TokenType::Refresh {
        return Ok(HttpResponse::Unauthorized().finish());
    }

    let record = sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    let (record_id, user_id, revoked) = match record {
        Some(r) => r,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };
    if revoked {
        return Ok(HttpResponse::Unauthorized().finish());
    }

    // Rotate: revoke the presented token before issuing a replacement.
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
        .map_err(WorkflowError::from)?;

    let role = match Role::from_id(claims.role) {
        Some(r) => r,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };

    let identity = TokenIdentity {
        user_id: claims.user_id,
        employee_number: claims.sub.clone(),
        role,
        department_id: claims.department_id,
    };

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&identity, &config.jwt_secret, config.refresh_token_ttl).map_err(
            |e| {
                error!(error = %e, "Failed to sign refresh token");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            },
        )?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    .map_err(WorkflowError::from)?;

    let access_token = generate_access_token(&identity, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    })))
}

pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer_token(&req) {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // Only refresh tokens can be revoked.
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // Idempotent: success even if the token was never stored.
    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}
