use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::config::Config;
use crate::error::WorkflowError;
use crate::model::role::Role;
use crate::models::Claims;
use crate::workflow::machine::Actor;

pub struct AuthUser {
    pub user_id: u64,
    pub employee_number: String,
    pub role: Role,

    /// Present only if the user belongs to a department.
    pub department_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            employee_number: data.claims.sub,
            role,
            department_id: data.claims.department_id,
        }))
    }
}

impl AuthUser {
    pub fn require_principal_secretary(&self) -> Result<(), WorkflowError> {
        if self.role == Role::PrincipalSecretary {
            Ok(())
        } else {
            Err(WorkflowError::UnauthorizedAction(
                "principal secretary only",
            ))
        }
    }

    pub fn require_reviewer(&self) -> Result<(), WorkflowError> {
        if self.role.is_reviewer() {
            Ok(())
        } else {
            Err(WorkflowError::UnauthorizedAction(
                "reviewer role required",
            ))
        }
    }

    /// The state-machine view of this user.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
            department_id: self.department_id,
        }
    }
}
