use crate::{
    api::{dashboard, department, leave, notification, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/signup")
                    .wrap(signup_limiter.clone())
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/role-hint")
                    .wrap(signup_limiter.clone())
                    .route(web::get().to(handlers::role_hint)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave/types
                    .service(web::resource("/types").route(web::get().to(leave::leave_types)))
                    // /leave/balances
                    .service(
                        web::resource("/balances").route(web::get().to(leave::leave_balances)),
                    )
                    // /leave/apply
                    .service(web::resource("/apply").route(web::post().to(leave::apply_leave)))
                    // /leave/applications
                    .service(
                        web::resource("/applications")
                            .route(web::get().to(leave::my_applications)),
                    )
                    // /leave/pending
                    .service(
                        web::resource("/pending")
                            .route(web::get().to(leave::pending_applications)),
                    )
                    // /leave/availability
                    .service(
                        web::resource("/availability")
                            .route(web::get().to(leave::delegate_availability)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave::approve_application)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave::reject_application)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_application))),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::get().to(user::list_users)))
                    .service(
                        web::resource("/{id}/role").route(web::put().to(user::set_role)),
                    )
                    .service(
                        web::resource("/{id}/department")
                            .route(web::put().to(user::set_department)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(user::get_user))),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(
                        web::resource("/stats").route(web::get().to(dashboard::dashboard_stats)),
                    )
                    .service(
                        web::resource("/calendar")
                            .route(web::get().to(dashboard::dashboard_calendar)),
                    )
                    .service(
                        web::resource("/countdown")
                            .route(web::get().to(dashboard::leave_countdown)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notification::list_notifications)),
                    )
                    .service(
                        web::resource("/{id}/read")
                            .route(web::put().to(notification::mark_notification_read)),
                    ),
            ),
    );
}

// SUBMIT (applicant)
//  └─ status: pending_hod_approval        (staff with a department)
//     status: pending_principal_secretary_approval  (hod / ps / no department)
//
// REVIEW
//  ├─ HOD approve   → pending_principal_secretary_approval
//  ├─ HOD reject    → rejected (terminal)
//  ├─ PS approve    → approved (terminal, balance deducted)
//  └─ PS reject     → rejected (terminal)
