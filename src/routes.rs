use crate::{
    api::{attendance, dashboard, fun, leave, notification, report, scanner, settings, user},
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
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let scanner_limiter = Arc::new(build_limiter(config.rate_scanner_per_min));
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

    // Keyed by x-api-key, not a session, so it stays outside the auth scope.
    cfg.service(
        web::resource("/scanner/scan")
            .wrap(scanner_limiter)
            .route(web::post().to(scanner::handle_scan)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/auth")
                    .service(web::resource("/me").route(web::get().to(handlers::me))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/status").route(web::get().to(attendance::get_status)),
                    )
                    .service(
                        web::resource("/action").route(web::post().to(attendance::clock_action)),
                    )
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(web::resource("/hours").route(web::get().to(attendance::hour_stats))),
            )
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::create_leave)),
                    )
                    .service(web::resource("/admin").route(web::post().to(leave::admin_create_leave)))
                    .service(
                        web::resource("/my-requests").route(web::get().to(leave::my_requests)),
                    )
                    .service(web::resource("/stats").route(web::get().to(leave::leave_stats)))
                    .service(web::resource("/balance").route(web::get().to(leave::leave_balance)))
                    .service(
                        web::resource("/balance/{user_id}")
                            .route(web::get().to(leave::employee_leave_balance)),
                    )
                    // /leaves/{id}/status
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(leave::update_leave_status)),
                    ),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notification::list_notifications)),
                    )
                    .service(
                        web::resource("/read-all")
                            .route(web::put().to(notification::mark_all_as_read)),
                    )
                    .service(
                        web::resource("/{id}/read").route(web::put().to(notification::mark_as_read)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(web::resource("/bulk").route(web::post().to(user::bulk_create_users)))
                    .service(
                        web::resource("/profile").route(web::put().to(user::update_profile)),
                    )
                    .service(
                        web::resource("/profile/change-password")
                            .route(web::put().to(user::change_password)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::put().to(settings::update_settings)),
            )
            .service(
                web::resource("/company-settings")
                    .route(web::get().to(settings::get_company_settings))
                    .route(web::put().to(settings::update_company_settings)),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/admin").route(web::get().to(dashboard::admin_dashboard)))
                    .service(
                        web::resource("/super-admin")
                            .route(web::get().to(dashboard::super_admin_dashboard)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/stats").route(web::get().to(report::report_stats)))
                    .service(
                        web::resource("/attendance-chart")
                            .route(web::get().to(report::attendance_chart)),
                    )
                    .service(
                        web::resource("/attendance-records")
                            .route(web::get().to(report::attendance_records)),
                    ),
            )
            .service(
                web::scope("/fun")
                    .service(web::resource("/streak").route(web::get().to(fun::attendance_streak))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
