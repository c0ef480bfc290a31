use crate::{
    api::{attendance, planning, presence_sheet},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfigBuilder, PeerIpKeyExtractor,
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

    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    // Sheet generation reads a month of rows and writes a workbook, so it
    // gets a much tighter budget than plain CRUD.
    let generate_limiter = Arc::new(build_limiter(config.rate_generate_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::check_in))
                            .route(web::put().to(attendance::check_out))
                            .route(web::get().to(attendance::attendance_list)),
                    )
                    // /attendance/absence
                    .service(
                        web::resource("/absence")
                            .route(web::post().to(attendance::declare_absence)),
                    )
                    // /attendance/absence/{id}/approve
                    .service(
                        web::resource("/absence/{id}/approve")
                            .route(web::put().to(attendance::approve_absence)),
                    )
                    // /attendance/absence/{id}/reject
                    .service(
                        web::resource("/absence/{id}/reject")
                            .route(web::put().to(attendance::reject_absence)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::put().to(attendance::edit_attendance)),
                    ),
            )
            .service(
                web::scope("/planning")
                    // /planning
                    .service(
                        web::resource("")
                            .route(web::post().to(planning::create_planning))
                            .route(web::get().to(planning::planning_list)),
                    )
                    // /planning/bulk
                    .service(web::resource("/bulk").route(web::post().to(planning::bulk_import)))
                    // /planning/relink
                    .service(web::resource("/relink").route(web::post().to(planning::relink)))
                    // /planning/batch/{batch_id}
                    .service(
                        web::resource("/batch/{batch_id}")
                            .route(web::delete().to(planning::delete_batch)),
                    )
                    // /planning/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(planning::update_planning))
                            .route(web::delete().to(planning::delete_planning)),
                    ),
            )
            .service(
                web::scope("/presence-sheets")
                    // /presence-sheets
                    .service(web::resource("").route(web::get().to(presence_sheet::sheet_list)))
                    // /presence-sheets/me
                    .service(
                        web::resource("/me")
                            .wrap(generate_limiter.clone())
                            .route(web::get().to(presence_sheet::my_sheet)),
                    )
                    // /presence-sheets/bulk
                    .service(
                        web::resource("/bulk")
                            .wrap(generate_limiter.clone())
                            .route(web::post().to(presence_sheet::bulk_generate)),
                    )
                    // /presence-sheets/{employee_id}/generate
                    .service(
                        web::resource("/{employee_id}/generate")
                            .wrap(generate_limiter.clone())
                            .route(web::post().to(presence_sheet::generate)),
                    )
                    // /presence-sheets/{record_id}/download
                    .service(
                        web::resource("/{record_id}/download")
                            .route(web::get().to(presence_sheet::download)),
                    ),
            ),
    );
}
