pub mod auth_handlers;
pub mod seed_handlers;
pub mod spot_handlers;

use actix_web::web;

/// Full route table, shared between `main` and the integration tests so both
/// mount exactly the same surface.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(spot_handlers::list_spots) // GET  /api/spots
            .service(spot_handlers::create_spot) // POST /api/spots
            .service(seed_handlers::seed_spots), // POST /api/seed-spots
    )
    .service(
        web::scope("/auth")
            .service(auth_handlers::oauth_login) // GET  /auth/login
            .service(auth_handlers::oauth_callback) // GET  /auth/callback
            .service(auth_handlers::logout), // POST /auth/logout
    );
}
