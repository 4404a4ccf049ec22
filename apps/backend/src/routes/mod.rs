use actix_web::web;

pub mod health;
pub mod rooms;

/// Register every application route.
///
/// `main.rs` wraps these with the tracing and CORS middleware; tests mount
/// them bare so endpoint behavior can be exercised directly.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check routes: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Room routes: /api/rooms/**
    cfg.service(web::scope("/api/rooms").configure(rooms::configure_routes));
}
