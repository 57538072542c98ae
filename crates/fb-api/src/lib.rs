//! # fb-api
//!
//! The web routing and orchestration layer for Flatboard.

pub mod guard;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use handlers::AppState;

/// Configures the routes for the forum.
///
/// # Developer Note
/// Routes sit in an empty scope; a deployment under a sub-path (e.g. /forum/)
/// only changes the scope prefix here. Templates link with absolute paths,
/// so they would need the same prefix.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // The thread list
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(handlers::health))
            // The new-thread form and its target
            .route("/new", web::get().to(handlers::new_thread_form))
            .route("/threads", web::post().to(handlers::create_thread))
            // The thread view (padded or unpadded id) and its reply target
            .route("/threads/{id}", web::get().to(handlers::view_thread))
            .route("/threads/{id}/replies", web::post().to(handlers::post_reply)),
    );
}
