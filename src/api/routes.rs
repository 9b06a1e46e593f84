// API route configuration

use actix_web::web;

use crate::api::{auth, handlers};
use crate::auth::TokenKeys;

pub fn configure_routes(cfg: &mut web::ServiceConfig, keys: &TokenKeys) {
    cfg
        // Health check (no auth required)
        .route("/health", web::get().to(handlers::health_check))
        // Search is anonymous
        .route("/search/{game}", web::get().to(handlers::search_game))
        // OAuth flow + session-free auth probe
        .route("/auth", web::get().to(handlers::auth_status))
        .route("/auth/google", web::get().to(handlers::login_google))
        .route(
            "/auth/google/callback",
            web::get().to(handlers::google_callback),
        )
        .route("/logout", web::get().to(handlers::logout))
        // Saved list requires a valid token cookie
        .service(
            web::scope("/list")
                .wrap(auth::Auth::new(keys.clone()))
                .route("", web::get().to(handlers::list_games))
                .route(
                    "/{game_id}/{index}",
                    web::put().to(handlers::list_add),
                )
                .route(
                    "/{game_id}/{index}",
                    web::delete().to(handlers::list_remove),
                ),
        );
}
