use axum::Router;

use crate::state::SharedState;

/// Login and current-user routes.
pub mod auth;
/// Catalog routes.
pub mod catalog;
/// Swagger UI and OpenAPI document.
pub mod docs;
pub mod extract;
/// Health route.
pub mod health;
/// Progress routes.
pub mod progress;
/// Hosted play-session routes.
pub mod sessions;
/// Speech-attempt log routes.
pub mod speech;
/// Sign-up and user profile routes.
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router(state.clone()))
        .merge(users::router())
        .merge(catalog::router())
        .merge(progress::router(state.clone()))
        .merge(speech::router(state.clone()))
        .merge(sessions::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
