/// Login and caller resolution.
pub mod auth_service;
/// Read-only access to the phrase catalog.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// User and per-game progress aggregates.
pub mod progress_service;
/// Reporting of hosted sessions to the progress store.
pub mod session_bridge;
/// Hosted play sessions driven over REST.
pub mod session_service;
/// Background clock for hosted sessions.
pub mod session_ticker;
/// Speech-attempt audit log.
pub mod speech_service;
/// Learner accounts.
pub mod user_service;
