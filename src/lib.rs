//! Library crate for owl-speak-back, exposing modules for binaries and integration tests.

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
/// Storage layer: entities, errors and the progress repository.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
pub mod speech;
/// Shared application state and hosted sessions.
pub mod state;
