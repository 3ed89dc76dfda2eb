//! Request extractors shared by the route modules.

use axum::{Json, extract::FromRequest};

use crate::error::AppError;

/// JSON body whose parse failures come back as `400 {message}` instead of axum's plain-text
/// rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
