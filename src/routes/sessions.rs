use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{AttemptResponse, SessionResponse, StartSessionRequest, SubmitAttemptRequest},
    error::AppError,
    routes::{
        auth::{CurrentUser, user_or_demo},
        extract::AppJson,
    },
    services::session_service,
    state::SharedState,
};

/// Hosted play-session endpoints (bearer token or demo user).
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/api/sessions", post(start_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(discard_session),
        )
        .route("/api/sessions/{id}/attempts", post(submit_attempt))
        .route("/api/sessions/{id}/skip", post(skip_phrase))
        .route("/api/sessions/{id}/end", post(end_session))
        .route_layer(middleware::from_fn_with_state(state, user_or_demo))
}

/// Open a session at the first phrase of a game.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    params(("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")),
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    AppJson(payload): AppJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    payload.validate()?;
    let session = session_service::start_session(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Current snapshot of a session.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::get_session(&state, user_id, id).await?))
}

/// Submit an utterance for the phrase being presented.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/attempts",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    request_body = SubmitAttemptRequest,
    responses(
        (status = 200, description = "Attempt judged, or retryable feedback when evaluation failed", body = AttemptResponse),
        (status = 400, description = "Neither or both of transcript and audio"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No phrase is waiting for an answer")
    )
)]
pub async fn submit_attempt(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SubmitAttemptRequest>,
) -> Result<Json<AttemptResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::submit_attempt(&state, user_id, id, payload).await?,
    ))
}

/// Skip the phrase being presented.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/skip",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = SessionResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No phrase is being presented"),
        (status = 503, description = "Completion could not be reported; end the session to retry")
    )
)]
pub async fn skip_phrase(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::skip_phrase(&state, user_id, id).await?))
}

/// End the session now and report it.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/end",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses(
        (status = 200, description = "Completed session", body = SessionResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session already completed and reported"),
        (status = 503, description = "Completion could not be reported; retry")
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::end_session(&state, user_id, id).await?))
}

/// Forget a session without reporting it.
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = Uuid, Path, description = "Session identifier"),
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>`")
    ),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn discard_session(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::discard_session(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
