use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Owl Speak Back.
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::catalog::list_games,
        crate::routes::catalog::get_game,
        crate::routes::progress::get_user_progress,
        crate::routes::progress::update_user_progress,
        crate::routes::progress::get_game_progress,
        crate::routes::progress::list_game_progress,
        crate::routes::progress::record_game_completion,
        crate::routes::speech::record_attempt,
        crate::routes::speech::list_attempts,
        crate::routes::sessions::start_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::submit_attempt,
        crate::routes::sessions::skip_phrase,
        crate::routes::sessions::end_session,
        crate::routes::sessions::discard_session,
    ),
    components(
        schemas(
            crate::catalog::Language,
            crate::dto::health::HealthResponse,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::LoginResponse,
            crate::dto::user::CreateUserRequest,
            crate::dto::user::UserResponse,
            crate::dto::catalog::GameResponse,
            crate::dto::catalog::PhraseResponse,
            crate::dto::progress::UserProgressResponse,
            crate::dto::progress::UpdateUserProgressRequest,
            crate::dto::progress::GameProgressResponse,
            crate::dto::progress::GameCompletionRequest,
            crate::dto::speech::CreateSpeechAttemptRequest,
            crate::dto::speech::SpeechAttemptResponse,
            crate::dto::session::StartSessionRequest,
            crate::dto::session::SubmitAttemptRequest,
            crate::dto::session::SessionResponse,
            crate::dto::session::SessionPhraseResponse,
            crate::dto::session::CompletionSummaryResponse,
            crate::dto::session::VerdictResponse,
            crate::dto::session::AttemptResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and current user"),
        (name = "users", description = "Learner accounts"),
        (name = "catalog", description = "Games and their phrases"),
        (name = "progress", description = "User and per-game progress aggregates"),
        (name = "speech", description = "Speech-attempt audit log"),
        (name = "sessions", description = "Server-hosted play sessions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_public_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/auth/login",
            "/api/users/me",
            "/api/progress",
            "/api/game-progress/all",
            "/api/speech-attempts/{game_id}",
            "/api/sessions/{id}/attempts",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
