use tracing::info;

use crate::{
    auth::password,
    catalog::Language,
    dao::models::NewUserEntity,
    dto::user::{CreateUserRequest, UserResponse},
    error::ServiceError,
    state::SharedState,
};

/// Register a learner. Usernames are unique regardless of case.
pub async fn create_user(
    state: &SharedState,
    request: CreateUserRequest,
) -> Result<UserResponse, ServiceError> {
    let CreateUserRequest {
        username,
        password: plain_password,
        name,
        age,
        language,
        parent_email,
    } = request;

    let language = language
        .parse::<Language>()
        .map_err(ServiceError::InvalidInput)?;
    let salt = password::new_salt();

    let user = state
        .store()
        .create_user(NewUserEntity {
            username: username.trim().to_string(),
            password_digest: password::digest(&plain_password, &salt),
            password_salt: salt,
            name: name.trim().to_string(),
            age,
            language,
            parent_email,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(user.into())
}

/// Public profile of a user.
pub async fn get_user(state: &SharedState, id: u64) -> Result<UserResponse, ServiceError> {
    state
        .store()
        .find_user(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("user `{id}` not found")))
}
