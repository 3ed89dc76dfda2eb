use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    catalog::Language,
    dao::models::UserEntity,
    dto::{
        format_time,
        validation::{validate_language, validate_not_blank},
    },
};

fn default_language() -> String {
    Language::default().code().to_string()
}

/// Sign-up payload.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 32), custom(function = "validate_not_blank"))]
    /// Login name, 3 to 32 characters.
    pub username: String,
    #[validate(length(min = 4, max = 128))]
    /// At least 4 characters.
    pub password: String,
    /// Display name shown in the app.
    #[validate(length(max = 64), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(range(min = 1, max = 120))]
    /// Age of the learner, when given.
    pub age: Option<u8>,
    /// `en` or `hi`; defaults to `en`.
    #[serde(default = "default_language")]
    #[validate(custom(function = "validate_language"))]
    pub language: String,
    #[validate(email)]
    /// Contact address of a parent, when given.
    pub parent_email: Option<String>,
}

/// A user as returned to clients; the password never leaves the server.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Identifier.
    pub id: u64,
    /// Login name, 3 to 32 characters.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Age of the learner, when given.
    pub age: Option<u8>,
    /// Prompt language.
    pub language: Language,
    /// Contact address of a parent, when given.
    pub parent_email: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            age: user.age,
            language: user.language,
            parent_email: user.parent_email,
            created_at: format_time(user.created_at),
        }
    }
}
