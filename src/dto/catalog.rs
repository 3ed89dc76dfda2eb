use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{Game, Phrase};

/// One phrase of a game, in both languages.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhraseResponse {
    /// Identifier.
    pub id: u32,
    /// Prompt text in English.
    pub text: String,
    /// Prompt text in Hindi.
    pub text_hi: String,
}

impl From<&Phrase> for PhraseResponse {
    fn from(phrase: &Phrase) -> Self {
        Self {
            id: phrase.id,
            text: phrase.text.clone(),
            text_hi: phrase.text_hi.clone(),
        }
    }
}

/// Static game definition with its ordered phrases.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display name in Hindi.
    pub name_hi: String,
    /// Short description.
    pub description: String,
    /// Short description in Hindi.
    pub description_hi: String,
    /// Icon name used by the client.
    pub icon: String,
    /// Difficulty level, starting at 1.
    pub level: u8,
    /// Expected play time in minutes.
    pub duration: u32,
    /// Accent color as a hex string.
    pub color: String,
    /// Phrases in play order.
    pub phrases: Vec<PhraseResponse>,
}

impl From<&Game> for GameResponse {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            name: game.name.clone(),
            name_hi: game.name_hi.clone(),
            description: game.description.clone(),
            description_hi: game.description_hi.clone(),
            icon: game.icon.clone(),
            level: game.level,
            duration: game.duration,
            color: game.color.clone(),
            phrases: game.phrases.iter().map(PhraseResponse::from).collect(),
        }
    }
}
