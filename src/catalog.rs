//! Phrase catalog: the static, read-only list of games and their ordered phrases.

use std::{collections::HashSet, fmt, fs, path::Path, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Prompt language supported by the phrase tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Hindi.
    Hi,
}

impl Language {
    /// Two-letter code used on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            other => Err(format!("unsupported language `{other}`")),
        }
    }
}

/// A short text the learner must speak, with its Hindi variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    /// Identifier.
    pub id: u32,
    /// Prompt text in English.
    pub text: String,
    /// Prompt text in Hindi.
    pub text_hi: String,
}

impl Phrase {
    /// Text to prompt in the given language.
    pub fn text_in(&self, language: Language) -> &str {
        match language {
            Language::En => &self.text,
            Language::Hi => &self.text_hi,
        }
    }
}

/// Static game definition. The phrase order is the presentation order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
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
    pub phrases: Vec<Phrase>,
}

impl Game {
    /// Number of phrases in the game (always at least one for a loaded catalog).
    pub fn total_phrases(&self) -> usize {
        self.phrases.len()
    }

    /// Phrase at `index` in play order.
    pub fn phrase(&self, index: usize) -> Option<&Phrase> {
        self.phrases.get(index)
    }
}

/// Reasons a catalog definition is rejected at load time.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read catalog file: {0}")]
    Read(#[from] std::io::Error),
    /// The file is not a JSON list of games.
    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    /// No games at all.
    #[error("catalog declares no games")]
    Empty,
    /// Two games share an id.
    #[error("duplicate game id `{0}`")]
    DuplicateGame(String),
    /// A game without phrases.
    #[error("game `{0}` has no phrases")]
    NoPhrases(String),
    /// Two phrases of one game share an id.
    #[error("game `{game}` declares phrase id {phrase} more than once")]
    DuplicatePhrase {
        /// Offending game.
        game: String,
        /// Repeated phrase id.
        phrase: u32,
    },
    /// A phrase with empty text.
    #[error("game `{game}` has a blank phrase (id {phrase})")]
    BlankPhrase {
        /// Offending game.
        game: String,
        /// Blank phrase id.
        phrase: u32,
    },
}

/// Immutable catalog shared across every session.
#[derive(Debug, Clone)]
pub struct Catalog {
    games: IndexMap<String, Game>,
}

impl Catalog {
    /// Build a catalog from game definitions, rejecting inconsistent data.
    pub fn new(games: Vec<Game>) -> Result<Self, CatalogError> {
        if games.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut indexed = IndexMap::with_capacity(games.len());
        for game in games {
            if game.phrases.is_empty() {
                return Err(CatalogError::NoPhrases(game.id));
            }

            let mut seen = HashSet::new();
            for phrase in &game.phrases {
                if !seen.insert(phrase.id) {
                    return Err(CatalogError::DuplicatePhrase {
                        game: game.id.clone(),
                        phrase: phrase.id,
                    });
                }
                if phrase.text.trim().is_empty() || phrase.text_hi.trim().is_empty() {
                    return Err(CatalogError::BlankPhrase {
                        game: game.id.clone(),
                        phrase: phrase.id,
                    });
                }
            }

            if indexed.contains_key(&game.id) {
                return Err(CatalogError::DuplicateGame(game.id));
            }
            indexed.insert(game.id.clone(), game);
        }

        Ok(Self { games: indexed })
    }

    /// Load a catalog from a JSON array of games.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let games: Vec<Game> = serde_json::from_str(&contents)?;
        Self::new(games)
    }

    /// Catalog shipped with the binary.
    pub fn builtin() -> Self {
        let games = builtin_games()
            .into_iter()
            .map(|game| (game.id.clone(), game))
            .collect();
        Self { games }
    }

    /// Game by id.
    pub fn get(&self, id: &str) -> Option<&Game> {
        self.games.get(id)
    }

    /// Games in declaration order.
    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    /// Number of games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the catalog has no games.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

fn phrase(id: u32, text: &str, text_hi: &str) -> Phrase {
    Phrase {
        id,
        text: text.into(),
        text_hi: text_hi.into(),
    }
}

fn builtin_games() -> Vec<Game> {
    vec![
        Game {
            id: "wordMatch".into(),
            name: "Word Match".into(),
            name_hi: "शब्द मिलान".into(),
            description: "Listen to the word and select the matching picture!".into(),
            description_hi: "शब्द सुनें और मिलती हुई तस्वीर चुनें!".into(),
            icon: "FileText".into(),
            level: 2,
            duration: 5,
            color: "#FF6B6B".into(),
            phrases: vec![
                phrase(1, "apple", "सेब"),
                phrase(2, "dog", "कुत्ता"),
                phrase(3, "cat", "बिल्ली"),
                phrase(4, "banana", "केला"),
                phrase(5, "book", "किताब"),
            ],
        },
        Game {
            id: "speakRepeat".into(),
            name: "Speak & Repeat".into(),
            name_hi: "बोलो और दोहराओ".into(),
            description: "Listen to the phrase and try to repeat it correctly!".into(),
            description_hi: "वाक्यांश सुनें और इसे सही ढंग से दोहराने का प्रयास करें!".into(),
            icon: "Mic".into(),
            level: 1,
            duration: 8,
            color: "#4ECDC4".into(),
            phrases: vec![
                phrase(1, "I see a red apple", "मुझे एक लाल सेब दिखता है"),
                phrase(2, "The dog is running", "कुत्ता दौड़ रहा है"),
                phrase(3, "I like to read books", "मुझे किताबें पढ़ना पसंद है"),
                phrase(4, "The sky is blue", "आकाश नीला है"),
                phrase(5, "Good morning, how are you?", "सुप्रभात, आप कैसे हैं?"),
            ],
        },
        Game {
            id: "storyTime".into(),
            name: "Story Time".into(),
            name_hi: "कहानी का समय".into(),
            description: "Listen to a story and answer questions with your voice!".into(),
            description_hi: "एक कहानी सुनें और अपनी आवाज से प्रश्नों के उत्तर दें!".into(),
            icon: "BookOpen".into(),
            level: 3,
            duration: 10,
            color: "#6A2C70".into(),
            phrases: vec![
                phrase(
                    1,
                    "Once upon a time, there was a little rabbit",
                    "एक समय की बात है, एक छोटा खरगोश था",
                ),
                phrase(
                    2,
                    "The rabbit liked to hop and play",
                    "खरगोश कूदना और खेलना पसंद करता था",
                ),
                phrase(
                    3,
                    "One day, he met a friendly turtle",
                    "एक दिन, वह एक मित्रवत कछुए से मिला",
                ),
                phrase(4, "They became good friends", "वे अच्छे दोस्त बन गए"),
                phrase(5, "They played together every day", "वे हर दिन साथ खेलते थे"),
            ],
        },
    ]
}
