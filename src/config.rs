//! Application-level configuration loading (auth, session timing, speech evaluator, catalog).

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "OWL_SPEAK_BACK_CONFIG_PATH";

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_DEMO_USER_ID: u64 = 1;
const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(2_000);
const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_COMPLETED_SESSION_RETENTION: Duration = Duration::from_secs(60);
const DEFAULT_IDLE_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Which speech evaluator backs hosted sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorConfig {
    /// Recognition happens on the learner's device; the server judges the transcript.
    Device,
    /// Raw audio is transcribed by a remote model.
    Remote {
        /// Transcription endpoint.
        url: String,
    },
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Lifetime of issued bearer tokens.
    pub token_ttl: Duration,
    /// Whether requests without a bearer token act as the demo user.
    pub allow_demo_user: bool,
    /// User id used for token-less requests when [`AppConfig::allow_demo_user`] is set.
    pub demo_user_id: u64,
    /// How long correct/incorrect feedback is shown before the session moves on.
    pub feedback_delay: Duration,
    /// Upper bound on a single speech evaluation.
    pub evaluation_timeout: Duration,
    /// How long a reported session stays readable before it is dropped.
    pub completed_session_retention: Duration,
    /// Sessions without learner activity for this long are dropped unreported.
    pub idle_session_ttl: Duration,
    /// Speech evaluator backing hosted sessions.
    pub evaluator: EvaluatorConfig,
    /// Optional JSON catalog replacing the built-in games.
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        evaluator = ?app_config.evaluator,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON configuration document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            allow_demo_user: true,
            demo_user_id: DEFAULT_DEMO_USER_ID,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            evaluation_timeout: DEFAULT_EVALUATION_TIMEOUT,
            completed_session_retention: DEFAULT_COMPLETED_SESSION_RETENTION,
            idle_session_ttl: DEFAULT_IDLE_SESSION_TTL,
            evaluator: EvaluatorConfig::Device,
            catalog_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    token_ttl_secs: Option<u64>,
    allow_demo_user: Option<bool>,
    demo_user_id: Option<u64>,
    feedback_delay_ms: Option<u64>,
    evaluation_timeout_ms: Option<u64>,
    completed_session_retention_secs: Option<u64>,
    idle_session_ttl_secs: Option<u64>,
    evaluator: Option<RawEvaluator>,
    catalog_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
/// JSON representation of the evaluator selection.
enum RawEvaluator {
    Device,
    Remote { url: String },
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            token_ttl: value
                .token_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.token_ttl),
            allow_demo_user: value.allow_demo_user.unwrap_or(defaults.allow_demo_user),
            demo_user_id: value.demo_user_id.unwrap_or(defaults.demo_user_id),
            feedback_delay: value
                .feedback_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.feedback_delay),
            evaluation_timeout: value
                .evaluation_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.evaluation_timeout),
            completed_session_retention: value
                .completed_session_retention_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.completed_session_retention),
            idle_session_ttl: value
                .idle_session_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_session_ttl),
            evaluator: value
                .evaluator
                .map(Into::into)
                .unwrap_or(defaults.evaluator),
            catalog_path: value.catalog_path.filter(|path| !path.as_os_str().is_empty()),
        }
    }
}

impl From<RawEvaluator> for EvaluatorConfig {
    fn from(value: RawEvaluator) -> Self {
        match value {
            RawEvaluator::Device => EvaluatorConfig::Device,
            RawEvaluator::Remote { url } => EvaluatorConfig::Remote { url },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
