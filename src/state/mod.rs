/// A single hosted play-through.
pub mod play_session;
/// Session state machine and completion summary.
pub mod session_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    auth::{Authenticator, DemoTokenAuthenticator},
    catalog::Catalog,
    clock::Clock,
    config::AppConfig,
    dao::progress_store::ProgressRepository,
    speech::{SpeechEvaluator, build_evaluator},
    state::play_session::PlaySession,
};

pub use self::session_machine::{InvalidTransition, SessionEvent, SessionPhase};

/// Application state shared across handlers and background tasks.
pub type SharedState = Arc<AppState>;
/// Handle to one hosted session; the lock serializes events applied to it.
pub type SessionHandle = Arc<Mutex<PlaySession>>;

/// Central application state: injected capabilities plus the hosted sessions.
pub struct AppState {
    config: AppConfig,
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressRepository>,
    authenticator: Arc<dyn Authenticator>,
    evaluator: Arc<dyn SpeechEvaluator>,
    clock: Clock,
    sessions: DashMap<Uuid, SessionHandle>,
}

impl AppState {
    /// Assemble the state from configuration, using the demo authenticator and the evaluator
    /// selected by `config.evaluator`.
    pub fn new(config: AppConfig, catalog: Catalog, store: Arc<dyn ProgressRepository>) -> Self {
        let authenticator = Arc::new(DemoTokenAuthenticator::new(config.token_ttl));
        let evaluator = build_evaluator(&config.evaluator);
        Self {
            config,
            catalog: Arc::new(catalog),
            store,
            authenticator,
            evaluator,
            clock: Clock::System,
            sessions: DashMap::new(),
        }
    }

    /// Replace the clock used to stamp records and compute day rollovers.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the speech evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn SpeechEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Replace the authenticator.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Wrap the state in an [`Arc`] so it can be cloned cheaply.
    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Phrase catalog shared by every session.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Progress store backing users, aggregates and the attempt log.
    pub fn store(&self) -> Arc<dyn ProgressRepository> {
        self.store.clone()
    }

    /// Issues and verifies bearer tokens.
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Speech evaluator used by hosted sessions.
    pub fn evaluator(&self) -> Arc<dyn SpeechEvaluator> {
        self.evaluator.clone()
    }

    /// Clock used for timestamps and day rollover.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Register a freshly started session and return its handle.
    pub fn insert_session(&self, session: PlaySession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Handle of a hosted session, if it is still held.
    pub fn session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop a session from the map, returning its handle.
    pub fn remove_session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.remove(&id).map(|(_, handle)| handle)
    }

    /// Handles of every hosted session, cloned out so no map shard stays locked.
    pub fn session_handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Ids and handles of every hosted session, cloned out like [`AppState::session_handles`].
    pub fn session_entries(&self) -> Vec<(Uuid, SessionHandle)> {
        self.sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
