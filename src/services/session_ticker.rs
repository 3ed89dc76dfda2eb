use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::state::SharedState;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Advance the elapsed time of every active hosted session once per second and drop
/// expired sessions.
pub async fn run(state: SharedState) {
    info!("session ticker started");
    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let advanced = tick_sessions(&state).await;
        if advanced > 0 {
            debug!(advanced, total = state.session_count(), "session clocks advanced");
        }
        let evicted = evict_sessions(&state, state.clock().now()).await;
        if evicted > 0 {
            info!(evicted, remaining = state.session_count(), "expired sessions dropped");
        }
    }
}

/// Add one second to every active session, returning how many advanced.
pub async fn tick_sessions(state: &SharedState) -> usize {
    let mut advanced = 0;
    for handle in state.session_handles() {
        if handle.lock().await.tick() {
            advanced += 1;
        }
    }
    advanced
}

/// Drop sessions reported longer ago than the retention window, and sessions idle past the
/// configured TTL. Idle sessions are dropped unreported. Returns how many were removed.
pub async fn evict_sessions(state: &SharedState, now: OffsetDateTime) -> usize {
    let retention = state.config().completed_session_retention;
    let idle_ttl = state.config().idle_session_ttl;
    let mut evicted = 0;
    for (id, handle) in state.session_entries() {
        let session = handle.lock().await;
        if session.is_expired(now, retention, idle_ttl) {
            if !session.is_reported() {
                debug!(session_id = %id, "dropping idle session");
            }
            drop(session);
            if state.remove_session(id).is_some() {
                evicted += 1;
            }
        }
    }
    evicted
}
