use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Authentication payloads.
pub mod auth;
/// Phrase catalog payloads.
pub mod catalog;
/// Health check payloads.
pub mod health;
/// User and game progress payloads.
pub mod progress;
/// Hosted play sessions payloads.
pub mod session;
/// Speech-attempt log payloads.
pub mod speech;
/// Users payloads.
pub mod user;
pub mod validation;

fn format_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
