//! Day-boundary rules for `today_stars` and `streak`.
//!
//! Rollover is evaluated against the UTC date of the caller-supplied instant. It only looks at
//! `last_active`, which reads never move, so applying it twice on the same day is a no-op.

use time::Date;

use crate::dao::models::UserProgressEntity;

/// Reset daily counters when `today` is past the day of the last activity.
///
/// `today_stars` restarts at zero on a new day. The streak survives one idle day boundary
/// (activity yesterday) and drops to zero after a longer gap.
pub fn roll_over(progress: &mut UserProgressEntity, today: Date) {
    let last = progress.last_active.date();
    if last >= today {
        return;
    }

    progress.today_stars = 0;
    if today.previous_day() != Some(last) {
        progress.streak = 0;
    }
}

/// Count an activity (a reported game) happening on `today`.
///
/// Must run before `last_active` is refreshed, since it compares against the previous activity.
pub fn record_activity(progress: &mut UserProgressEntity, today: Date) {
    let last = progress.last_active.date();
    progress.streak = if last >= today {
        progress.streak.max(1)
    } else if today.previous_day() == Some(last) {
        progress.streak.saturating_add(1)
    } else {
        1
    };
}
