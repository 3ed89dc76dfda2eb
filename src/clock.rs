//! Clock abstraction so day-boundary logic can be driven deterministically in tests.

use time::{Date, Duration, OffsetDateTime};

/// Source of "now" for services that stamp records or compute day rollovers.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Wall clock (UTC).
    #[default]
    System,
    /// Clock frozen at the given instant.
    Fixed(OffsetDateTime),
}

impl Clock {
    /// Clock frozen at `at`.
    pub fn fixed(at: OffsetDateTime) -> Self {
        Self::Fixed(at)
    }

    /// Current instant according to the clock.
    pub fn now(&self) -> OffsetDateTime {
        match self {
            Clock::System => OffsetDateTime::now_utc(),
            Clock::Fixed(at) => *at,
        }
    }

    /// Calendar day (UTC) of [`Clock::now`].
    pub fn today(&self) -> Date {
        self.now().date()
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(at) = self {
            *at += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_across_days() {
        let start = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut clock = Clock::fixed(start);
        let day = clock.today();

        clock.advance(Duration::days(1));

        assert_eq!(clock.today(), day.next_day().unwrap());
    }
}
