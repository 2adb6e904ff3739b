//! Owned periodic timer that gates the session tick.

use std::time::Duration;

use incident_rush_core::Timestamp;

/// Cancellable periodic timer.
///
/// The ticker does not run on its own. A driver asks it whether a period
/// elapsed via [`Ticker::fire_if_due`]. Periods missed by a slow driver
/// collapse into a single firing.
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Timestamp>,
}

impl Ticker {
    /// Creates a disarmed ticker firing every `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Reports whether the ticker is armed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arms the ticker so that it first fires one period after `now`.
    pub fn arm(&mut self, now: Timestamp) {
        self.next_due = Some(now.saturating_add(self.period));
    }

    /// Disarms the ticker. Cancelling a disarmed ticker has no effect.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Consumes a due period and reports whether the ticker fired.
    pub fn fire_if_due(&mut self, now: Timestamp) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let next = due.saturating_add(self.period);
        self.next_due = Some(if next > now {
            next
        } else {
            now.saturating_add(self.period)
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Ticker;
    use incident_rush_core::Timestamp;
    use std::time::Duration;

    #[test]
    fn disarmed_ticker_never_fires() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        assert!(!ticker.fire_if_due(Timestamp::from_secs(100)));
    }

    #[test]
    fn fires_once_per_period() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.arm(Timestamp::ZERO);
        assert!(!ticker.fire_if_due(Timestamp::from_offset(Duration::from_millis(999))));
        assert!(ticker.fire_if_due(Timestamp::from_secs(1)));
        assert!(!ticker.fire_if_due(Timestamp::from_offset(Duration::from_millis(1_500))));
        assert!(ticker.fire_if_due(Timestamp::from_secs(2)));
        assert!(!ticker.fire_if_due(Timestamp::from_offset(Duration::from_millis(2_999))));
        assert!(ticker.fire_if_due(Timestamp::from_secs(3)));
    }

    #[test]
    fn missed_periods_collapse() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.arm(Timestamp::ZERO);
        assert!(ticker.fire_if_due(Timestamp::from_secs(10)));
        assert!(!ticker.fire_if_due(Timestamp::from_secs(10)));
        assert!(!ticker.fire_if_due(Timestamp::from_offset(Duration::from_millis(10_999))));
        assert!(ticker.fire_if_due(Timestamp::from_secs(11)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.arm(Timestamp::ZERO);
        ticker.cancel();
        ticker.cancel();
        assert!(!ticker.is_armed());
        assert!(!ticker.fire_if_due(Timestamp::from_secs(5)));
    }
}
