use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use common::{Pattern, Signal};

use crate::history::HistoryTracker;
use crate::queue::{TradeHypothesis, TradeQueue};

/// Fires when the two most recent digits are equal and the cooldown has
/// elapsed since the previous signal.
#[derive(Debug, Clone)]
pub struct SignalDetector {
    cooldown: Duration,
    /// `None` until the first signal, so the first pattern is never suppressed.
    last_signal_time: Option<DateTime<Utc>>,
}

impl SignalDetector {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_signal_time: None,
        }
    }

    fn cooldown_over(&self, now: DateTime<Utc>) -> bool {
        match self.last_signal_time {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.cooldown,
        }
    }

    /// Check the latest digits. On a trigger, opens a trade in `queue` at
    /// `price` and returns the signal describing it.
    pub fn check(
        &mut self,
        history: &HistoryTracker,
        queue: &mut TradeQueue,
        price: f64,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        let (prev, last) = history.last_two_digits()?;
        if prev != last {
            return None;
        }
        if !self.cooldown_over(now) {
            debug!(digit = last, "Pattern suppressed by cooldown");
            return None;
        }

        let pattern = Pattern([prev, last]);
        let id = Uuid::new_v4();
        queue.push(TradeHypothesis::new(id, price, pattern, now));
        self.last_signal_time = Some(now);

        info!(%id, price, %pattern, "New signal detected");
        Some(Signal {
            id,
            price,
            time: now,
            pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    fn setup(cooldown_ms: i64) -> (SignalDetector, HistoryTracker, TradeQueue) {
        (
            SignalDetector::new(Duration::milliseconds(cooldown_ms)),
            HistoryTracker::new(1000),
            TradeQueue::new(5, 2.0, 0.9),
        )
    }

    #[test]
    fn fires_on_two_equal_digits() {
        let (mut detector, mut history, mut queue) = setup(20_000);
        history.update(7.13).unwrap();
        history.update(7.23).unwrap();

        let signal = detector.check(&history, &mut queue, 7.23, at_ms(0)).unwrap();
        assert_eq!(signal.pattern, Pattern::repeated(3));
        assert_eq!(signal.price, 7.23);
        assert_eq!(signal.time, at_ms(0));

        assert_eq!(queue.len(), 1);
        let trade = queue.iter().next().unwrap();
        assert_eq!(trade.id, signal.id);
        assert_eq!(trade.start_price, 7.23);
        assert!(trade.collected.is_empty());
        assert_eq!(detector.last_signal_time, Some(at_ms(0)));
    }

    #[test]
    fn needs_at_least_two_digits() {
        let (mut detector, mut history, mut queue) = setup(0);
        history.update(1.11).unwrap();
        assert!(detector.check(&history, &mut queue, 1.11, at_ms(0)).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn different_digits_do_not_fire() {
        let (mut detector, mut history, mut queue) = setup(0);
        history.update(1.11).unwrap();
        history.update(1.12).unwrap();
        assert!(detector.check(&history, &mut queue, 1.12, at_ms(0)).is_none());
    }

    #[test]
    fn cooldown_suppresses_until_elapsed() {
        let (mut detector, mut history, mut queue) = setup(20_000);
        history.update(2.22).unwrap();
        history.update(2.22).unwrap();

        assert!(detector.check(&history, &mut queue, 2.22, at_ms(0)).is_some());
        assert!(detector.check(&history, &mut queue, 2.22, at_ms(10_000)).is_none());
        assert!(detector.check(&history, &mut queue, 2.22, at_ms(19_999)).is_none());
        assert!(detector.check(&history, &mut queue, 2.22, at_ms(20_000)).is_some());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn zero_cooldown_fires_every_qualifying_tick() {
        let (mut detector, mut history, mut queue) = setup(0);
        history.update(4.44).unwrap();
        history.update(4.44).unwrap();
        assert!(detector.check(&history, &mut queue, 4.44, at_ms(5)).is_some());
        assert!(detector.check(&history, &mut queue, 4.44, at_ms(5)).is_some());
    }
}
