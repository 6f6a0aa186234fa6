use std::time::Duration;

use tokio::time::Instant;

use crate::configs::Backoff as BackoffSettings;

/// Exponential reconnect delay, doubling from `min` to `max`.
///
/// Once a connection has stayed up for `stable`, the next failure starts over
/// from `min`.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    stable: Duration,
    current: Duration,
    connected_at: Option<Instant>,
}

impl Backoff {
    pub fn new(settings: &BackoffSettings) -> Self {
        let min = Duration::from_secs(settings.min_secs);

        Self {
            min,
            max: Duration::from_secs(settings.max_secs),
            stable: Duration::from_secs(settings.stable_secs),
            current: min,
            connected_at: None,
        }
    }

    pub fn connected(&mut self, now: Instant) {
        self.connected_at = Some(now);
    }

    /// Records a connection failure and returns how long to wait before retrying.
    pub fn failed(&mut self, now: Instant) -> Duration {
        if let Some(since) = self.connected_at.take() {
            if now.saturating_duration_since(since) >= self.stable {
                self.current = self.min;
            }
        }

        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BackoffSettings {
        BackoffSettings {
            min_secs: 1,
            max_secs: 32,
            stable_secs: 20,
        }
    }

    #[test]
    fn test_doubles_up_to_max() {
        let mut backoff = Backoff::new(&settings());
        let now = Instant::now();

        let delays: Vec<u64> = (0..8).map(|_| backoff.failed(now).as_secs()).collect();

        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 32, 32]);
    }

    #[test]
    fn test_resets_after_stable_connection() {
        let mut backoff = Backoff::new(&settings());
        let start = Instant::now();

        for _ in 0..4 {
            backoff.failed(start);
        }
        backoff.connected(start);

        assert_eq!(backoff.failed(start + Duration::from_secs(25)), Duration::from_secs(1));
        assert_eq!(backoff.failed(start + Duration::from_secs(26)), Duration::from_secs(2));
    }

    #[test]
    fn test_short_connection_keeps_growing() {
        let mut backoff = Backoff::new(&settings());
        let start = Instant::now();

        backoff.failed(start);
        backoff.failed(start);
        backoff.connected(start);

        assert_eq!(backoff.failed(start + Duration::from_secs(5)), Duration::from_secs(4));
    }
}
