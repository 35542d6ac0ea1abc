//! Back-off configuration for feed reconnects.

use std::time::Duration;

/// Configuration for linear back-off between reconnect attempts.
///
/// The first wait is `step`; every failed attempt adds another `step`, capped
/// at `max_delay`. Each reconnect episode starts again from `step`.
///
/// # Default Values
/// - `step`: 500 milliseconds
/// - `max_delay`: 15 seconds
///
/// # Invariants
/// - `step` must not exceed `max_delay`
/// - `step` must be at least 1 millisecond
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectBackoff {
    /// Initial wait and per-attempt increment.
    pub step: Duration,
    /// Upper bound on a single wait.
    pub max_delay: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(500),
            max_delay: Duration::from_secs(15),
        }
    }
}

impl ReconnectBackoff {
    /// Clamp delays to sane bounds and ensure `step <= max_delay`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use feedclient::client::ReconnectBackoff;
    ///
    /// let cfg = ReconnectBackoff {
    ///     step: Duration::from_millis(5),
    ///     max_delay: Duration::ZERO,
    /// };
    ///
    /// let normalized = cfg.normalized();
    /// assert_eq!(normalized.step, Duration::from_millis(1));
    /// assert_eq!(normalized.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let floor = Duration::from_millis(1);
        let (a, b) = (self.step.max(floor), self.max_delay.max(floor));
        Self {
            step: a.min(b),
            max_delay: a.max(b),
        }
    }

    /// Wait durations for one reconnect episode.
    ///
    /// The iterator is infinite; it saturates at `max_delay`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use feedclient::client::ReconnectBackoff;
    ///
    /// let cfg = ReconnectBackoff {
    ///     step: Duration::from_millis(500),
    ///     max_delay: Duration::from_millis(1200),
    /// };
    /// let delays: Vec<_> = cfg.delays().take(4).collect();
    /// assert_eq!(
    ///     delays,
    ///     [500, 1000, 1200, 1200].map(Duration::from_millis).to_vec()
    /// );
    /// ```
    pub fn delays(self) -> impl Iterator<Item = Duration> {
        let ReconnectBackoff { step, max_delay } = self.normalized();
        std::iter::successors(Some(step), move |prev| {
            Some(prev.saturating_add(step).min(max_delay))
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_episode_grows_by_half_seconds_up_to_fifteen() {
        let delays: Vec<_> = ReconnectBackoff::default().delays().take(32).collect();
        assert_eq!(delays.first(), Some(&Duration::from_millis(500)));
        assert_eq!(delays.get(1), Some(&Duration::from_secs(1)));
        assert_eq!(delays.get(29), Some(&Duration::from_secs(15)));
        assert_eq!(delays.last(), Some(&Duration::from_secs(15)));
    }

    #[test]
    fn each_episode_restarts_from_step() {
        let backoff = ReconnectBackoff::default();
        let first: Vec<_> = backoff.delays().take(5).collect();
        let second: Vec<_> = backoff.delays().take(5).collect();
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(Duration::ZERO, Duration::ZERO, Duration::from_millis(1), Duration::from_millis(1))]
    #[case(
        Duration::from_secs(2),
        Duration::from_secs(1),
        Duration::from_secs(1),
        Duration::from_secs(2)
    )]
    #[case(
        Duration::from_millis(250),
        Duration::from_secs(3),
        Duration::from_millis(250),
        Duration::from_secs(3)
    )]
    fn normalization_clamps_and_orders(
        #[case] step: Duration,
        #[case] max_delay: Duration,
        #[case] want_step: Duration,
        #[case] want_max: Duration,
    ) {
        let cfg = ReconnectBackoff { step, max_delay }.normalized();
        assert_eq!(cfg.step, want_step);
        assert_eq!(cfg.max_delay, want_max);
    }

    proptest! {
        #[test]
        fn delays_are_non_decreasing_and_capped(
            step_ms in 0u64..5_000,
            max_ms in 0u64..60_000,
            len in 1usize..200,
        ) {
            let cfg = ReconnectBackoff {
                step: Duration::from_millis(step_ms),
                max_delay: Duration::from_millis(max_ms),
            };
            let bound = cfg.normalized().max_delay;
            let delays: Vec<_> = cfg.delays().take(len).collect();
            prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(delays.iter().all(|d| *d <= bound));
        }
    }
}
