//! Runtime configuration for the bank
//!
//! Controls cashier pool sizing, how often workers check for shutdown, the
//! rate refresh period and whether exchanges require sufficient funds.

use std::time::Duration;
use tracing::warn;

/// Configuration for a [`Bank`](crate::core::Bank)
#[derive(Clone, Debug, PartialEq)]
pub struct BankConfig {
    /// Cashiers started with the bank
    pub initial_workers: usize,
    /// Upper bound on the cashier pool
    pub max_workers: usize,
    /// A new cashier is added while `depth / backlog_ratio` exceeds the pool size
    pub backlog_ratio: usize,
    /// Time between exchange rate refreshes
    pub rate_refresh_interval: Duration,
    /// Longest a cashier waits on an empty queue before rechecking shutdown
    pub poll_interval: Duration,
    /// Reject exchanges larger than the balance instead of going negative
    pub strict_exchange: bool,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            initial_workers: 1,
            max_workers: num_cpus::get() * 4,
            backlog_ratio: 3,
            rate_refresh_interval: Duration::from_secs(3600),
            poll_interval: Duration::from_millis(100),
            strict_exchange: false,
        }
    }
}

impl BankConfig {
    /// Create a new BankConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning, and
    /// `initial_workers` is clamped to `max_workers`.
    pub fn new(
        initial_workers: usize,
        max_workers: usize,
        backlog_ratio: usize,
        rate_refresh_interval: Duration,
        poll_interval: Duration,
        strict_exchange: bool,
    ) -> Self {
        let default = Self::default();

        let max_workers = or_default("max_workers", max_workers, default.max_workers);
        let mut initial_workers =
            or_default("initial_workers", initial_workers, default.initial_workers);
        if initial_workers > max_workers {
            warn!(
                initial_workers,
                max_workers, "initial_workers exceeds max_workers, clamping"
            );
            initial_workers = max_workers;
        }

        let backlog_ratio = or_default("backlog_ratio", backlog_ratio, default.backlog_ratio);

        let rate_refresh_interval = if rate_refresh_interval.is_zero() {
            warn!(
                default_secs = default.rate_refresh_interval.as_secs(),
                "Invalid rate_refresh_interval (0), using default"
            );
            default.rate_refresh_interval
        } else {
            rate_refresh_interval
        };

        let poll_interval = if poll_interval.is_zero() {
            warn!(
                default_ms = default.poll_interval.as_millis() as u64,
                "Invalid poll_interval (0), using default"
            );
            default.poll_interval
        } else {
            poll_interval
        };

        Self {
            initial_workers,
            max_workers,
            backlog_ratio,
            rate_refresh_interval,
            poll_interval,
            strict_exchange,
        }
    }
}

fn or_default(name: &str, value: usize, default: usize) -> usize {
    if value == 0 {
        warn!(field = name, default, "Invalid value (0), using default");
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = BankConfig::default();

        assert_eq!(config.initial_workers, 1);
        assert_eq!(config.max_workers, num_cpus::get() * 4);
        assert_eq!(config.backlog_ratio, 3);
        assert_eq!(config.rate_refresh_interval, Duration::from_secs(3600));
        assert!(!config.strict_exchange);
    }

    #[rstest]
    #[case::all_custom(2, 8, 5, (2, 8, 5))]
    #[case::zero_initial(0, 8, 5, (1, 8, 5))]
    #[case::zero_ratio(2, 8, 0, (2, 8, 3))]
    #[case::initial_above_max(10, 4, 3, (4, 4, 3))]
    fn test_new_sanitizes_sizes(
        #[case] initial: usize,
        #[case] max: usize,
        #[case] ratio: usize,
        #[case] expected: (usize, usize, usize),
    ) {
        let config = BankConfig::new(
            initial,
            max,
            ratio,
            Duration::from_secs(1),
            Duration::from_millis(10),
            false,
        );

        assert_eq!(
            (config.initial_workers, config.max_workers, config.backlog_ratio),
            expected
        );
    }

    #[test]
    fn test_zero_max_workers_falls_back() {
        let config = BankConfig::new(1, 0, 3, Duration::ZERO, Duration::ZERO, true);

        assert_eq!(config.max_workers, num_cpus::get() * 4);
        assert_eq!(config.rate_refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(config.strict_exchange);
    }
}
