//! Scheduler tuning knobs.
//!
//! Defaults match the deployed cadence: a 60-second tick, a 15-minute
//! stale-claim grace, and a shuffle window of five positions per requested
//! winner. Each can be overridden through the environment.

use std::time::Duration;

use chrono::Duration as ChronoDuration;

/// Default tick cadence (60 seconds).
const DEFAULT_TICK_SECS: u64 = 60;

/// Default grace before a claimed-but-unfinalized record is re-driven
/// (15 minutes).
const DEFAULT_RECLAIM_MINS: i64 = 15;

/// Default shuffle window factor (positions shuffled per requested winner).
const DEFAULT_SHUFFLE_WINDOW: u32 = 5;

/// Configuration for the claim loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between ticks.
    ///
    /// Default: 60 seconds. Configure via `GIVEAWAYD_TICK_SECS`.
    pub tick_interval: Duration,

    /// How long a claim may sit unfinalized before a later tick re-drives
    /// the record. Must comfortably exceed the slowest expected tick, or
    /// in-flight records get double-processed.
    ///
    /// Default: 15 minutes. Configure via `GIVEAWAYD_RECLAIM_MINS`.
    pub reclaim_after: ChronoDuration,

    /// Bound on shuffled ticket-pool positions, per requested winner.
    ///
    /// Default: 5. Configure via `GIVEAWAYD_SHUFFLE_WINDOW`.
    pub shuffle_window_factor: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Creates a new `SchedulerConfig` with default values.
    pub fn new() -> Self {
        SchedulerConfig {
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECS),
            reclaim_after: ChronoDuration::minutes(DEFAULT_RECLAIM_MINS),
            shuffle_window_factor: DEFAULT_SHUFFLE_WINDOW,
        }
    }

    /// Creates a `SchedulerConfig` from environment variables, using
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let tick_secs = std::env::var("GIVEAWAYD_TICK_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TICK_SECS);

        let reclaim_mins = std::env::var("GIVEAWAYD_RECLAIM_MINS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_RECLAIM_MINS);

        let shuffle_window = std::env::var("GIVEAWAYD_SHUFFLE_WINDOW")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_SHUFFLE_WINDOW);

        SchedulerConfig {
            tick_interval: Duration::from_secs(tick_secs.max(1)),
            reclaim_after: ChronoDuration::minutes(reclaim_mins.max(1)),
            shuffle_window_factor: shuffle_window.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = SchedulerConfig::new();

        assert_eq!(config.tick_interval, Duration::from_secs(60));
        assert_eq!(config.reclaim_after, ChronoDuration::minutes(15));
        assert_eq!(config.shuffle_window_factor, 5);
    }
}
