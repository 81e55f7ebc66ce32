//! Timing configuration for a streaming session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pacing delays for the dispatch loop. Each delay can be set to zero to
/// disable that wait entirely.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PacingOptions {
    /// Wait before the first dispatch cycle, giving the source a head start
    /// so the first visible message carries more than one token.
    pub initial_delay: Duration,
    /// Wait applied when a cycle finds nothing queued.
    pub no_fragment_delay: Duration,
    /// Minimum wall-clock spacing between consecutive surface calls.
    pub cycle_delay: Duration,
}

impl Default for PacingOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            no_fragment_delay: Duration::from_millis(50),
            cycle_delay: Duration::from_millis(500),
        }
    }
}

impl PacingOptions {
    /// All delays zero; the dispatcher spins as fast as the scheduler allows.
    /// Mostly useful in tests.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            no_fragment_delay: Duration::ZERO,
            cycle_delay: Duration::ZERO,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_no_fragment_delay(mut self, delay: Duration) -> Self {
        self.no_fragment_delay = delay;
        self
    }

    pub fn with_cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = PacingOptions::default();
        assert_eq!(options.initial_delay, Duration::from_millis(200));
        assert_eq!(options.no_fragment_delay, Duration::from_millis(50));
        assert_eq!(options.cycle_delay, Duration::from_millis(500));
    }

    #[test]
    fn builder_overrides_single_field() {
        let options = PacingOptions::default().with_cycle_delay(Duration::from_millis(100));
        assert_eq!(options.cycle_delay, Duration::from_millis(100));
        assert_eq!(options.initial_delay, Duration::from_millis(200));
    }

    #[test]
    fn serde_round_trip() {
        let options = PacingOptions::immediate();
        let json = serde_json::to_string(&options).unwrap();
        let back: PacingOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cycle_delay, Duration::ZERO);
    }
}
