use std::collections::VecDeque;

use super::config::CriticalBand;
use crate::vitals::Sample;

/// Trailing window of samples for one (stream, kind) pair
///
/// Arrival-ordered; eviction is eager on every observe, so the deque never
/// holds samples older than the configured window at evaluation time.
#[derive(Debug, Default)]
pub struct Window {
    samples: VecDeque<Sample>,
}

impl Window {
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
    }

    /// Drop samples from the front that slid out of the trailing window
    pub fn evict_older_than(&mut self, now_ms: i64, window_ms: i64) {
        while let Some(front) = self.samples.front() {
            if now_ms - front.observed_at > window_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples the criticality predicate flags
    pub fn critical_count(&self, band: &CriticalBand) -> usize {
        self.samples
            .iter()
            .filter(|s| band.is_critical(s.value))
            .count()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.value).reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.value).reduce(f64::max)
    }
}

/// Windowed alert state for one (stream, kind) pair
#[derive(Debug, Default)]
pub struct StreamVitalState {
    pub window: Window,
    /// Single source of truth for whether this stream×kind is alerting
    pub in_alert: bool,
    /// Epoch ms of the last transition, 0 before any fired
    pub last_transition_at: i64,
    /// Epoch ms of the most recent sample arrival, 0 before any arrived
    pub last_sample_at: i64,
}

impl StreamVitalState {
    /// Record an arriving sample: stamp the arrival time, append, then evict
    /// whatever the new sample pushed out of the window
    pub fn observe(&mut self, sample: Sample, now_ms: i64, window_ms: i64) {
        self.last_sample_at = sample.observed_at;
        self.window.push(sample);
        self.window.evict_older_than(now_ms, window_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(observed_at: i64, value: f64) -> Sample {
        Sample {
            observed_at,
            value,
            unit: "bpm".to_string(),
            source_ts: None,
        }
    }

    #[test]
    fn test_observe_appends_and_stamps() {
        let mut state = StreamVitalState::default();

        state.observe(sample(1_000, 70.0), 1_000, 6_000);
        state.observe(sample(2_000, 75.0), 2_000, 6_000);

        assert_eq!(state.window.len(), 2);
        assert_eq!(state.last_sample_at, 2_000);
    }

    #[test]
    fn test_eviction_excludes_expired_sample() {
        let mut state = StreamVitalState::default();
        let window_ms = 6_000;

        // one critical sample, then silence longer than the window
        state.observe(sample(1_000, 160.0), 1_000, window_ms);
        assert_eq!(state.window.len(), 1);

        // next sample arrives 8s later; the old one must not be counted
        state.observe(sample(9_000, 72.0), 9_000, window_ms);
        assert_eq!(state.window.len(), 1);

        let band = CriticalBand {
            low: Some(45.0),
            high: Some(120.0),
        };
        assert_eq!(state.window.critical_count(&band), 0);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let mut window = Window::default();
        for t in [0, 1_000, 2_000, 7_000] {
            window.push(sample(t, 80.0));
        }

        window.evict_older_than(7_000, 6_000);

        // only t=0 exceeded the window
        assert_eq!(window.len(), 3);
        assert_eq!(window.min_value(), Some(80.0));
    }

    #[test]
    fn test_window_extremes() {
        let mut window = Window::default();
        assert_eq!(window.min_value(), None);
        assert_eq!(window.max_value(), None);

        for v in [70.0, 160.0, 40.0] {
            window.push(sample(0, v));
        }
        assert_eq!(window.min_value(), Some(40.0));
        assert_eq!(window.max_value(), Some(160.0));
    }

    #[test]
    fn test_critical_count() {
        let band = CriticalBand {
            low: Some(45.0),
            high: Some(120.0),
        };
        let mut window = Window::default();
        for v in [30.0, 70.0, 130.0, 45.0] {
            window.push(sample(0, v));
        }

        // 30 (low) and 130 (high) are critical; 45 sits on the bound
        assert_eq!(window.critical_count(&band), 2);
    }
}
