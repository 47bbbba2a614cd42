use std::time::Duration;

use crate::vitals::VitalKind;

/// Criticality thresholds for one vital kind
///
/// A value is critical strictly outside the band: below `low` or above
/// `high`. BPM uses both bounds; SPO2 only a lower bound.
#[derive(Debug, Clone, Copy)]
pub struct CriticalBand {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl CriticalBand {
    pub fn is_critical(&self, value: f64) -> bool {
        self.low.map_or(false, |lo| value < lo) || self.high.map_or(false, |hi| value > hi)
    }
}

/// Physically-possible value range; readings outside it are sensor glitches
/// and are dropped before they reach the window
#[derive(Debug, Clone, Copy)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Detection engine configuration
///
/// All tunables default to the values the system shipped with; every one can
/// be overridden through `HOLTER_*` environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trailing confirmation window over which ratios are computed
    pub window: Duration,
    /// Minimum window population before any transition may fire
    pub min_samples: usize,
    /// Critical-sample fraction at or above which an alert enters
    pub enter_ratio: f64,
    /// Critical-sample fraction strictly below which an active alert exits
    pub exit_ratio: f64,
    /// Entry is suppressed within this duration of the previous transition
    pub cooldown: Duration,
    /// Exit is suppressed within this duration of the previous transition
    pub min_exit_delay: Duration,
    /// Silence duration after which an active alert is force-resolved
    pub stale_timeout: Duration,
    pub bpm_critical: CriticalBand,
    pub spo2_critical: CriticalBand,
    pub bpm_valid: ValidRange,
    pub spo2_valid: ValidRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(6),
            min_samples: 3,
            enter_ratio: 0.66,
            exit_ratio: 0.2,
            cooldown: Duration::from_secs(30),
            min_exit_delay: Duration::from_millis(1000),
            stale_timeout: Duration::from_secs(30),
            bpm_critical: CriticalBand {
                low: Some(45.0),
                high: Some(120.0),
            },
            spo2_critical: CriticalBand {
                low: Some(90.0),
                high: None,
            },
            bpm_valid: ValidRange {
                min: 25.0,
                max: 220.0,
            },
            spo2_valid: ValidRange {
                min: 0.0,
                max: 100.0,
            },
        }
    }
}

impl EngineConfig {
    /// Build configuration from `HOLTER_*` environment variables,
    /// falling back to defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        Self {
            window: Duration::from_secs(env_u64("HOLTER_WINDOW_SEC", 6)),
            min_samples: env_u64("HOLTER_MIN_SAMPLES", 3) as usize,
            enter_ratio: env_f64("HOLTER_ENTER_RATIO", 0.66),
            exit_ratio: env_f64("HOLTER_EXIT_RATIO", 0.2),
            cooldown: Duration::from_secs(env_u64("HOLTER_COOLDOWN_SEC", 30)),
            min_exit_delay: Duration::from_millis(env_u64("HOLTER_MIN_EXIT_DELAY_MS", 1000)),
            stale_timeout: Duration::from_secs(env_u64("HOLTER_STALE_SEC", 30)),
            bpm_critical: CriticalBand {
                low: Some(env_f64("HOLTER_BPM_MIN_CRIT", 45.0)),
                high: Some(env_f64("HOLTER_BPM_MAX_CRIT", 120.0)),
            },
            spo2_critical: CriticalBand {
                low: Some(env_f64("HOLTER_SPO2_MIN_CRIT", 90.0)),
                high: None,
            },
            bpm_valid: ValidRange {
                min: env_f64("HOLTER_BPM_MIN_VALID", 25.0),
                max: env_f64("HOLTER_BPM_MAX_VALID", 220.0),
            },
            spo2_valid: ValidRange {
                min: env_f64("HOLTER_SPO2_MIN_VALID", 0.0),
                max: env_f64("HOLTER_SPO2_MAX_VALID", 100.0),
            },
        }
    }

    pub fn critical_band(&self, kind: VitalKind) -> CriticalBand {
        match kind {
            VitalKind::Bpm => self.bpm_critical,
            VitalKind::Spo2 => self.spo2_critical,
        }
    }

    pub fn valid_range(&self, kind: VitalKind) -> ValidRange {
        match kind {
            VitalKind::Bpm => self.bpm_valid,
            VitalKind::Spo2 => self.spo2_valid,
        }
    }

    /// Sweep period: a third of the staleness timeout, floored at one second
    pub fn sweep_interval(&self) -> Duration {
        std::cmp::max(Duration::from_secs(1), self.stale_timeout / 3)
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown.as_millis() as i64
    }

    pub fn min_exit_delay_ms(&self) -> i64 {
        self.min_exit_delay.as_millis() as i64
    }

    pub fn stale_timeout_ms(&self) -> i64 {
        self.stale_timeout.as_millis() as i64
    }

    /// Window length in whole seconds, as reported in transition metrics
    pub fn window_secs(&self) -> f64 {
        self.window.as_secs() as f64
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.min_samples, 3);
        assert_eq!(config.window, Duration::from_secs(6));
        assert!(config.enter_ratio > config.exit_ratio);
    }

    #[test]
    fn test_bpm_band_is_strict() {
        let band = EngineConfig::default().bpm_critical;

        assert!(band.is_critical(44.9));
        assert!(band.is_critical(120.1));
        // boundary values are not critical
        assert!(!band.is_critical(45.0));
        assert!(!band.is_critical(120.0));
        assert!(!band.is_critical(72.0));
    }

    #[test]
    fn test_spo2_band_has_no_upper_bound() {
        let band = EngineConfig::default().spo2_critical;

        assert!(band.is_critical(89.9));
        assert!(!band.is_critical(90.0));
        assert!(!band.is_critical(100.0));
    }

    #[test]
    fn test_valid_range() {
        let range = EngineConfig::default().bpm_valid;

        assert!(range.contains(25.0));
        assert!(range.contains(220.0));
        assert!(!range.contains(24.9));
        assert!(!range.contains(300.0));
    }

    #[test]
    fn test_sweep_interval_floor() {
        let mut config = EngineConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(10));

        config.stale_timeout = Duration::from_secs(2);
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
