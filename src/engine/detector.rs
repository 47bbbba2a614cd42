//! Hysteresis decision engine
//!
//! Evaluated once after every observe. Entry demands a high critical ratio
//! over a populated window plus an elapsed cooldown; exit demands a much
//! lower ratio plus a short hold time. The gap between the two ratios is
//! what keeps a noisy borderline signal from flapping.

use std::collections::HashMap;

use serde::Serialize;

use super::config::{CriticalBand, EngineConfig};
use super::window::StreamVitalState;
use crate::vitals::VitalKind;

/// Whether a transition enters or leaves the alerting state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Entered,
    Resolved,
}

/// Which side of the critical band triggered an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDirection {
    LowCritical,
    HighCritical,
}

/// Why an alert resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveReason {
    /// The window ratio dropped below the exit threshold
    Recovered,
    /// No samples arrived within the staleness timeout
    Stale,
}

/// A state change produced by the decision engine or the staleness sweeper
///
/// Value object: no identity beyond its fields. `metrics` carries numeric
/// window summaries only, matching what the downstream validator accepts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertTransition {
    pub stream_id: String,
    pub kind: VitalKind,
    pub status: AlertStatus,
    pub direction: Option<AlertDirection>,
    pub reason: Option<ResolveReason>,
    pub metrics: HashMap<String, f64>,
    /// Epoch ms when the transition fired
    pub occurred_at: i64,
}

/// Evaluate the enter/exit rules for one state, immediately after an observe
///
/// Returns at most one transition. The `in_alert` guard makes the two rules
/// mutually exclusive, and re-evaluating an unchanged window never fires a
/// second time.
pub fn evaluate(
    stream_id: &str,
    kind: VitalKind,
    state: &mut StreamVitalState,
    config: &EngineConfig,
    now_ms: i64,
) -> Option<AlertTransition> {
    let band = config.critical_band(kind);
    let total = state.window.len();
    let critical = state.window.critical_count(&band);
    let ratio = if total > 0 {
        critical as f64 / total as f64
    } else {
        0.0
    };

    if !state.in_alert
        && total >= config.min_samples
        && ratio >= config.enter_ratio
        && now_ms - state.last_transition_at > config.cooldown_ms()
    {
        state.in_alert = true;
        state.last_transition_at = now_ms;

        return Some(AlertTransition {
            stream_id: stream_id.to_string(),
            kind,
            status: AlertStatus::Entered,
            direction: Some(entry_direction(kind, state, &band)),
            reason: None,
            metrics: entry_metrics(kind, state, config),
            occurred_at: now_ms,
        });
    }

    if state.in_alert
        && total >= config.min_samples
        && ratio < config.exit_ratio
        && now_ms - state.last_transition_at > config.min_exit_delay_ms()
    {
        state.in_alert = false;
        state.last_transition_at = now_ms;

        let mut metrics = HashMap::new();
        metrics.insert("window_sec".to_string(), config.window_secs());

        return Some(AlertTransition {
            stream_id: stream_id.to_string(),
            kind,
            status: AlertStatus::Resolved,
            direction: None,
            reason: Some(ResolveReason::Recovered),
            metrics,
            occurred_at: now_ms,
        });
    }

    None
}

/// For the two-sided BPM predicate the triggering extreme decides the side;
/// SPO2 only has a low side
fn entry_direction(
    kind: VitalKind,
    state: &StreamVitalState,
    band: &CriticalBand,
) -> AlertDirection {
    match kind {
        VitalKind::Spo2 => AlertDirection::LowCritical,
        VitalKind::Bpm => {
            let low_breach = match (state.window.min_value(), band.low) {
                (Some(min), Some(lo)) => min < lo,
                _ => false,
            };
            if low_breach {
                AlertDirection::LowCritical
            } else {
                AlertDirection::HighCritical
            }
        }
    }
}

fn entry_metrics(
    kind: VitalKind,
    state: &StreamVitalState,
    config: &EngineConfig,
) -> HashMap<String, f64> {
    let mut metrics = HashMap::new();
    metrics.insert("window_sec".to_string(), config.window_secs());

    match kind {
        VitalKind::Bpm => {
            if let Some(min) = state.window.min_value() {
                metrics.insert("bpm_min".to_string(), min);
            }
            if let Some(max) = state.window.max_value() {
                metrics.insert("bpm_max".to_string(), max);
            }
        }
        VitalKind::Spo2 => {
            if let Some(min) = state.window.min_value() {
                metrics.insert("spo2_min".to_string(), min);
            }
        }
    }

    metrics
}
