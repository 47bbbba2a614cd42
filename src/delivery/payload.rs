//! Outbound validator payload
//!
//! The validator's schema is strict: a `[day, month, year]` date triple,
//! a known `alert_message` string, and numeric-only metrics.

use std::collections::HashMap;

use chrono::{Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::engine::{AlertDirection, AlertStatus, AlertTransition};
use crate::vitals::VitalKind;

/// JSON body POSTed to a validator endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    /// UTC [day, month, year] of the transition
    pub timestamp: [u32; 3],
    pub alert_message: String,
    pub metrics: HashMap<String, f64>,
}

impl AlertPayload {
    pub fn from_transition(transition: &AlertTransition) -> Self {
        Self {
            timestamp: date_triple(transition.occurred_at),
            alert_message: alert_message(transition).to_string(),
            metrics: transition.metrics.clone(),
        }
    }
}

/// Wire name for a transition
pub fn alert_message(transition: &AlertTransition) -> &'static str {
    match transition.status {
        AlertStatus::Resolved => "resolved",
        AlertStatus::Entered => match (transition.kind, transition.direction) {
            (VitalKind::Spo2, _) => "oxy_low",
            (VitalKind::Bpm, Some(AlertDirection::LowCritical)) => "bpm_really_low",
            (VitalKind::Bpm, _) => "bpm_really_high",
        },
    }
}

fn date_triple(epoch_ms: i64) -> [u32; 3] {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => [dt.day(), dt.month(), dt.year() as u32],
        None => [1, 1, 1970],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResolveReason;

    fn transition(
        kind: VitalKind,
        status: AlertStatus,
        direction: Option<AlertDirection>,
    ) -> AlertTransition {
        AlertTransition {
            stream_id: "patient-1".to_string(),
            kind,
            status,
            direction,
            reason: None,
            metrics: HashMap::new(),
            // 2023-11-14T22:13:20Z
            occurred_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_alert_message_mapping() {
        assert_eq!(
            alert_message(&transition(
                VitalKind::Bpm,
                AlertStatus::Entered,
                Some(AlertDirection::HighCritical)
            )),
            "bpm_really_high"
        );
        assert_eq!(
            alert_message(&transition(
                VitalKind::Bpm,
                AlertStatus::Entered,
                Some(AlertDirection::LowCritical)
            )),
            "bpm_really_low"
        );
        assert_eq!(
            alert_message(&transition(
                VitalKind::Spo2,
                AlertStatus::Entered,
                Some(AlertDirection::LowCritical)
            )),
            "oxy_low"
        );
        assert_eq!(
            alert_message(&transition(VitalKind::Bpm, AlertStatus::Resolved, None)),
            "resolved"
        );
    }

    #[test]
    fn test_date_triple_is_day_month_year() {
        assert_eq!(date_triple(1_700_000_000_000), [14, 11, 2023]);
        // epoch zero
        assert_eq!(date_triple(0), [1, 1, 1970]);
    }

    #[test]
    fn test_payload_shape() {
        let mut t = transition(
            VitalKind::Spo2,
            AlertStatus::Entered,
            Some(AlertDirection::LowCritical),
        );
        t.metrics.insert("spo2_min".to_string(), 82.0);
        t.metrics.insert("window_sec".to_string(), 6.0);

        let payload = AlertPayload::from_transition(&t);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["alert_message"], "oxy_low");
        assert_eq!(json["timestamp"], serde_json::json!([14, 11, 2023]));
        assert_eq!(json["metrics"]["spo2_min"], 82.0);
    }

    #[test]
    fn test_stale_resolve_payload_is_numeric_only() {
        let mut t = transition(VitalKind::Bpm, AlertStatus::Resolved, None);
        t.reason = Some(ResolveReason::Stale);
        t.metrics.insert("window_sec".to_string(), 6.0);
        t.metrics.insert("stale".to_string(), 1.0);

        let json = serde_json::to_value(AlertPayload::from_transition(&t)).unwrap();
        assert_eq!(json["alert_message"], "resolved");
        for (_, value) in json["metrics"].as_object().unwrap() {
            assert!(value.is_number());
        }
    }
}
