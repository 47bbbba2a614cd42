use serde::{Deserialize, Serialize};

/// Vital-sign category tracked by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalKind {
    #[serde(rename = "BPM")]
    Bpm,
    #[serde(rename = "SPO2")]
    Spo2,
}

impl VitalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalKind::Bpm => "BPM",
            VitalKind::Spo2 => "SPO2",
        }
    }

    /// All kinds the engine tracks per stream
    pub const ALL: [VitalKind; 2] = [VitalKind::Bpm, VitalKind::Spo2];
}

impl std::fmt::Display for VitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation stored in a stream's window
///
/// `observed_at` is the arrival time at this process, which is what windowing
/// and staleness are measured against. The sensor's own timestamp, when one
/// was sent and parseable, rides along as `source_ts` but drives no logic.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Arrival time in milliseconds since epoch
    pub observed_at: i64,
    pub value: f64,
    pub unit: String,
    /// Sensor-reported timestamp in epoch milliseconds, if parseable
    pub source_ts: Option<i64>,
}

/// Sensor timestamp as it appears on the wire
///
/// Epoch milliseconds (integral or fractional) or a string; any other shape
/// still parses, so a malformed timestamp alone never rejects an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
    Other(serde_json::Value),
}

impl SourceTimestamp {
    /// Best-effort conversion to epoch milliseconds
    ///
    /// Accepts a raw number (fractional values truncate), a numeric string,
    /// or an RFC 3339 string. Anything else yields `None`; the field is
    /// auxiliary and never a reason to reject the event.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            SourceTimestamp::Millis(ms) => Some(*ms),
            SourceTimestamp::Fractional(ms) => Some(*ms as i64),
            SourceTimestamp::Text(s) => s.parse::<i64>().ok().or_else(|| {
                chrono::DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            }),
            SourceTimestamp::Other(_) => None,
        }
    }
}

/// Normalized ingestion event as received from the transport
///
/// Deserialization enforces the rejection rule: events without `kind` or
/// `streamId`, with an unknown kind, or with a non-numeric `value` fail to
/// parse and are dropped by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct VitalEvent {
    pub kind: VitalKind,
    #[serde(rename = "streamId")]
    pub stream_id: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub timestamp: Option<SourceTimestamp>,
}

impl VitalEvent {
    /// Materialize the wire event into a stored sample arriving at `now_ms`
    pub fn to_sample(&self, now_ms: i64) -> Sample {
        Sample {
            observed_at: now_ms,
            value: self.value,
            unit: self.unit.clone().unwrap_or_default(),
            source_ts: self.timestamp.as_ref().and_then(|t| t.to_millis()),
        }
    }
}
