//! Per-stream state registry
//!
//! One entry per stream id, created lazily on first sample. Each entry holds
//! an independently locked state per vital kind, so BPM and SPO2 traffic for
//! the same patient never contend. Entry mutexes are leaf locks: held only
//! for the observe/evaluate critical section, never across an await.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use super::window::StreamVitalState;
use crate::vitals::VitalKind;

/// All tracked state for one stream id
pub struct StreamEntry {
    pub bpm: Mutex<StreamVitalState>,
    pub spo2: Mutex<StreamVitalState>,
}

impl StreamEntry {
    fn new() -> Self {
        Self {
            bpm: Mutex::new(StreamVitalState::default()),
            spo2: Mutex::new(StreamVitalState::default()),
        }
    }

    /// The lock guarding the state for one vital kind
    pub fn state(&self, kind: VitalKind) -> &Mutex<StreamVitalState> {
        match kind {
            VitalKind::Bpm => &self.bpm,
            VitalKind::Spo2 => &self.spo2,
        }
    }
}

/// Concurrent map of stream id to tracked state
pub struct StreamRegistry {
    streams: DashMap<String, Arc<StreamEntry>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }

    /// Fetch the entry for a stream, creating it on first contact
    pub fn get_or_init(&self, stream_id: &str) -> Arc<StreamEntry> {
        self.streams
            .entry(stream_id.to_string())
            .or_insert_with(|| Arc::new(StreamEntry::new()))
            .clone()
    }

    pub fn get(&self, stream_id: &str) -> Option<Arc<StreamEntry>> {
        self.streams.get(stream_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Clone out all entries so callers can lock them without holding
    /// dashmap shard locks
    pub fn entries(&self) -> Vec<(String, Arc<StreamEntry>)> {
        self.streams
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Serializable view of every stream, sorted by id for stable output
    pub fn snapshots(&self, now_ms: i64) -> Vec<StreamSnapshot> {
        let mut snapshots: Vec<StreamSnapshot> = self
            .entries()
            .into_iter()
            .map(|(stream_id, entry)| StreamSnapshot::capture(stream_id, &entry, now_ms))
            .collect();
        snapshots.sort_by(|a, b| a.stream_id.cmp(&b.stream_id));
        snapshots
    }

    /// Serializable view of one stream, if it has been seen
    pub fn snapshot_of(&self, stream_id: &str, now_ms: i64) -> Option<StreamSnapshot> {
        self.get(stream_id)
            .map(|entry| StreamSnapshot::capture(stream_id.to_string(), &entry, now_ms))
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamSnapshot {
    pub stream_id: String,
    pub bpm: VitalStateSnapshot,
    pub spo2: VitalStateSnapshot,
}

impl StreamSnapshot {
    fn capture(stream_id: String, entry: &StreamEntry, now_ms: i64) -> Self {
        Self {
            stream_id,
            bpm: VitalStateSnapshot::capture(&entry.bpm.lock(), now_ms),
            spo2: VitalStateSnapshot::capture(&entry.spo2.lock(), now_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VitalStateSnapshot {
    pub in_alert: bool,
    pub window_len: usize,
    pub last_sample_at: i64,
    pub last_transition_at: i64,
    /// Milliseconds since the last sample, absent before the first one
    pub silent_for_ms: Option<i64>,
}

impl VitalStateSnapshot {
    fn capture(state: &StreamVitalState, now_ms: i64) -> Self {
        Self {
            in_alert: state.in_alert,
            window_len: state.window.len(),
            last_sample_at: state.last_sample_at,
            last_transition_at: state.last_transition_at,
            silent_for_ms: (state.last_sample_at > 0).then(|| now_ms - state.last_sample_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::Sample;

    #[test]
    fn test_get_or_init_returns_same_entry() {
        let registry = StreamRegistry::new();

        let first = registry.get_or_init("patient-1");
        let second = registry.get_or_init("patient-1");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_streams_are_isolated() {
        let registry = StreamRegistry::new();

        let a = registry.get_or_init("patient-a");
        let b = registry.get_or_init("patient-b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        a.bpm.lock().in_alert = true;
        assert!(!b.bpm.lock().in_alert);
    }

    #[test]
    fn test_get_unknown_stream() {
        let registry = StreamRegistry::new();
        assert!(registry.get("nobody").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshots_reflect_state() {
        let registry = StreamRegistry::new();
        let now = 1_700_000_000_000;

        let entry = registry.get_or_init("patient-1");
        {
            let mut state = entry.bpm.lock();
            state.observe(
                Sample {
                    observed_at: now - 2_000,
                    value: 80.0,
                    unit: "bpm".to_string(),
                    source_ts: None,
                },
                now - 2_000,
                6_000,
            );
        }

        let snapshots = registry.snapshots(now);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].stream_id, "patient-1");
        assert_eq!(snapshots[0].bpm.window_len, 1);
        assert_eq!(snapshots[0].bpm.silent_for_ms, Some(2_000));
        assert_eq!(snapshots[0].spo2.window_len, 0);
        assert_eq!(snapshots[0].spo2.silent_for_ms, None);
    }

    #[test]
    fn test_snapshot_of_single_stream() {
        let registry = StreamRegistry::new();
        registry.get_or_init("patient-1");

        assert!(registry.snapshot_of("patient-1", 0).is_some());
        assert!(registry.snapshot_of("patient-2", 0).is_none());
    }

    #[test]
    fn test_snapshots_sorted_by_stream_id() {
        let registry = StreamRegistry::new();
        registry.get_or_init("zulu");
        registry.get_or_init("alpha");
        registry.get_or_init("mike");

        let snapshots = registry.snapshots(0);
        let ids: Vec<&str> = snapshots.iter().map(|s| s.stream_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mike", "zulu"]);
    }
}
