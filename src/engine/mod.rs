//! Windowed hysteresis alert engine
//!
//! Owns per-stream state and turns a firehose of vital-sign samples into a
//! trickle of alert transitions. Ingestion is lock-cheap and synchronous;
//! transitions leave through a bounded queue so a slow delivery path can
//! never stall the hot path.

pub mod config;
pub mod detector;
pub mod registry;
pub mod sweeper;
pub mod window;

pub use config::{CriticalBand, EngineConfig, ValidRange};
pub use detector::{AlertDirection, AlertStatus, AlertTransition, ResolveReason};
pub use registry::{StreamRegistry, StreamSnapshot, VitalStateSnapshot};
pub use sweeper::StalenessSweeper;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::vitals::{VitalEvent, VitalKind};

/// What happened to a submitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Admitted to the stream's window and evaluated; carries the status of
    /// any transition the sample triggered
    Accepted { transition: Option<AlertStatus> },
    /// Outside the physically plausible range; dropped before windowing
    Implausible,
}

/// Central engine: registry of stream states plus the transition queue
pub struct VitalsEngine {
    config: EngineConfig,
    registry: StreamRegistry,
    transitions: mpsc::Sender<AlertTransition>,
    /// Samples admitted to a window
    samples_accepted: AtomicU64,
    /// Samples rejected by the plausibility filter
    samples_discarded: AtomicU64,
    /// Alert entries fired
    alerts_entered: AtomicU64,
    /// Alerts resolved by recovery
    alerts_recovered: AtomicU64,
    /// Alerts force-resolved by the staleness sweeper
    alerts_stale_resolved: AtomicU64,
    /// Transitions dropped because the delivery queue was full
    transitions_dropped: AtomicU64,
}

impl VitalsEngine {
    pub fn new(config: EngineConfig, transitions: mpsc::Sender<AlertTransition>) -> Self {
        Self {
            config,
            registry: StreamRegistry::new(),
            transitions,
            samples_accepted: AtomicU64::new(0),
            samples_discarded: AtomicU64::new(0),
            alerts_entered: AtomicU64::new(0),
            alerts_recovered: AtomicU64::new(0),
            alerts_stale_resolved: AtomicU64::new(0),
            transitions_dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Admit one event: plausibility-check it, window it, evaluate the rules
    ///
    /// Any resulting transition is queued for delivery. A full queue drops
    /// the transition rather than blocking ingestion.
    pub fn ingest(&self, event: &VitalEvent, now_ms: i64) -> IngestOutcome {
        if !self.config.valid_range(event.kind).contains(event.value) {
            self.samples_discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                stream_id = %event.stream_id,
                kind = %event.kind,
                value = event.value,
                "Dropping implausible reading"
            );
            return IngestOutcome::Implausible;
        }

        let entry = self.registry.get_or_init(&event.stream_id);
        let transition = {
            let mut state = entry.state(event.kind).lock();
            state.observe(event.to_sample(now_ms), now_ms, self.config.window_ms());
            detector::evaluate(&event.stream_id, event.kind, &mut state, &self.config, now_ms)
        };
        self.samples_accepted.fetch_add(1, Ordering::Relaxed);
        let status = transition.as_ref().map(|t| t.status);

        if let Some(transition) = transition {
            match transition.status {
                AlertStatus::Entered => {
                    self.alerts_entered.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        stream_id = %transition.stream_id,
                        kind = %transition.kind,
                        direction = ?transition.direction,
                        "Alert entered"
                    );
                }
                AlertStatus::Resolved => {
                    self.alerts_recovered.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        stream_id = %transition.stream_id,
                        kind = %transition.kind,
                        "Alert resolved"
                    );
                }
            }
            self.publish(transition);
        }

        IngestOutcome::Accepted { transition: status }
    }

    /// Force-resolve alerts whose stream has gone silent
    ///
    /// The window is discarded so a reappearing stream starts clean;
    /// `last_transition_at` is left as-is, so a stream that comes back
    /// critical after the cooldown can re-enter promptly. Returns the number
    /// of alerts resolved.
    pub fn sweep_stale(&self, now_ms: i64) -> usize {
        let stale_ms = self.config.stale_timeout_ms();
        let mut resolved = 0;

        for (stream_id, entry) in self.registry.entries() {
            for kind in VitalKind::ALL {
                let fired = {
                    let mut state = entry.state(kind).lock();
                    if state.in_alert && now_ms - state.last_sample_at > stale_ms {
                        state.in_alert = false;
                        state.window.clear();
                        true
                    } else {
                        false
                    }
                };

                if fired {
                    resolved += 1;
                    self.alerts_stale_resolved.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(stream_id = %stream_id, kind = %kind, "Auto-resolving stale alert");

                    let mut metrics = HashMap::new();
                    metrics.insert("window_sec".to_string(), self.config.window_secs());
                    metrics.insert("stale".to_string(), 1.0);
                    self.publish(AlertTransition {
                        stream_id: stream_id.clone(),
                        kind,
                        status: AlertStatus::Resolved,
                        direction: None,
                        reason: Some(ResolveReason::Stale),
                        metrics,
                        occurred_at: now_ms,
                    });
                }
            }
        }

        resolved
    }

    /// Get engine counters
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            tracked_streams: self.registry.len(),
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            samples_discarded: self.samples_discarded.load(Ordering::Relaxed),
            alerts_entered: self.alerts_entered.load(Ordering::Relaxed),
            alerts_recovered: self.alerts_recovered.load(Ordering::Relaxed),
            alerts_stale_resolved: self.alerts_stale_resolved.load(Ordering::Relaxed),
            transitions_dropped: self.transitions_dropped.load(Ordering::Relaxed),
        }
    }

    fn publish(&self, transition: AlertTransition) {
        if let Err(e) = self.transitions.try_send(transition) {
            self.transitions_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "Delivery queue full, dropping transition");
        }
    }
}

/// Engine statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStats {
    /// Stream ids seen so far
    pub tracked_streams: usize,
    /// Samples admitted to a window
    pub samples_accepted: u64,
    /// Samples rejected by the plausibility filter
    pub samples_discarded: u64,
    /// Alert entries fired
    pub alerts_entered: u64,
    /// Alerts resolved by recovery
    pub alerts_recovered: u64,
    /// Alerts force-resolved as stale
    pub alerts_stale_resolved: u64,
    /// Transitions dropped on a full delivery queue
    pub transitions_dropped: u64,
}
