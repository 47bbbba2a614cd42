//! Holter: Streaming Vital-Sign Alert Engine
//!
//! Ingests BPM and SpO2 readings over HTTP, detects sustained critical
//! episodes with windowed hysteresis, and ships the resulting alert
//! transitions to downstream validators with token auth and failover.
//!
//! # Features
//!
//! - **Windowed Hysteresis**: Transitions fire on critical-sample ratios over a trailing window
//! - **Per-Stream State**: Independent BPM and SpO2 tracking for every monitored stream
//! - **Flap Damping**: Cooldown and minimum exit delay suppress rapid re-transitions
//! - **Staleness Sweep**: Active alerts auto-resolve when a stream goes silent
//! - **Ordered Fan-Out**: Delivery walks endpoints in order, stopping at the first success
//! - **Token Caching**: Bearer tokens are fetched once and reused until rejected
//! - **Bounded Queueing**: A slow delivery path never stalls ingestion
//!
//! # Example
//!
//! ```no_run
//! use holter::engine::{EngineConfig, VitalsEngine};
//! use holter::vitals::{VitalEvent, VitalKind};
//! use tokio::sync::mpsc;
//!
//! let (transitions_tx, _transitions_rx) = mpsc::channel(64);
//! let engine = VitalsEngine::new(EngineConfig::default(), transitions_tx);
//!
//! // Feed a reading; any transition it triggers leaves through the channel
//! let event = VitalEvent {
//!     kind: VitalKind::Bpm,
//!     stream_id: "patient-7".to_string(),
//!     value: 142.0,
//!     unit: Some("bpm".to_string()),
//!     timestamp: None,
//! };
//! let now = chrono::Utc::now().timestamp_millis();
//! let outcome = engine.ingest(&event, now);
//! println!("Outcome: {:?}", outcome);
//! ```

pub mod api;
pub mod delivery;
pub mod engine;
pub mod vitals;

// Re-export commonly used types
pub use delivery::{DeliveryClient, DeliveryConfig};
pub use engine::{AlertStatus, AlertTransition, EngineConfig, VitalsEngine};
pub use vitals::{VitalEvent, VitalKind};
