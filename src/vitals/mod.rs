//! Vital-sign data model
//!
//! Wire shapes and stored sample types shared by the ingestion surface and
//! the alert engine.

pub mod sample;

pub use sample::{Sample, SourceTimestamp, VitalEvent, VitalKind};
