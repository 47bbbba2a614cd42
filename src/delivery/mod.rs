//! Alert delivery to downstream validators
//!
//! Transitions decided by the engine arrive over a bounded queue; a single
//! worker ships each one with a cached bearer token, trying endpoints in
//! order and stopping at the first success. Best-effort: a transition that
//! every endpoint refuses is logged and dropped, never retried later.

pub mod client;
pub mod config;
pub mod payload;
pub mod token;
pub mod worker;

pub use client::{DeliveryClient, DeliveryError, DeliveryOutcome, DeliveryStats};
pub use config::DeliveryConfig;
pub use payload::AlertPayload;
pub use token::TokenCache;
pub use worker::DeliveryWorker;
