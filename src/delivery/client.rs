//! Resilient delivery to downstream validators
//!
//! Endpoints are tried in configured order and the first 2xx wins. A 401
//! invalidates the cached token and retries the same endpoint exactly once
//! with a fresh one. Transport errors and non-2xx responses are equivalent:
//! both advance to the next endpoint. Nothing here ever returns an error to
//! the caller; every failure mode collapses into the outcome.

use std::sync::atomic::{AtomicU64, Ordering};

use super::config::DeliveryConfig;
use super::payload::AlertPayload;
use super::token::{extract_token, TokenCache};
use crate::engine::AlertTransition;

/// Where a delivery attempt ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by this endpoint
    Delivered { endpoint: String },
    /// No endpoints configured; transition computed but not shipped
    Skipped,
    /// Every endpoint refused or was unreachable; transition dropped
    Exhausted,
}

/// Delivery errors (internal to the token path)
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Auth request failed: {0}")]
    AuthRequest(String),

    #[error("Auth response was not JSON: {0}")]
    AuthResponse(String),

    #[error("No token in auth response")]
    MissingToken,
}

enum PostResult {
    Success,
    AuthRejected,
    Failed,
}

/// HTTP client for shipping transitions, with a cached bearer token
pub struct DeliveryClient {
    config: DeliveryConfig,
    http: reqwest::Client,
    token: TokenCache,
    /// Transitions accepted by some endpoint
    delivered: AtomicU64,
    /// Transitions computed while no endpoint was configured
    skipped: AtomicU64,
    /// Transitions dropped after every endpoint failed
    exhausted: AtomicU64,
    /// 401-triggered token refreshes
    auth_refreshes: AtomicU64,
    /// Token fetch attempts
    token_fetches: AtomicU64,
}

impl DeliveryClient {
    pub fn new(config: DeliveryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http,
            token: TokenCache::new(),
            delivered: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            auth_refreshes: AtomicU64::new(0),
            token_fetches: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Ship one transition, stopping at the first endpoint that accepts it
    pub async fn deliver(&self, transition: &AlertTransition) -> DeliveryOutcome {
        if !self.config.enabled() {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return DeliveryOutcome::Skipped;
        }

        let payload = AlertPayload::from_transition(transition);

        for endpoint in &self.config.endpoints {
            for attempt in 0..self.config.endpoint_attempts {
                if attempt > 0 {
                    tokio::time::sleep(self.config.retry_backoff).await;
                }

                if self.try_endpoint(endpoint, &payload).await {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        endpoint = %endpoint,
                        alert = %payload.alert_message,
                        "Alert delivered"
                    );
                    return DeliveryOutcome::Delivered {
                        endpoint: endpoint.clone(),
                    };
                }
            }
        }

        self.exhausted.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            stream_id = %transition.stream_id,
            kind = %transition.kind,
            alert = %payload.alert_message,
            "All endpoints failed, dropping transition"
        );
        DeliveryOutcome::Exhausted
    }

    /// One endpoint: authenticated POST with a single re-auth retry on 401
    async fn try_endpoint(&self, endpoint: &str, payload: &AlertPayload) -> bool {
        let token = self.ensure_token().await;

        match self.post(endpoint, payload, token.as_deref()).await {
            PostResult::Success => true,
            PostResult::AuthRejected => {
                self.token.invalidate();
                self.auth_refreshes.fetch_add(1, Ordering::Relaxed);
                let fresh = self.ensure_token().await;
                matches!(
                    self.post(endpoint, payload, fresh.as_deref()).await,
                    PostResult::Success
                )
            }
            PostResult::Failed => false,
        }
    }

    async fn post(
        &self,
        endpoint: &str,
        payload: &AlertPayload,
        token: Option<&str>,
    ) -> PostResult {
        let mut request = self.http.post(endpoint).json(payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                PostResult::AuthRejected
            }
            Ok(response) if response.status().is_success() => PostResult::Success,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    endpoint = %endpoint,
                    status = %status,
                    body = %body,
                    "Validator rejected alert"
                );
                PostResult::Failed
            }
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "Failed to reach validator");
                PostResult::Failed
            }
        }
    }

    /// Cached token, fetching if absent
    ///
    /// `None` means the fetch failed; the request goes out unauthenticated
    /// and the next delivery retries the fetch.
    async fn ensure_token(&self) -> Option<String> {
        if let Some(token) = self.token.get() {
            return Some(token);
        }

        match self.fetch_token().await {
            Ok(token) => {
                self.token.store(token.clone());
                Some(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token fetch failed");
                None
            }
        }
    }

    async fn fetch_token(&self) -> Result<String, DeliveryError> {
        self.token_fetches.fetch_add(1, Ordering::Relaxed);

        let body = serde_json::json!({ "house_id": self.config.house_id });
        let response = self
            .http
            .post(&self.config.auth_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::AuthRequest(e.to_string()))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DeliveryError::AuthResponse(e.to_string()))?;

        extract_token(&json).ok_or(DeliveryError::MissingToken)
    }

    /// Get delivery counters
    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            endpoints: self.config.endpoints.len(),
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            auth_refreshes: self.auth_refreshes.load(Ordering::Relaxed),
            token_fetches: self.token_fetches.load(Ordering::Relaxed),
        }
    }
}

/// Delivery statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeliveryStats {
    /// Configured endpoint count
    pub endpoints: usize,
    /// Transitions accepted downstream
    pub delivered: u64,
    /// Transitions computed with delivery disabled
    pub skipped: u64,
    /// Transitions dropped after exhausting all endpoints
    pub exhausted: u64,
    /// 401-triggered token refreshes
    pub auth_refreshes: u64,
    /// Token fetch attempts
    pub token_fetches: u64,
}
