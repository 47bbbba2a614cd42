use std::time::Duration;

/// Alert delivery configuration
///
/// An empty endpoint list disables delivery entirely: transitions are still
/// computed and counted, just never shipped.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Downstream validator endpoints, tried in order
    pub endpoints: Vec<String>,
    /// Token endpoint
    pub auth_url: String,
    /// Tenant identifier sent verbatim in the token request
    pub house_id: String,
    /// Total per-request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Transition queue capacity between engine and worker
    pub queue_capacity: usize,
    /// Tries per endpoint for transport/5xx failures; the 401 re-auth retry
    /// is separate and always exactly once
    pub endpoint_attempts: u32,
    /// Pause between tries of the same endpoint
    pub retry_backoff: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![],
            auth_url: "http://localhost:3000/auth".to_string(),
            house_id: "house-1".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
            queue_capacity: 256,
            endpoint_attempts: 1,
            retry_backoff: Duration::from_millis(300),
        }
    }
}

impl DeliveryConfig {
    /// Build configuration from `HOLTER_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            endpoints: std::env::var("HOLTER_VALIDATOR_URLS")
                .map(|v| parse_url_list(&v))
                .unwrap_or_default(),
            auth_url: std::env::var("HOLTER_AUTH_URL").unwrap_or(defaults.auth_url),
            house_id: std::env::var("HOLTER_HOUSE_ID").unwrap_or(defaults.house_id),
            request_timeout: Duration::from_secs(env_u64("HOLTER_DELIVERY_TIMEOUT_SECS", 5)),
            connect_timeout: defaults.connect_timeout,
            queue_capacity: env_u64("HOLTER_DELIVERY_QUEUE", 256).max(1) as usize,
            endpoint_attempts: env_u64("HOLTER_ENDPOINT_ATTEMPTS", 1).max(1) as u32,
            retry_backoff: Duration::from_millis(env_u64("HOLTER_RETRY_BACKOFF_MS", 300)),
        }
    }

    /// Whether any downstream endpoint is configured
    pub fn enabled(&self) -> bool {
        !self.endpoints.is_empty()
    }
}

/// Split a comma-separated URL list, tolerating whitespace and empty entries
fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_u64(key: &str, default: u64) -> u64 {
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
        let config = DeliveryConfig::default();
        assert!(config.endpoints.is_empty());
        assert!(!config.enabled());
        assert_eq!(config.endpoint_attempts, 1);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_queue_capacity_never_zero() {
        // a zero-capacity mpsc channel panics at construction
        std::env::set_var("HOLTER_DELIVERY_QUEUE", "0");
        let config = DeliveryConfig::from_env();
        std::env::remove_var("HOLTER_DELIVERY_QUEUE");

        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_parse_url_list() {
        assert_eq!(
            parse_url_list("http://a/alert, http://b/alert"),
            vec!["http://a/alert".to_string(), "http://b/alert".to_string()]
        );
        assert_eq!(
            parse_url_list(" http://a/alert ,, "),
            vec!["http://a/alert".to_string()]
        );
        assert!(parse_url_list("").is_empty());
    }
}
