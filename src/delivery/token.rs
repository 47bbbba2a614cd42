//! Cached validator credential

use parking_lot::RwLock;

/// Process-wide bearer-token cache
///
/// Two states: absent and cached. Read by every delivery attempt, written
/// only on fetch and invalidate. Concurrent first fetches may race; both
/// tokens are valid, so last writer wins.
#[derive(Default)]
pub struct TokenCache {
    token: RwLock<Option<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn store(&self, token: String) {
        *self.token.write() = Some(token);
    }

    pub fn invalidate(&self) {
        *self.token.write() = None;
    }
}

/// Pull the token out of whichever response shape the auth service uses:
/// `token`, `access_token`, or `data.token`. A present-but-empty or
/// non-string field falls through to the next shape.
pub fn extract_token(body: &serde_json::Value) -> Option<String> {
    [
        body.get("token"),
        body.get("access_token"),
        body.get("data").and_then(|d| d.get("token")),
    ]
    .into_iter()
    .flatten()
    .filter_map(|v| v.as_str())
    .find(|s| !s.is_empty())
    .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_lifecycle() {
        let cache = TokenCache::new();
        assert_eq!(cache.get(), None);

        cache.store("tok-1".to_string());
        assert_eq!(cache.get(), Some("tok-1".to_string()));

        cache.invalidate();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_extract_token_shapes() {
        assert_eq!(
            extract_token(&json!({"token": "abc"})),
            Some("abc".to_string())
        );
        assert_eq!(
            extract_token(&json!({"access_token": "def"})),
            Some("def".to_string())
        );
        assert_eq!(
            extract_token(&json!({"data": {"token": "ghi"}})),
            Some("ghi".to_string())
        );
    }

    #[test]
    fn test_extract_token_misses() {
        assert_eq!(extract_token(&json!({})), None);
        assert_eq!(extract_token(&json!({"message": "nope"})), None);
        assert_eq!(extract_token(&json!({"token": 42})), None);
        assert_eq!(extract_token(&json!({"token": ""})), None);
    }

    #[test]
    fn test_extract_token_falls_through_null() {
        assert_eq!(
            extract_token(&json!({"token": null, "access_token": "def"})),
            Some("def".to_string())
        );
        assert_eq!(
            extract_token(&json!({"token": "", "data": {"token": "ghi"}})),
            Some("ghi".to_string())
        );
    }
}
