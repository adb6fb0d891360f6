//! HTTP cache control module
//!
//! `ETag` generation, conditional request handling and the cache policies a
//! behaviour can carry.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate `ETag` using fast hashing
///
/// Returns a quoted `ETag` string, e.g. `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma separated list and the `*` wildcard.
/// Returns true if matched (should return 304).
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Managed cache policy attached to a behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Long-lived edge caching for build output
    CachingOptimized,
    /// Every request goes to the origin
    CachingDisabled,
}

impl CachePolicy {
    /// Default TTL in seconds
    pub const fn default_ttl(self) -> u32 {
        match self {
            Self::CachingOptimized => 86_400,
            Self::CachingDisabled => 0,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::CachingOptimized => format!("public, max-age={}", self.default_ttl()),
            Self::CachingDisabled => "no-store".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_consistency() {
        let etag1 = generate_etag(b"same content");
        let etag2 = generate_etag(b"same content");
        assert_eq!(etag1, etag2);
        assert!(etag1.starts_with('"') && etag1.ends_with('"'));
        assert_ne!(etag1, generate_etag(b"other content"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_cache_policy_header() {
        assert_eq!(
            CachePolicy::CachingOptimized.to_header_value(),
            "public, max-age=86400"
        );
        assert_eq!(CachePolicy::CachingDisabled.to_header_value(), "no-store");
    }
}
