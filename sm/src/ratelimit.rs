//! Per-tool token bucket rate limiting
//!
//! Every tool gets its own bucket, created lazily and seeded at full
//! capacity. Buckets refill continuously: a partial window adds a
//! proportional fraction of the capacity, a full window (or more) restores
//! the bucket completely.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Window shared by all built-in limits
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Capacity and refill window for one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Maximum number of tokens (calls) in the bucket
    pub capacity: u32,

    /// Time to refill an empty bucket
    #[serde(rename = "windowMs", serialize_with = "serialize_millis")]
    pub window: Duration,
}

fn serialize_millis<S: serde::Serializer>(window: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(window.as_millis() as u64)
}

impl RateLimitConfig {
    pub const fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window }
    }

    pub const fn per_minute(capacity: u32) -> Self {
        Self::new(capacity, DEFAULT_WINDOW)
    }

    /// Seconds a denied caller is told to wait: always the whole window
    pub fn retry_after_secs(&self) -> u64 {
        let millis = self.window.as_millis() as u64;
        millis.div_ceil(1000)
    }
}

/// Outcome of a `check_limit` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitDecision {
    pub allowed: bool,
    pub retry_after_secs: Option<u64>,
    pub limit: Option<RateLimitConfig>,
}

impl LimitDecision {
    fn unlimited() -> Self {
        Self {
            allowed: true,
            retry_after_secs: None,
            limit: None,
        }
    }
}

/// Read-only view of a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketStatus {
    /// Whole tokens currently available
    pub tokens: u32,
    pub limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: f64::from(config.capacity),
            last_refill: now,
        }
    }

    fn refill(&mut self, config: &RateLimitConfig, now: Instant) {
        let capacity = f64::from(config.capacity);
        let elapsed = now.saturating_duration_since(self.last_refill);

        if elapsed >= config.window {
            self.tokens = capacity;
        } else {
            let added = capacity * (elapsed.as_secs_f64() / config.window.as_secs_f64());
            self.tokens = (self.tokens + added).min(capacity);
        }
        self.last_refill = now;
    }
}

/// Token bucket limiter keyed by tool name
#[derive(Debug)]
pub struct RateLimiter {
    limits: HashMap<String, RateLimitConfig>,
    default_limit: RateLimitConfig,
    buckets: DashMap<String, Bucket>,
    enabled: AtomicBool,
}

impl RateLimiter {
    /// Limiter with the built-in per-tool table
    pub fn new(enabled: bool) -> Self {
        let limits = [
            ("search_contacts", 20),
            ("retrieve_all_contacts", 20),
            ("get_contact_properties", 30),
            ("create_note", 30),
            ("update_note", 30),
            ("retrieve_notes", 30),
            ("create_task", 30),
            ("update_task", 30),
            ("retrieve_all_tasks", 20),
        ]
        .into_iter()
        .map(|(name, capacity)| (name.to_string(), RateLimitConfig::per_minute(capacity)))
        .collect();

        Self::with_limits(enabled, limits, RateLimitConfig::per_minute(10))
    }

    /// Limiter with a custom table and fallback
    pub fn with_limits(enabled: bool, limits: HashMap<String, RateLimitConfig>, default_limit: RateLimitConfig) -> Self {
        info!(enabled, tools = limits.len(), "Rate limiter initialized");
        Self {
            limits,
            default_limit,
            buckets: DashMap::new(),
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Rate limiting status changed");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Limit applied to `tool_name`, falling back to the default
    pub fn limit_for(&self, tool_name: &str) -> RateLimitConfig {
        self.limits.get(tool_name).copied().unwrap_or(self.default_limit)
    }

    /// Consume one token for `tool_name` if available
    pub fn check_limit(&self, tool_name: &str) -> LimitDecision {
        self.check_limit_at(tool_name, Instant::now())
    }

    pub fn check_limit_at(&self, tool_name: &str, now: Instant) -> LimitDecision {
        debug!(%tool_name, "RateLimiter::check_limit: called");
        if !self.is_enabled() {
            return LimitDecision::unlimited();
        }

        let config = self.limit_for(tool_name);

        // the entry guard holds the shard lock for the whole refill + decrement
        let mut bucket = self
            .buckets
            .entry(tool_name.to_string())
            .or_insert_with(|| Bucket::full(&config, now));
        bucket.refill(&config, now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return LimitDecision {
                allowed: true,
                retry_after_secs: None,
                limit: Some(config),
            };
        }
        drop(bucket);

        let retry_after = config.retry_after_secs();
        warn!(
            %tool_name,
            capacity = config.capacity,
            window_ms = config.window.as_millis() as u64,
            retry_after,
            "Rate limit exceeded"
        );

        LimitDecision {
            allowed: false,
            retry_after_secs: Some(retry_after),
            limit: Some(config),
        }
    }

    /// Forget one bucket, or all of them
    pub fn reset(&self, tool_name: Option<&str>) {
        match tool_name {
            Some(name) => {
                self.buckets.remove(name);
                debug!(tool_name = %name, "Rate limit reset for tool");
            }
            None => {
                self.buckets.clear();
                debug!("All rate limits reset");
            }
        }
    }

    /// Refill and report a bucket without consuming a token
    pub fn status(&self, tool_name: &str) -> BucketStatus {
        self.status_at(tool_name, Instant::now())
    }

    pub fn status_at(&self, tool_name: &str, now: Instant) -> BucketStatus {
        let config = self.limit_for(tool_name);

        match self.buckets.get_mut(tool_name) {
            Some(mut bucket) => {
                bucket.refill(&config, now);
                BucketStatus {
                    tokens: bucket.tokens.floor() as u32,
                    limit: config,
                }
            }
            None => BucketStatus {
                tokens: config.capacity,
                limit: config,
            },
        }
    }

    /// Number of buckets created so far
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn limiter(capacity: u32, window_ms: u64) -> RateLimiter {
        let mut limits = HashMap::new();
        limits.insert(
            "tool".to_string(),
            RateLimitConfig::new(capacity, Duration::from_millis(window_ms)),
        );
        RateLimiter::with_limits(true, limits, RateLimitConfig::per_minute(10))
    }

    #[test]
    fn test_capacity_then_denied() {
        let limiter = limiter(5, 60_000);
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_limit_at("tool", now).allowed);
        }

        let denied = limiter.check_limit_at("tool", now);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, Some(60));
        assert_eq!(denied.limit.unwrap().capacity, 5);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let limiter = limiter(1, 1_500);
        let now = Instant::now();

        assert!(limiter.check_limit_at("tool", now).allowed);
        assert_eq!(limiter.check_limit_at("tool", now).retry_after_secs, Some(2));
    }

    #[test]
    fn test_full_window_restores_bucket() {
        let limiter = limiter(3, 1_000);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_limit_at("tool", start).allowed);
        }
        assert!(!limiter.check_limit_at("tool", start).allowed);

        let later = start + Duration::from_millis(1_000);
        assert_eq!(limiter.status_at("tool", later).tokens, 3);
        for _ in 0..3 {
            assert!(limiter.check_limit_at("tool", later).allowed);
        }
    }

    #[test]
    fn test_partial_refill_is_proportional() {
        let limiter = limiter(10, 10_000);
        let start = Instant::now();

        for _ in 0..10 {
            assert!(limiter.check_limit_at("tool", start).allowed);
        }

        // 30% of the window returns 3 tokens
        let later = start + Duration::from_millis(3_000);
        assert_eq!(limiter.status_at("tool", later).tokens, 3);
    }

    #[test]
    fn test_status_does_not_consume() {
        let limiter = limiter(2, 60_000);
        let now = Instant::now();

        assert!(limiter.check_limit_at("tool", now).allowed);
        assert_eq!(limiter.status_at("tool", now).tokens, 1);
        assert_eq!(limiter.status_at("tool", now).tokens, 1);
        assert!(limiter.check_limit_at("tool", now).allowed);
        assert_eq!(limiter.status_at("tool", now).tokens, 0);
    }

    #[test]
    fn test_status_of_unseen_tool_is_full_without_bucket() {
        let limiter = RateLimiter::new(true);
        let status = limiter.status("create_task");

        assert_eq!(status.tokens, 30);
        assert_eq!(limiter.bucket_count(), 0);
    }

    #[test]
    fn test_unknown_tool_uses_default_limit() {
        let limiter = RateLimiter::new(true);
        assert_eq!(limiter.limit_for("no_such_tool").capacity, 10);
        assert_eq!(limiter.limit_for("search_contacts").capacity, 20);
        assert_eq!(limiter.limit_for("create_note").capacity, 30);
    }

    #[test]
    fn test_disabled_always_allows() {
        let limiter = limiter(1, 60_000);
        limiter.set_enabled(false);
        let now = Instant::now();

        for _ in 0..100 {
            let decision = limiter.check_limit_at("tool", now);
            assert!(decision.allowed);
            assert!(decision.limit.is_none());
        }
        assert_eq!(limiter.bucket_count(), 0);

        limiter.set_enabled(true);
        assert!(limiter.check_limit_at("tool", now).allowed);
        assert!(!limiter.check_limit_at("tool", now).allowed);
    }

    #[test]
    fn test_buckets_are_independent_per_tool() {
        let limiter = RateLimiter::new(true);
        let now = Instant::now();

        for _ in 0..20 {
            assert!(limiter.check_limit_at("search_contacts", now).allowed);
        }
        assert!(!limiter.check_limit_at("search_contacts", now).allowed);
        assert!(limiter.check_limit_at("create_task", now).allowed);
        assert_eq!(limiter.bucket_count(), 2);
    }

    #[test]
    fn test_reset_single_and_all() {
        let limiter = limiter(1, 60_000);
        let now = Instant::now();

        assert!(limiter.check_limit_at("tool", now).allowed);
        assert!(limiter.check_limit_at("other", now).allowed);
        assert!(!limiter.check_limit_at("tool", now).allowed);

        limiter.reset(Some("tool"));
        assert!(limiter.check_limit_at("tool", now).allowed);
        assert_eq!(limiter.bucket_count(), 2);

        limiter.reset(None);
        assert_eq!(limiter.bucket_count(), 0);
    }

    #[test]
    fn test_limit_config_serializes_window_in_millis() {
        let json = serde_json::to_value(RateLimitConfig::per_minute(20)).unwrap();
        assert_eq!(json, serde_json::json!({"capacity": 20, "windowMs": 60000}));
    }

    #[test]
    fn test_concurrent_calls_never_over_admit() {
        let limiter = Arc::new(limiter(50, 3_600_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..20).filter(|_| limiter.check_limit("tool").allowed).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    proptest! {
        #[test]
        fn prop_partial_refill_bounded(capacity in 1u32..200, used in 0u32..200, elapsed_ms in 0u64..60_000) {
            let used = used.min(capacity);
            let limiter = limiter(capacity, 60_000);
            let start = Instant::now();

            for _ in 0..used {
                prop_assert!(limiter.check_limit_at("tool", start).allowed);
            }
            let before = f64::from(capacity - used);
            let added = f64::from(capacity) * (elapsed_ms as f64 / 60_000.0);

            let status = limiter.status_at("tool", start + Duration::from_millis(elapsed_ms));
            prop_assert!(status.tokens <= capacity);
            prop_assert!(f64::from(status.tokens) <= before + added);
            prop_assert!(status.tokens >= capacity - used);
        }
    }
}
