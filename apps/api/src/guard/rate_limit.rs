//! Per-client-address rate limiting
//!
//! Sliding-window limiter keyed by client network origin. Each limiter
//! instance owns its own `(period, limit)` pair and its own counter map;
//! several instances can stack on one route (e.g. a coarse per-minute
//! ceiling plus a tight burst ceiling) and all must admit.
//!
//! Counters are per-key entries in a sharded concurrent map, created
//! lazily on first request and self-resetting as their timestamps age
//! out. An opportunistic sweep bounds memory growth from one-off clients.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{ApiError, ApiResult};
use crate::guard::{Guard, GuardContext, RateLimitStatus};

/// How often expired entries are swept from the counter map
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limit configuration for one limiter instance
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Label used in logs (e.g. "write", "reply-burst")
    pub key_prefix: String,
    /// Maximum number of requests allowed in the window
    pub limit: u32,
    /// Window size
    pub period: Duration,
}

impl RateLimitConfig {
    pub fn new(key_prefix: impl Into<String>, limit: u32, period_secs: u64) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            limit,
            period: Duration::from_secs(period_secs),
        }
    }

    /// General write ceiling: 30 requests per minute per address
    pub fn writes() -> Self {
        Self::new("write", 30, 60)
    }

    /// Reply creation ceiling: 10 per minute per address
    pub fn replies() -> Self {
        Self::new("reply", 10, 60)
    }

    /// Short-burst reply ceiling to smooth spikes: 3 per 10 seconds
    pub fn reply_burst() -> Self {
        Self::new("reply-burst", 3, 10)
    }

    /// Login/registration ceiling: 10 per minute per address
    pub fn auth() -> Self {
        Self::new("auth", 10, 60)
    }
}

/// Request timestamps for one client key within the current window
#[derive(Debug, Default)]
struct WindowEntry {
    timestamps: Vec<Instant>,
}

impl WindowEntry {
    /// Drop expired timestamps, then admit and record the request if the
    /// key is under the limit.
    ///
    /// Returns `Ok(remaining)` if admitted, `Err(retry_after_secs)` if
    /// rejected.
    fn check_and_record(&mut self, limit: u32, window: Duration, now: Instant) -> Result<u32, u64> {
        let window_start = now.checked_sub(window).unwrap_or(now);
        self.timestamps.retain(|&ts| ts > window_start);

        let current = self.timestamps.len() as u32;
        if current < limit {
            self.timestamps.push(now);
            Ok(limit - current - 1)
        } else if let Some(&oldest) = self.timestamps.first() {
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            Err(retry_after.as_secs().max(1))
        } else {
            Err(window.as_secs().max(1))
        }
    }

    fn is_expired(&self, window: Duration, now: Instant) -> bool {
        let window_start = now.checked_sub(window).unwrap_or(now);
        self.timestamps.iter().all(|&ts| ts <= window_start)
    }
}

/// Sliding-window rate limiter, one counter per distinct client key
///
/// Constructed once at startup and shared by handle into every chain that
/// needs it; concurrency is per-key via the sharded map, with no global
/// lock on the hot path.
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: DashMap<String, WindowEntry>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether a request from `key` is admitted
    ///
    /// Returns `Ok(remaining)` if admitted, `Err(retry_after_secs)` if
    /// the ceiling is exceeded.
    pub fn check(&self, key: &str) -> Result<u32, u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<u32, u64> {
        self.maybe_sweep(now);

        let mut entry = self.entries.entry(key.to_string()).or_default();
        let result = entry.check_and_record(self.config.limit, self.config.period, now);

        match &result {
            Ok(remaining) => {
                tracing::debug!(
                    limiter = %self.config.key_prefix,
                    key,
                    remaining,
                    "Rate limit check passed"
                );
            }
            Err(retry_after) => {
                tracing::debug!(
                    limiter = %self.config.key_prefix,
                    key,
                    retry_after,
                    "Rate limit exceeded"
                );
            }
        }

        result
    }

    /// Drop fully-expired entries, at most once per sweep interval
    fn maybe_sweep(&self, now: Instant) {
        {
            let mut last_sweep = match self.last_sweep.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if now.duration_since(*last_sweep) < SWEEP_INTERVAL {
                return;
            }
            *last_sweep = now;
        }

        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(self.config.period, now));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(
                limiter = %self.config.key_prefix,
                removed,
                remaining = self.entries.len(),
                "Swept expired rate limit entries"
            );
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Guard for RateLimiter {
    fn evaluate(&self, ctx: &mut GuardContext) -> ApiResult<()> {
        match self.check(ctx.client_ip()) {
            Ok(remaining) => {
                ctx.record_rate_limit(RateLimitStatus {
                    limit: self.config.limit,
                    remaining,
                    window_secs: self.config.period.as_secs(),
                });
                Ok(())
            }
            Err(retry_after) => {
                tracing::warn!(
                    limiter = %self.config.key_prefix,
                    ip = ctx.client_ip(),
                    retry_after,
                    "Request rate limited"
                );
                Err(ApiError::RateLimited { retry_after })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_within_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 3, 60));

        assert_eq!(limiter.check("client1"), Ok(2));
        assert_eq!(limiter.check("client1"), Ok(1));
        assert_eq!(limiter.check("client1"), Ok(0));
    }

    #[test]
    fn test_fourth_request_in_window_rejected() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 3, 1));
        let base = Instant::now();

        for _ in 0..3 {
            limiter.check_at("client1", base).unwrap();
        }
        let result = limiter.check_at("client1", base + Duration::from_millis(500));
        assert!(result.is_err());
        if let Err(retry_after) = result {
            assert!(retry_after >= 1);
        }
    }

    #[test]
    fn test_next_window_admitted() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 3, 1));
        let base = Instant::now();

        for _ in 0..3 {
            limiter.check_at("client1", base).unwrap();
        }
        assert!(limiter
            .check_at("client1", base + Duration::from_millis(500))
            .is_err());

        // First request of the next window is admitted again
        let result = limiter.check_at("client1", base + Duration::from_millis(1100));
        assert_eq!(result, Ok(2));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 1, 60));

        assert_eq!(limiter.check("client1"), Ok(0));
        assert_eq!(limiter.check("client2"), Ok(0));
        assert!(limiter.check("client1").is_err());
    }

    #[test]
    fn test_sustained_excess_traffic_keeps_rejecting() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 2, 60));
        let base = Instant::now();

        limiter.check_at("client1", base).unwrap();
        limiter.check_at("client1", base).unwrap();
        for i in 1..20 {
            let now = base + Duration::from_millis(100 * i);
            assert!(limiter.check_at("client1", now).is_err());
        }
    }

    #[test]
    fn test_entries_created_lazily() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 5, 60));
        assert_eq!(limiter.entry_count(), 0);

        limiter.check("client1").unwrap();
        limiter.check("client2").unwrap();
        limiter.check("client1").unwrap();
        assert_eq!(limiter.entry_count(), 2);
    }

    #[test]
    fn test_sweep_drops_expired_entries() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 5, 1));
        let base = Instant::now();

        limiter.check_at("client1", base).unwrap();
        limiter.check_at("client2", base).unwrap();
        assert_eq!(limiter.entry_count(), 2);

        // Past both the window and the sweep interval, a check from a
        // third key triggers the sweep
        let later = base + SWEEP_INTERVAL + Duration::from_secs(2);
        limiter.check_at("client3", later).unwrap();
        assert_eq!(limiter.entry_count(), 1);
    }

    #[test]
    fn test_guard_rejects_with_rate_limited_error() {
        let limiter = RateLimiter::new(RateLimitConfig::new("test", 1, 60));
        let mut ctx = GuardContext::new("203.0.113.9");

        assert!(limiter.evaluate(&mut ctx).is_ok());
        assert_eq!(ctx.rate_limit().unwrap().limit, 1);

        let mut ctx = GuardContext::new("203.0.113.9");
        assert!(matches!(
            limiter.evaluate(&mut ctx),
            Err(ApiError::RateLimited { .. })
        ));
    }
}
