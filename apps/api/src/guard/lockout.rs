//! Account lockout tracking
//!
//! Login-specific companion to the rate limiter: the limiter throttles by
//! network origin regardless of account, this guard throttles by account
//! regardless of origin, defending against distributed credential
//! stuffing. Consecutive failures are counted per account; crossing the
//! threshold locks the account for a fixed duration.
//!
//! State is volatile by design. Losing it on restart is acceptable: it is
//! a throttle, not an audit log.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{ApiError, ApiResult};

/// Lockout policy configuration
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Consecutive failures that trigger a lock
    pub threshold: u32,
    /// How long a triggered lock lasts
    pub duration: Duration,
}

impl LockoutConfig {
    pub fn new(threshold: u32, duration_secs: u64) -> Self {
        Self {
            threshold,
            duration: Duration::from_secs(duration_secs),
        }
    }
}

impl Default for LockoutConfig {
    /// 5 consecutive failures lock the account for 15 minutes
    fn default() -> Self {
        Self::new(5, 15 * 60)
    }
}

#[derive(Debug, Default)]
struct LockoutRecord {
    failure_count: u32,
    lock_until: Option<Instant>,
}

/// Tracks consecutive authentication failures per account identifier
///
/// Constructed once at startup and passed by handle into the login
/// surface; the per-account records live in a sharded concurrent map.
pub struct LockoutGuard {
    config: LockoutConfig,
    records: DashMap<String, LockoutRecord>,
}

impl LockoutGuard {
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            records: DashMap::new(),
        }
    }

    /// Reject the attempt outright if the account is currently locked,
    /// without consulting credentials
    pub fn check(&self, account: &str) -> ApiResult<()> {
        self.check_at(account, Instant::now())
    }

    fn check_at(&self, account: &str, now: Instant) -> ApiResult<()> {
        if let Some(mut record) = self.records.get_mut(account) {
            match record.lock_until {
                Some(until) if now < until => {
                    let retry_after = until.duration_since(now).as_secs().max(1);
                    tracing::warn!(account, retry_after, "Login attempt on locked account");
                    return Err(ApiError::AccountLocked { retry_after });
                }
                Some(_) => {
                    // Lock has elapsed
                    record.lock_until = None;
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Record a failed credential check; locks the account when the
    /// failure count crosses the threshold
    pub fn record_failure(&self, account: &str) {
        self.record_failure_at(account, Instant::now());
    }

    fn record_failure_at(&self, account: &str, now: Instant) {
        let mut record = self.records.entry(account.to_string()).or_default();
        record.failure_count += 1;

        if record.failure_count >= self.config.threshold {
            record.lock_until = Some(now + self.config.duration);
            record.failure_count = 0;
            tracing::warn!(
                account,
                lock_secs = self.config.duration.as_secs(),
                "Account locked after repeated failed logins"
            );
        }
    }

    /// Record a successful credential check, clearing the failure count
    /// and any lock
    pub fn record_success(&self, account: &str) {
        self.records.remove(account);
    }
}
