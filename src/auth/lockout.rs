//! Login brute-force lockout
//!
//! Per identifier the guard moves through `Clear -> Warned(n) -> Locked`.
//! Failures are counted atomically in a mutex-guarded map; reaching the
//! threshold locks the identifier until `now + duration`. Expiry is lazy:
//! every check recomputes "locked?" against the clock, and an expired entry
//! is dropped so the next failure starts counting from one. Counters that
//! never reach the threshold are forgotten one lockout window after their
//! last failure, and every failure sweeps such stale entries from the map.
//!
//! State is in-memory only and resets when the process restarts. Deployments
//! with several processes need an `AttemptStore` backed by a shared store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExpenseError, ExpenseResult};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Threshold and lockout window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lockout
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Length of the lockout window in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: i64,
}

fn default_threshold() -> u32 {
    5
}

fn default_duration_secs() -> i64 {
    180
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            duration_secs: default_duration_secs(),
        }
    }
}

impl LockoutPolicy {
    pub fn validate(&self) -> ExpenseResult<()> {
        if self.threshold == 0 {
            return Err(ExpenseError::Config(
                "Lockout threshold must be at least 1".into(),
            ));
        }
        if self.duration_secs <= 0 {
            return Err(ExpenseError::Config(
                "Lockout duration must be positive".into(),
            ));
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }
}

/// Where an identifier currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutStatus {
    Clear,
    Warned { failures: u32 },
    Locked { until: DateTime<Utc> },
}

/// Result of recording one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still below the threshold
    Warned { attempts_remaining: u32 },
    /// This failure reached the threshold
    Locked { until: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
    /// End of the lockout, or one window after the last failure
    forget_at: DateTime<Utc>,
}

impl AttemptRecord {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            failures: 0,
            locked_until: None,
            forget_at: now,
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.forget_at
    }
}

/// Keyed failure counters with atomic increment-and-check
pub trait AttemptStore: Send + Sync {
    /// Count a failure and lock the identifier if it reaches the threshold
    fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> ExpenseResult<FailureOutcome>;

    /// Forget all failures and any lockout for the identifier
    fn record_success(&self, identifier: &str) -> ExpenseResult<()>;

    /// Current status, with expired lockouts treated as clear
    fn status(&self, identifier: &str, now: DateTime<Utc>) -> ExpenseResult<LockoutStatus>;
}

/// Process-local attempt store
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ExpenseResult<MutexGuard<'_, HashMap<String, AttemptRecord>>> {
        self.records
            .lock()
            .map_err(|e| ExpenseError::Storage(format!("Failed to acquire lockout lock: {}", e)))
    }

    /// Drop a stale record so the identifier is clear again
    fn expire(records: &mut HashMap<String, AttemptRecord>, identifier: &str, now: DateTime<Utc>) {
        if records.get(identifier).is_some_and(|record| record.is_stale(now)) {
            records.remove(identifier);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn record_failure(
        &self,
        identifier: &str,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> ExpenseResult<FailureOutcome> {
        let mut records = self.lock()?;
        records.retain(|_, record| !record.is_stale(now));

        let record = records
            .entry(identifier.to_string())
            .or_insert_with(|| AttemptRecord::fresh(now));
        if let Some(until) = record.locked_until {
            return Ok(FailureOutcome::Locked { until });
        }

        record.failures += 1;
        if record.failures >= policy.threshold {
            let until = now + policy.duration();
            record.locked_until = Some(until);
            record.forget_at = until;
            Ok(FailureOutcome::Locked { until })
        } else {
            record.forget_at = now + policy.duration();
            Ok(FailureOutcome::Warned {
                attempts_remaining: policy.threshold - record.failures,
            })
        }
    }

    fn record_success(&self, identifier: &str) -> ExpenseResult<()> {
        self.lock()?.remove(identifier);
        Ok(())
    }

    fn status(&self, identifier: &str, now: DateTime<Utc>) -> ExpenseResult<LockoutStatus> {
        let mut records = self.lock()?;
        Self::expire(&mut records, identifier, now);

        Ok(match records.get(identifier) {
            None => LockoutStatus::Clear,
            Some(AttemptRecord {
                locked_until: Some(until),
                ..
            }) => LockoutStatus::Locked { until: *until },
            Some(AttemptRecord { failures, .. }) => LockoutStatus::Warned {
                failures: *failures,
            },
        })
    }
}

/// Guards credential verification with per-identifier lockouts
///
/// The guard never compares passwords itself; callers hand it the outcome of
/// their own verification step.
pub struct LoginGuard<S: AttemptStore = InMemoryAttemptStore> {
    store: S,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl LoginGuard<InMemoryAttemptStore> {
    /// In-memory guard on the system clock
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_store(InMemoryAttemptStore::new(), policy, Arc::new(SystemClock))
    }
}

impl<S: AttemptStore> LoginGuard<S> {
    pub fn with_store(store: S, policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Current status for an identifier
    pub fn status(&self, identifier: &str) -> ExpenseResult<LockoutStatus> {
        self.store.status(identifier, self.clock.now())
    }

    /// Lockout expiry if the identifier is locked right now
    pub fn locked_until(&self, identifier: &str) -> ExpenseResult<Option<DateTime<Utc>>> {
        Ok(match self.status(identifier)? {
            LockoutStatus::Locked { until } => Some(until),
            _ => None,
        })
    }

    /// Reject immediately if the identifier is locked
    pub fn check(&self, identifier: &str) -> ExpenseResult<()> {
        let now = self.clock.now();
        match self.store.status(identifier, now)? {
            LockoutStatus::Locked { until } => Err(locked_out(until, now)),
            _ => Ok(()),
        }
    }

    /// Count a failed verification
    pub fn record_failure(&self, identifier: &str) -> ExpenseResult<FailureOutcome> {
        let outcome = self
            .store
            .record_failure(identifier, &self.policy, self.clock.now())?;

        match outcome {
            FailureOutcome::Warned { attempts_remaining } => {
                tracing::warn!(identifier, attempts_remaining, "failed login attempt");
            }
            FailureOutcome::Locked { until } => {
                tracing::warn!(identifier, %until, "identifier locked out");
            }
        }
        Ok(outcome)
    }

    /// Clear the identifier after a successful verification
    pub fn record_success(&self, identifier: &str) -> ExpenseResult<()> {
        self.store.record_success(identifier)
    }

    /// Run one authentication attempt through the guard
    ///
    /// While locked, `verify` is never called. Otherwise its outcome is
    /// recorded: `Ok(true)` clears the identifier, `Ok(false)` counts a
    /// failure and yields `InvalidCredentials` or `LockedOut`.
    pub fn attempt<F>(&self, identifier: &str, verify: F) -> ExpenseResult<()>
    where
        F: FnOnce() -> ExpenseResult<bool>,
    {
        self.check(identifier)?;

        if verify()? {
            self.record_success(identifier)?;
            return Ok(());
        }

        match self.record_failure(identifier)? {
            FailureOutcome::Warned { attempts_remaining } => {
                Err(ExpenseError::InvalidCredentials { attempts_remaining })
            }
            FailureOutcome::Locked { until } => Err(locked_out(until, self.clock.now())),
        }
    }
}

fn locked_out(until: DateTime<Utc>, now: DateTime<Utc>) -> ExpenseError {
    let remaining = until - now;
    // Round up so a lockout never reports 0 seconds while still active
    let mut remaining_secs = remaining.num_seconds();
    if remaining > Duration::seconds(remaining_secs) {
        remaining_secs += 1;
    }
    ExpenseError::LockedOut {
        remaining_secs: remaining_secs.max(1),
    }
}
