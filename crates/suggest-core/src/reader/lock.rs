//! Two-phase lock over the shared settings store.
//!
//! The store only offers plain reads and writes, so mutual exclusion is
//! cooperative. A caller claims `lock1` by writing its id and re-reading it
//! on every iteration; once it has seen itself uncontested for more than
//! `idle_threshold` iterations it claims `lock2` the same way. The lock is
//! held when both fields read back as the caller's id. Any foreign id
//! resets the idle count. A caller waiting longer than `timeout` clears
//! both fields, which frees a lock left behind by a crashed holder.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::store::SettingsStore;

/// Exec flag value while the stream has documents left.
pub const EXEC_ACTIVE: &str = "active";

/// Exec flag value once the stream is exhausted.
pub const EXEC_IDLE: &str = "idle";

/// Settings keys of one named cursor/lock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockKeys {
    /// Persisted scan cursor token.
    pub cursor: String,
    /// First lock field.
    pub lock1: String,
    /// Second lock field.
    pub lock2: String,
    /// Exec flag, [`EXEC_ACTIVE`] or [`EXEC_IDLE`].
    pub exec: String,
}

impl LockKeys {
    /// Keys for the record called `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            cursor: format!("{name}.cursor"),
            lock1: format!("{name}.lock1"),
            lock2: format!("{name}.lock2"),
            exec: format!("{name}.exec"),
        }
    }
}

/// Lock tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Uncontested iterations required before claiming `lock2`.
    pub idle_threshold: usize,
    /// Wait after which both fields are forcibly cleared.
    pub timeout: Duration,
    /// Lower bound of the randomized backoff.
    pub backoff_min: Duration,
    /// Upper bound of the randomized backoff.
    pub backoff_max: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self::from(&ReaderConfig::default())
    }
}

impl From<&ReaderConfig> for LockOptions {
    fn from(config: &ReaderConfig) -> Self {
        Self {
            idle_threshold: config.lock_idle_threshold,
            timeout: Duration::from_millis(config.lock_timeout_ms),
            backoff_min: Duration::from_millis(config.lock_backoff_min_ms),
            backoff_max: Duration::from_millis(config.lock_backoff_max_ms),
        }
    }
}

/// How [`DistributedLock::acquire`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Both fields hold this caller's id.
    Acquired,
    /// The exec flag is idle; the stream is done and no lock was taken.
    Idle,
}

/// One caller's handle on a named lock record.
pub struct DistributedLock {
    settings: Arc<dyn SettingsStore>,
    keys: LockKeys,
    options: LockOptions,
    caller_id: String,
    held: bool,
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("keys", &self.keys)
            .field("caller_id", &self.caller_id)
            .field("held", &self.held)
            .finish()
    }
}

impl DistributedLock {
    /// Creates a handle with a fresh random caller id.
    pub fn new(settings: Arc<dyn SettingsStore>, keys: LockKeys, options: LockOptions) -> Self {
        Self {
            settings,
            keys,
            options,
            caller_id: Uuid::new_v4().to_string(),
            held: false,
        }
    }

    /// This caller's id.
    #[must_use]
    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    /// Returns true between a successful acquire and the next release.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }

    fn is_mine(&self, value: Option<&str>) -> bool {
        value == Some(self.caller_id.as_str())
    }

    fn claimable(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| v.is_empty() || v == self.caller_id)
    }

    /// Waits for the lock, or returns [`LockOutcome::Idle`] as soon as the
    /// exec flag says the stream is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn acquire(&mut self) -> Result<LockOutcome> {
        let mut idle = 0usize;
        let mut started = Instant::now();

        loop {
            if self.settings.get(&self.keys.exec)?.as_deref() == Some(EXEC_IDLE) {
                return Ok(LockOutcome::Idle);
            }

            let lock1 = self.settings.get(&self.keys.lock1)?;
            if self.claimable(lock1.as_deref()) {
                self.settings.set(&self.keys.lock1, &self.caller_id)?;
                idle += 1;
                if idle > self.options.idle_threshold {
                    let lock2 = self.settings.get(&self.keys.lock2)?;
                    if self.claimable(lock2.as_deref()) {
                        self.settings.set(&self.keys.lock2, &self.caller_id)?;
                        let lock1 = self.settings.get(&self.keys.lock1)?;
                        let lock2 = self.settings.get(&self.keys.lock2)?;
                        if self.is_mine(lock1.as_deref()) && self.is_mine(lock2.as_deref()) {
                            self.held = true;
                            tracing::trace!(caller = %self.caller_id, "lock acquired");
                            return Ok(LockOutcome::Acquired);
                        }
                    }
                    idle = 0;
                }
            } else {
                idle = 0;
            }

            if started.elapsed() > self.options.timeout {
                tracing::warn!(
                    caller = %self.caller_id,
                    lock = %self.keys.lock1,
                    "lock wait timed out, forcing unlock"
                );
                self.settings.remove(&self.keys.lock1)?;
                self.settings.remove(&self.keys.lock2)?;
                started = Instant::now();
                idle = 0;
            }

            tracing::trace!(caller = %self.caller_id, idle, "lock busy");
            thread::sleep(self.backoff());
        }
    }

    fn backoff(&self) -> Duration {
        let min = self.options.backoff_min;
        let max = self.options.backoff_max.max(min);
        if min == max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    /// Clears both lock fields if this handle holds the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store fails.
    pub fn release(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        self.held = false;
        self.settings.remove(&self.keys.lock1)?;
        self.settings.remove(&self.keys.lock2)?;
        tracing::trace!(caller = %self.caller_id, "lock released");
        Ok(())
    }
}
