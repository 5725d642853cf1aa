//! Single-assignment asynchronous result.
//!
//! A [`Deferred`] starts pending and settles exactly once, either resolved
//! with a value or rejected with an [`Error`]. Observers can register
//! callbacks before or after settlement, or block with [`Deferred::wait`].
//!
//! All state lives behind one mutex. Registration checks the outcome and
//! queues the callback under that mutex, and settlement stores the outcome
//! and takes the queue under it, so a callback is never lost. Callbacks run
//! after the mutex is released and may freely touch the same `Deferred`.
//!
//! # Usage
//!
//! ```rust
//! use std::time::Duration;
//! use suggest_core::Deferred;
//!
//! let result: Deferred<usize> = Deferred::new();
//! let observer = result.clone();
//! std::thread::spawn(move || observer.resolve(42));
//!
//! assert_eq!(result.wait(Duration::from_secs(5)).unwrap(), 42);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorCallback = Box<dyn FnOnce(&Error) + Send>;
type Canceller = Box<dyn Fn() -> bool + Send + Sync>;

struct State<T> {
    outcome: Option<std::result::Result<T, Error>>,
    on_success: Vec<SuccessCallback<T>>,
    on_error: Vec<ErrorCallback>,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    settled: Condvar,
    canceller: Mutex<Option<Canceller>>,
}

/// A pending, resolved or rejected result shared between a producer and
/// any number of observers.
///
/// Cloning a `Deferred` yields another handle to the same cell.
pub struct Deferred<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        let status = match &state.outcome {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "rejected",
        };
        f.debug_struct("Deferred").field("status", &status).finish()
    }
}

impl<T: Clone + Send + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Creates a pending result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    outcome: None,
                    on_success: Vec::new(),
                    on_error: Vec::new(),
                }),
                settled: Condvar::new(),
                canceller: Mutex::new(None),
            }),
        }
    }

    /// Creates an already resolved result.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    /// Creates an already rejected result.
    #[must_use]
    pub fn rejected(error: Error) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    /// Runs `work` on a new named thread and settles with its outcome.
    ///
    /// A panic inside `work` rejects the result with [`Error::Internal`].
    #[must_use]
    pub fn spawn<F>(name: &str, work: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let deferred = Self::new();
        let producer = deferred.clone();
        let spawned = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(work))
                    .unwrap_or_else(|_| Err(Error::Internal("worker thread panicked".into())));
                producer.settle(outcome);
            });
        if let Err(e) = spawned {
            deferred.reject(Error::Internal(format!("failed to spawn worker: {e}")));
        }
        deferred
    }

    /// Resolves the result. Returns false if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Rejects the result. Returns false if it was already settled.
    pub fn reject(&self, error: Error) -> bool {
        self.settle(Err(error))
    }

    /// Settles the result with `outcome`. Later calls are no-ops.
    pub fn settle(&self, outcome: Result<T>) -> bool {
        let (on_success, on_error) = {
            let mut state = self.inner.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            self.inner.settled.notify_all();
            (
                std::mem::take(&mut state.on_success),
                std::mem::take(&mut state.on_error),
            )
        };
        self.inner.canceller.lock().take();

        match &outcome {
            Ok(value) => on_success.into_iter().for_each(|cb| cb(value)),
            Err(error) => on_error.into_iter().for_each(|cb| cb(error)),
        }
        true
    }

    /// Registers a callback fired with the value once resolved.
    ///
    /// Fires immediately on the calling thread if already resolved.
    pub fn on_success<F>(&self, callback: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let value = {
            let mut state = self.inner.state.lock();
            match &state.outcome {
                None => {
                    state.on_success.push(Box::new(callback));
                    return;
                }
                Some(Ok(value)) => value.clone(),
                Some(Err(_)) => return,
            }
        };
        callback(&value);
    }

    /// Registers a callback fired with the error once rejected.
    ///
    /// Fires immediately on the calling thread if already rejected.
    pub fn on_error<F>(&self, callback: F)
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        let error = {
            let mut state = self.inner.state.lock();
            match &state.outcome {
                None => {
                    state.on_error.push(Box::new(callback));
                    return;
                }
                Some(Err(error)) => error.clone(),
                Some(Ok(_)) => return,
            }
        };
        callback(&error);
    }

    /// Blocks until settled or until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the result is still pending after
    /// `timeout`, or the carried error if it was rejected. A timeout too
    /// large to express as a deadline waits without one.
    pub fn wait(&self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.inner.state.lock();
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            let Some(deadline) = deadline else {
                self.inner.settled.wait(&mut state);
                continue;
            };
            if self
                .inner
                .settled
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return match &state.outcome {
                    Some(outcome) => outcome.clone(),
                    None => Err(Error::Timeout(timeout)),
                };
            }
        }
    }

    /// Returns the outcome if already settled, without blocking.
    #[must_use]
    pub fn try_get(&self) -> Option<Result<T>> {
        self.inner.state.lock().outcome.clone()
    }

    /// Returns true once resolved or rejected.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.state.lock().outcome.is_some()
    }

    /// Installs the hook used by [`Deferred::cancel`].
    ///
    /// The hook returns true when the underlying work accepted the
    /// cancellation request.
    pub fn set_canceller<F>(&self, canceller: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        if !self.is_done() {
            *self.inner.canceller.lock() = Some(Box::new(canceller));
        }
    }

    /// Requests cancellation of the underlying work.
    ///
    /// Succeeds only when a canceller is installed and accepts the request;
    /// the result is then rejected with [`Error::Cancelled`]. Returns false
    /// if the work is not cancellable or the result already settled.
    pub fn cancel(&self) -> bool {
        if self.is_done() {
            return false;
        }
        let accepted = match self.inner.canceller.lock().as_ref() {
            Some(canceller) => canceller(),
            None => false,
        };
        accepted && self.reject(Error::Cancelled)
    }
}
