//! Stop signal shared between the run loop and control callbacks.
use std::{
    sync::{Condvar, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use tracing::trace;

/// Result of waiting on a [`StopSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The signal was set before the timeout elapsed.
    Signaled,
    /// The timeout elapsed while the signal was still unset.
    TimedOut,
}

/// Manually reset binary signal. Once set it stays set for the lifetime of the value.
///
/// Waiters block on a condition variable, so a `set` from any thread wakes every
/// current waiter and every later `wait` returns [`WaitOutcome::Signaled`] immediately.
#[derive(Debug, Default)]
pub struct StopSignal {
    set: Mutex<bool>,
    wakeup: Condvar,
}

impl StopSignal {
    /// Creates a signal in the unset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal and wakes all waiters.
    ///
    /// Returns `true` only for the call that moved the signal from unset to set.
    pub fn set(&self) -> bool {
        let mut guard = self.lock();
        if *guard {
            trace!("stop signal already set");
            return false;
        }
        *guard = true;
        self.wakeup.notify_all();
        trace!("stop signal set");
        true
    }

    /// Returns whether the signal has been set, without blocking.
    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the signal is set or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.lock();

        while !*guard {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                return WaitOutcome::TimedOut;
            }

            guard = match self.wakeup.wait_timeout(guard, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }

        WaitOutcome::Signaled
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
