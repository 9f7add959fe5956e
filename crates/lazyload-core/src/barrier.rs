use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{LoadError, Result};

type Callback = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// Reach
// ---------------------------------------------------------------------------

/// Outcome of a single [`Barrier::reach`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// More arrivals are still outstanding.
    Pending { remaining: usize },
    /// This arrival met the target and ran the callback.
    Completed,
    /// The target had already been met; the arrival was ignored.
    Overrun,
}

// ---------------------------------------------------------------------------
// Barrier
// ---------------------------------------------------------------------------

/// Counting join: runs a callback exactly once after `target` arrivals.
///
/// Arrivals may come from any number of independent completions in any
/// order. Clones share the same counter, so each pending operation can own
/// a handle and call [`reach`](Self::reach) when it settles. The callback's
/// captured state is its invocation context.
///
/// A barrier with a target of zero fires during construction.
#[derive(Clone)]
pub struct Barrier {
    inner: Arc<Inner>,
}

struct Inner {
    target: usize,
    arrived: AtomicUsize,
    callback: Mutex<Option<Callback>>,
}

impl Barrier {
    pub fn new<F>(count: usize, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let barrier = Barrier {
            inner: Arc::new(Inner {
                target: count,
                arrived: AtomicUsize::new(0),
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        };
        if count == 0 {
            barrier.fire();
        }
        barrier
    }

    /// Build a barrier from an untyped quantity, rejecting negative values.
    pub fn try_new<F>(quantity: i64, callback: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let count = usize::try_from(quantity).map_err(|_| {
            LoadError::InvalidConfiguration(format!(
                "barrier quantity must be a non-negative integer, got {quantity}"
            ))
        })?;
        Ok(Self::new(count, callback))
    }

    /// Record one arrival.
    ///
    /// The arrival that meets the target runs the callback before returning.
    /// Arrivals past the target are no-ops.
    pub fn reach(&self) -> Reach {
        let target = self.inner.target;
        let bumped = self
            .inner
            .arrived
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < target).then_some(n + 1)
            });

        match bumped {
            Err(_) => {
                tracing::warn!(target, "barrier reached after completion; ignoring");
                Reach::Overrun
            }
            Ok(prev) if prev + 1 == target => {
                self.fire();
                Reach::Completed
            }
            Ok(prev) => Reach::Pending {
                remaining: target - prev - 1,
            },
        }
    }

    pub fn target(&self) -> usize {
        self.inner.target
    }

    pub fn arrived(&self) -> usize {
        self.inner.arrived.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.arrived() >= self.inner.target
    }

    fn fire(&self) {
        let callback = match self.inner.callback.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("target", &self.inner.target)
            .field("arrived", &self.arrived())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
