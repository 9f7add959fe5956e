use std::future::Future;

use tokio::sync::watch;

// ─── ReadySignal ──────────────────────────────────────────────────────────

/// Observer side of the global "packages ready" flag.
///
/// The flag flips from false to true at most once. Subscribers that arrive
/// after it flipped see it immediately. If the run that owns the trigger
/// ends without flipping it, waiters are released with `false`.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<bool>,
}

/// Owner side, held by a single orchestrator run.
#[derive(Debug)]
pub(crate) struct ReadyTrigger {
    tx: watch::Sender<bool>,
}

pub(crate) fn channel() -> (ReadyTrigger, ReadySignal) {
    let (tx, rx) = watch::channel(false);
    (ReadyTrigger { tx }, ReadySignal { rx })
}

impl ReadyTrigger {
    /// Flip the flag. Returns true only for the call that flipped it.
    pub(crate) fn fire(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }
}

impl ReadySignal {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the packages are ready (`true`), or once the run ended
    /// without reaching readiness (`false`).
    pub async fn wait(&self) -> bool {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(|ready| *ready).await;
        result.is_ok()
    }

    /// Run `startup` only after the packages are ready.
    ///
    /// This is the application-startup gate: when readiness already fired,
    /// `startup` proceeds immediately. Returns `None` without polling
    /// `startup` if readiness can no longer happen.
    pub async fn gate<F, T>(&self, startup: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if !self.wait().await {
            return None;
        }
        Some(startup.await)
    }
}
