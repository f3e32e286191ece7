//! Shared "is a session running / has stop been asked for" state.
//!
//! Both facts live in one atomic byte so that a stop request racing with a
//! session that is just finishing can never leak into the next session:
//! `request_stop` only succeeds against `RUNNING`, and finishing a session
//! stores `IDLE` unconditionally, wiping any pending request with it.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOP_REQUESTED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    StopRequested,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Running => write!(f, "running"),
            SessionPhase::StopRequested => write!(f, "stopping"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: AtomicU8,
    idle: Notify,
    stop: Notify,
}

/// Cloneable handle shared by trigger sources and the typing worker
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single session slot. `None` while another session holds it.
    pub fn try_begin(&self) -> Option<SessionLease> {
        self.inner
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionLease { handle: self.clone() })
    }

    /// Ask the running session to stop at its next character boundary.
    /// Returns `false` when nothing is running (a late stop is a no-op).
    pub fn request_stop(&self) -> bool {
        match self.inner.state.compare_exchange(
            RUNNING,
            STOP_REQUESTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.inner.stop.notify_waiters();
                true
            }
            Err(current) => current == STOP_REQUESTED,
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != IDLE
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == STOP_REQUESTED
    }

    pub fn phase(&self) -> SessionPhase {
        match self.inner.state.load(Ordering::Acquire) {
            RUNNING => SessionPhase::Running,
            STOP_REQUESTED => SessionPhase::StopRequested,
            _ => SessionPhase::Idle,
        }
    }

    /// Resolves once no session holds the slot.
    pub async fn wait_idle(&self) {
        loop {
            // Registered before the check so a release in between is not missed.
            let notified = self.inner.idle.notified();
            if !self.is_active() {
                return;
            }
            notified.await;
        }
    }

    /// Resolves once a stop has been requested for the running session.
    async fn wait_stop(&self) {
        loop {
            let notified = self.inner.stop.notified();
            if self.stop_requested() {
                return;
            }
            notified.await;
        }
    }

    fn finish(&self) {
        self.inner.state.store(IDLE, Ordering::Release);
        self.inner.idle.notify_waiters();
    }
}

/// Ownership of the session slot. Dropping it is the one place the handle
/// goes back to idle, whether the session completed, was cancelled, aborted
/// or its task was torn down.
#[derive(Debug)]
pub struct SessionLease {
    handle: SessionHandle,
}

impl SessionLease {
    pub fn stop_requested(&self) -> bool {
        self.handle.stop_requested()
    }

    /// Resolves when a stop is requested; used to cut waits short
    pub async fn stopped(&self) {
        self.handle.wait_stop().await
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.handle.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_single_slot() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().expect("slot should be free");
        assert!(handle.is_active());
        assert!(handle.try_begin().is_none());
        drop(lease);
        assert!(!handle.is_active());
        assert!(handle.try_begin().is_some());
    }

    #[test]
    fn test_stop_without_session_is_noop() {
        let handle = SessionHandle::new();
        assert!(!handle.request_stop());
        assert_eq!(handle.phase(), SessionPhase::Idle);
        assert!(!handle.stop_requested());
    }

    #[test]
    fn test_stop_request_is_visible_to_lease() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().unwrap();
        assert!(!lease.stop_requested());
        assert!(handle.request_stop());
        assert!(lease.stop_requested());
        // Asking twice is still "yes, stopping"
        assert!(handle.request_stop());
        assert_eq!(handle.phase(), SessionPhase::StopRequested);
    }

    #[test]
    fn test_late_stop_does_not_leak_into_next_session() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().unwrap();
        drop(lease);
        assert!(!handle.request_stop());

        let next = handle.try_begin().unwrap();
        assert!(!next.stop_requested());
    }

    #[test]
    fn test_finish_clears_pending_stop() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().unwrap();
        handle.request_stop();
        drop(lease);
        assert_eq!(handle.phase(), SessionPhase::Idle);
        let next = handle.try_begin().unwrap();
        assert!(!next.stop_requested());
    }

    #[tokio::test]
    async fn test_wait_idle_wakes_on_release() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().unwrap();

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        drop(lease);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let handle = SessionHandle::new();
        tokio::time::timeout(Duration::from_millis(100), handle.wait_idle())
            .await
            .expect("idle handle should not block");
    }

    #[tokio::test]
    async fn test_lease_stopped_wakes_on_request() {
        let handle = SessionHandle::new();
        let lease = handle.try_begin().unwrap();

        let stopper = {
            let handle = handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                handle.request_stop()
            })
        };

        tokio::time::timeout(Duration::from_secs(1), lease.stopped())
            .await
            .expect("stop should wake the lease");
        assert!(stopper.await.unwrap());
        // Already stopping: resolves without waiting
        lease.stopped().await;
    }
}
