use crate::events::{EventBus, SessionNotice, SignOutReason, SignedOut};
use crate::store::traits::IdentityStore;
use log::{debug, error, warn};
use prattle_core::invalidation::InvalidationSignature;
use prattle_core::session::SessionContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

const NOTICE_TEXT: &str = "Your session is no longer valid. Please sign in again.";

/// Lifecycle of one signed-in session. `PendingSignOut -> Active` is not a
/// reachable transition; the only way back to `Active` is a fresh sign-in,
/// which gets a fresh monitor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    PendingSignOut,
    SignedOut,
}

/// Watches every error surfaced by either transport for the known
/// invalidation signatures and, on a match, drives the recovery flow: one
/// user-visible notice, one cancellable delay, one sign-out.
pub struct SessionMonitor {
    session: Arc<SessionContext>,
    identity: Arc<dyn IdentityStore>,
    bus: Arc<EventBus>,
    delay: Duration,
    state: Mutex<SessionState>,
    torn_down: AtomicBool,
    cancel: Notify,
}

impl SessionMonitor {
    pub fn new(
        session: Arc<SessionContext>,
        identity: Arc<dyn IdentityStore>,
        bus: Arc<EventBus>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            identity,
            bus,
            delay,
            state: Mutex::new(SessionState::Active),
            torn_down: AtomicBool::new(false),
            cancel: Notify::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Shows the monitor one error message. Non-matching errors are ignored;
    /// the first match while `Active` emits the notice and schedules the
    /// delayed sign-out. Further matches while the delay is pending do not
    /// schedule a second timer or a second notice.
    pub fn observe_error(self: &Arc<Self>, message: &str) {
        let Some(signature) = InvalidationSignature::detect(message) else {
            return;
        };

        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state != SessionState::Active {
                return;
            }
            *state = SessionState::PendingSignOut;
        }

        warn!(target: "Client/Session", "Session invalidation detected ({:?}): {message}", signature);
        let _ = self.bus.session_notice.send(Arc::new(SessionNotice {
            signature,
            message: NOTICE_TEXT.to_string(),
        }));

        let monitor = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(monitor.delay) => {
                    monitor.timer_sign_out().await;
                }
                _ = monitor.cancel.notified() => {
                    debug!(target: "Client/Session", "Pending sign-out cancelled");
                }
            }
        });
    }

    /// Explicit, immediate sign-out (user pressed the button, or the client
    /// is being torn down with the intent to sign out). Cancels any pending
    /// timer first so the sign-out fires exactly once.
    pub async fn sign_out(&self) {
        self.cancel.notify_waiters();
        self.complete_sign_out(SignOutReason::UserRequested).await;
    }

    /// Tears the monitor down. A pending sign-out must never fire after this
    /// returns, even if its timer has already elapsed on another task.
    pub fn shutdown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.cancel.notify_waiters();
    }

    async fn timer_sign_out(&self) {
        // The flag covers the race where shutdown lands between the timer
        // elapsing and this task running.
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        self.complete_sign_out(SignOutReason::SessionInvalidated)
            .await;
    }

    async fn complete_sign_out(&self, reason: SignOutReason) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == SessionState::SignedOut {
                return;
            }
            *state = SessionState::SignedOut;
        }

        self.session.clear();
        if let Err(e) = self.identity.clear().await {
            error!(target: "Client/Session", "Failed to clear persisted identity: {e}");
        }
        let _ = self.bus.signed_out.send(Arc::new(SignedOut { reason }));
        debug!(target: "Client/Session", "Signed out ({reason:?})");
    }
}
