//! Shared session handle.
//!
//! [`SessionHandle`] is the cloneable front door: every operation first takes
//! the arbiter slot, then runs against the one [`SessionController`]. Login
//! and manual takeovers use the elevated queue; page fetches and actions use
//! the normal one.

use futures::future::BoxFuture;
use ogsession_core::{Page, PageKind, Priority, SessionError, SessionSnapshot};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::arbiter::{HeldSlot, PriorityArbiter};
use crate::controller::{ActionResult, ActionSpec, FetchOptions, SessionController, SharedSnapshot};

/// Future returned by closures passed to [`SessionHandle::submit`].
pub type SessionFuture<'a, R> = BoxFuture<'a, Result<R, SessionError>>;

// ============================================================================
// Session Handle
// ============================================================================

/// Cloneable, arbitrated access to one session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    arbiter: PriorityArbiter,
    controller: Mutex<SessionController>,
    snapshot: SharedSnapshot,
    hold_timeout: Option<Duration>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("arbiter", &self.inner.arbiter)
            .field("hold_timeout", &self.inner.hold_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    /// Wraps a controller. Queue and hold behaviour come from its settings.
    pub fn new(controller: SessionController) -> Self {
        let settings = controller.settings();
        let arbiter = PriorityArbiter::new(settings.elevated_queue_enabled);
        let hold_timeout = settings.hold_timeout;
        let snapshot = controller.shared_snapshot();

        Self {
            inner: Arc::new(HandleInner {
                arbiter,
                controller: Mutex::new(controller),
                snapshot,
                hold_timeout,
            }),
        }
    }

    /// The arbiter guarding the session.
    pub fn arbiter(&self) -> &PriorityArbiter {
        &self.inner.arbiter
    }

    /// Latest published session state. Never waits for the slot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `f` against the controller once the slot is granted.
    ///
    /// The result is returned verbatim; the slot is released on every path,
    /// including when the returned future is dropped.
    pub async fn submit<R, F>(
        &self,
        name: &str,
        priority: Priority,
        cancel: &CancellationToken,
        f: F,
    ) -> Result<R, SessionError>
    where
        F: for<'a> FnOnce(&'a mut SessionController, &'a CancellationToken) -> SessionFuture<'a, R>,
    {
        let _slot = self.inner.arbiter.acquire(name, priority, cancel).await?;
        let mut controller = self.inner.controller.lock().await;
        f(&mut *controller, cancel).await
    }

    /// Logs in through the elevated queue.
    ///
    /// The login timeout starts once the slot is granted. Time spent queueing
    /// is bounded only by `cancel`. On [`SessionError::DeadlineExceeded`] the
    /// session is already logged out when this returns.
    pub async fn login(&self, cancel: &CancellationToken) -> Result<SessionSnapshot, SessionError> {
        self.submit("login", Priority::Elevated, cancel, |controller, cancel| {
            Box::pin(controller.login(cancel))
        })
        .await
    }

    /// Logs out through the elevated queue.
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.submit("logout", Priority::Elevated, cancel, |controller, cancel| {
            Box::pin(controller.logout(cancel))
        })
        .await
    }

    /// Fetches a page through the normal queue.
    pub async fn fetch_page(
        &self,
        kind: PageKind,
        opts: FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Page, SessionError> {
        let name = format!("page:{kind}");
        self.submit(&name, Priority::Normal, cancel, move |controller, cancel| {
            Box::pin(controller.fetch_page(kind, opts, cancel))
        })
        .await
    }

    /// Performs an action through the normal queue.
    pub async fn perform_action(
        &self,
        action: ActionSpec,
        cancel: &CancellationToken,
    ) -> Result<ActionResult, SessionError> {
        let name = format!("action:{}", action.name);
        self.submit(&name, Priority::Normal, cancel, move |controller, cancel| {
            Box::pin(controller.perform_action(action, cancel))
        })
        .await
    }

    /// Takes the slot for a sequence of operations.
    ///
    /// Nothing else runs until [`ManualSession::done`] or drop, or until the
    /// configured hold timeout reclaims the slot.
    pub async fn begin_named(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ManualSession, SessionError> {
        let held = self
            .inner
            .arbiter
            .begin_named(name, self.inner.hold_timeout, cancel)
            .await?;
        debug!(holder = name, "Manual session started");
        Ok(ManualSession {
            held,
            handle: self.clone(),
        })
    }
}

// ============================================================================
// Manual Session
// ============================================================================

/// Exclusive use of the session across several operations.
#[derive(Debug)]
pub struct ManualSession {
    held: HeldSlot,
    handle: SessionHandle,
}

impl ManualSession {
    /// Name the slot was taken under.
    pub fn name(&self) -> &str {
        self.held.name()
    }

    /// Whether the hold timeout reclaimed the slot.
    pub fn is_expired(&self) -> bool {
        self.held.is_expired()
    }

    /// Runs `f` against the controller without queueing.
    ///
    /// Fails with [`SessionError::HoldExpired`] once the slot was reclaimed.
    pub async fn run<R, F>(&self, cancel: &CancellationToken, f: F) -> Result<R, SessionError>
    where
        F: for<'a> FnOnce(&'a mut SessionController, &'a CancellationToken) -> SessionFuture<'a, R>,
    {
        let controller = &self.handle.inner.controller;
        self.held
            .run(async move {
                let mut controller = controller.lock().await;
                f(&mut *controller, cancel).await
            })
            .await
    }

    /// Fetches a page inside the held slot.
    pub async fn fetch_page(
        &self,
        kind: PageKind,
        opts: FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<Page, SessionError> {
        self.run(cancel, move |controller, cancel| {
            Box::pin(controller.fetch_page(kind, opts, cancel))
        })
        .await
    }

    /// Performs an action inside the held slot.
    pub async fn perform_action(
        &self,
        action: ActionSpec,
        cancel: &CancellationToken,
    ) -> Result<ActionResult, SessionError> {
        self.run(cancel, move |controller, cancel| {
            Box::pin(controller.perform_action(action, cancel))
        })
        .await
    }

    /// Releases the slot.
    pub fn done(self) {
        self.held.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SessionSettings;
    use ogsession_core::Credentials;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn handle() -> SessionHandle {
        let controller = SessionController::new(
            SessionSettings::new("Zibal", "en").without_chat(),
            Credentials::new("user@example.com", "secret"),
        )
        .unwrap();
        SessionHandle::new(controller)
    }

    #[tokio::test]
    async fn test_submit_returns_result_verbatim() {
        let handle = handle();
        let cancel = CancellationToken::new();
        let result = handle
            .submit("probe", Priority::Normal, &cancel, |controller, _| {
                Box::pin(async move { Ok::<_, SessionError>(controller.is_logged_in()) })
            })
            .await;
        assert_eq!(result, Ok(false));
        assert!(!handle.arbiter().is_busy());
    }

    #[tokio::test]
    async fn test_unbound_fetch_is_not_authenticated() {
        let handle = handle();
        let cancel = CancellationToken::new();
        let result = handle
            .fetch_page(PageKind::Overview, FetchOptions::default(), &cancel)
            .await;
        assert_eq!(result, Err(SessionError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_manual_session_blocks_normal_work() {
        let handle = handle();
        let cancel = CancellationToken::new();
        let manual = handle.begin_named("manual", &cancel).await.unwrap();
        assert_eq!(handle.arbiter().current_holder().as_deref(), Some("manual"));

        let ran = Arc::new(AtomicBool::new(false));
        let waiter = {
            let handle = handle.clone();
            let ran = Arc::clone(&ran);
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                handle
                    .submit("background", Priority::Normal, &cancel, move |_, _| {
                        Box::pin(async move {
                            ran.store(true, Ordering::SeqCst);
                            Ok::<_, SessionError>(())
                        })
                    })
                    .await
            })
        };

        tokio::task::yield_now().await;
        let inside = manual
            .run(&cancel, |controller, _| {
                Box::pin(async move { Ok::<_, SessionError>(controller.bearer_token().len()) })
            })
            .await;
        assert_eq!(inside, Ok(0));
        assert!(!ran.load(Ordering::SeqCst));

        manual.done();
        waiter.await.unwrap().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_snapshot_reads_without_slot() {
        let handle = handle();
        let cancel = CancellationToken::new();
        let _manual = handle.begin_named("manual", &cancel).await.unwrap();
        let snapshot = handle.snapshot();
        assert!(!snapshot.logged_in);
        assert!(snapshot.bearer_token.is_empty());
    }
}
