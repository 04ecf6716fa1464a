//! Priority task arbiter.
//!
//! One exclusive slot, two FIFO queues. When the slot frees up the oldest
//! elevated waiter gets it; normal waiters only run when no elevated waiter
//! is queued.
//!
//! Hand-off happens under the state lock: the releaser pops the next waiter,
//! records it as holder, and signals it. A waiter that gives up (cancelled
//! or dropped) removes itself from its queue, or, if the grant already
//! arrived, passes the slot on.

use ogsession_core::{Priority, SessionError};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

// ============================================================================
// State
// ============================================================================

#[derive(Debug)]
struct Waiter {
    id: u64,
    name: String,
    grant: oneshot::Sender<()>,
}

#[derive(Debug, Default)]
struct ArbiterState {
    busy: bool,
    holder: Option<String>,
    normal: VecDeque<Waiter>,
    elevated: VecDeque<Waiter>,
}

impl ArbiterState {
    /// Hands the slot to the next live waiter, or frees it.
    fn hand_off(&mut self) {
        loop {
            let next = self.elevated.pop_front().or_else(|| self.normal.pop_front());
            let Some(waiter) = next else {
                self.busy = false;
                self.holder = None;
                return;
            };
            self.holder = Some(waiter.name.clone());
            if waiter.grant.send(()).is_ok() {
                trace!(holder = %waiter.name, "Slot handed off");
                return;
            }
        }
    }

    fn remove(&mut self, id: u64) -> bool {
        for queue in [&mut self.elevated, &mut self.normal] {
            if let Some(pos) = queue.iter().position(|w| w.id == id) {
                queue.remove(pos);
                return true;
            }
        }
        false
    }
}

#[derive(Debug)]
struct ArbiterInner {
    state: Mutex<ArbiterState>,
    next_id: AtomicU64,
    elevated_enabled: bool,
}

impl ArbiterInner {
    fn lock(&self) -> MutexGuard<'_, ArbiterState> {
        // Queue bookkeeping never panics mid-update.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        self.lock().hand_off();
    }
}

// ============================================================================
// Arbiter
// ============================================================================

/// Grants exclusive access to a session, elevated tasks first.
///
/// # Starvation
///
/// Elevated waiters always win. A continuous stream of elevated submissions
/// starves normal ones indefinitely; callers that elevate are expected to do
/// so sparingly (login, manual takeover).
#[derive(Debug, Clone)]
pub struct PriorityArbiter {
    inner: Arc<ArbiterInner>,
}

impl Default for PriorityArbiter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PriorityArbiter {
    /// Creates an arbiter. With `elevated_enabled` false every submission
    /// goes through the normal queue.
    pub fn new(elevated_enabled: bool) -> Self {
        Self {
            inner: Arc::new(ArbiterInner {
                state: Mutex::new(ArbiterState::default()),
                next_id: AtomicU64::new(0),
                elevated_enabled,
            }),
        }
    }

    /// Waits for the slot.
    ///
    /// Returns [`SessionError::Cancelled`] if `cancel` fires first; the
    /// waiter is then removed without disturbing the others.
    pub async fn acquire(
        &self,
        name: &str,
        priority: Priority,
        cancel: &CancellationToken,
    ) -> Result<SlotGuard, SessionError> {
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let mut ticket = {
            let mut state = self.inner.lock();
            if !state.busy {
                state.busy = true;
                state.holder = Some(name.to_string());
                debug!(task = name, "Slot granted immediately");
                return Ok(self.guard());
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = oneshot::channel();
            let waiter = Waiter {
                id,
                name: name.to_string(),
                grant: tx,
            };
            let elevated = self.inner.elevated_enabled && priority == Priority::Elevated;
            if elevated {
                state.elevated.push_back(waiter);
            } else {
                state.normal.push_back(waiter);
            }
            trace!(task = name, %priority, queued = state.elevated.len() + state.normal.len(), "Queued");

            Ticket {
                inner: Arc::clone(&self.inner),
                id,
                grant: Some(rx),
            }
        };

        let granted = {
            let Some(rx) = ticket.grant.as_mut() else {
                return Err(SessionError::Cancelled);
            };
            tokio::select! {
                biased;
                () = cancel.cancelled() => false,
                res = rx => res.is_ok(),
            }
        };

        if granted {
            ticket.grant = None;
            debug!(task = name, "Slot granted");
            Ok(self.guard())
        } else {
            debug!(task = name, "Cancelled while queued");
            // Dropping the ticket dequeues it or passes on a raced grant.
            drop(ticket);
            Err(SessionError::Cancelled)
        }
    }

    /// Runs `fut` inside the slot and returns its result verbatim.
    pub async fn submit<F, T>(
        &self,
        name: &str,
        priority: Priority,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        let _guard = self.acquire(name, priority, cancel).await?;
        fut.await
    }

    /// Takes the slot with elevated priority and keeps it until
    /// [`HeldSlot::done`] or drop.
    ///
    /// With a `hold_timeout` the slot is reclaimed after that long; any
    /// operation running through [`HeldSlot::run`] finishes first.
    pub async fn begin_named(
        &self,
        name: &str,
        hold_timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<HeldSlot, SessionError> {
        let guard = self.acquire(name, Priority::Elevated, cancel).await?;
        Ok(HeldSlot::new(name, guard, hold_timeout))
    }

    /// Number of queued waiters.
    pub fn queue_len(&self) -> usize {
        let state = self.inner.lock();
        state.normal.len() + state.elevated.len()
    }

    /// Whether the slot is held.
    pub fn is_busy(&self) -> bool {
        self.inner.lock().busy
    }

    /// Name of the current holder.
    pub fn current_holder(&self) -> Option<String> {
        self.inner.lock().holder.clone()
    }

    fn guard(&self) -> SlotGuard {
        SlotGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A queued request for the slot.
struct Ticket {
    inner: Arc<ArbiterInner>,
    id: u64,
    grant: Option<oneshot::Receiver<()>>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let Some(mut rx) = self.grant.take() else {
            return;
        };
        let mut state = self.inner.lock();
        if state.remove(self.id) {
            return;
        }
        // Already popped: the grant was sent under this same lock.
        if rx.try_recv().is_ok() {
            state.hand_off();
        }
    }
}

// ============================================================================
// Guards
// ============================================================================

/// Holds the slot; releases it on drop.
#[derive(Debug)]
pub struct SlotGuard {
    inner: Arc<ArbiterInner>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.inner.release();
    }
}

#[derive(Debug)]
struct HeldInner {
    name: String,
    guard: tokio::sync::Mutex<Option<SlotGuard>>,
    expired: AtomicBool,
}

/// A slot held across many operations.
#[derive(Debug)]
pub struct HeldSlot {
    inner: Arc<HeldInner>,
    watchdog: Option<JoinHandle<()>>,
}

impl HeldSlot {
    fn new(name: &str, guard: SlotGuard, hold_timeout: Option<Duration>) -> Self {
        let inner = Arc::new(HeldInner {
            name: name.to_string(),
            guard: tokio::sync::Mutex::new(Some(guard)),
            expired: AtomicBool::new(false),
        });

        let watchdog = hold_timeout.map(|timeout| {
            let inner = Arc::clone(&inner);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                // Waits for an in-flight operation to finish.
                let mut guard = inner.guard.lock().await;
                if guard.take().is_some() {
                    inner.expired.store(true, Ordering::SeqCst);
                    warn!(holder = %inner.name, ?timeout, "Held slot expired");
                }
            })
        });

        Self { inner, watchdog }
    }

    /// Name the slot was taken under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the hold timeout reclaimed the slot.
    pub fn is_expired(&self) -> bool {
        self.inner.expired.load(Ordering::SeqCst)
    }

    /// Runs `fut` while the slot is still held.
    ///
    /// Fails with [`SessionError::HoldExpired`] after the hold timeout.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        let guard = self.inner.guard.lock().await;
        if guard.is_none() {
            return Err(SessionError::HoldExpired(self.inner.name.clone()));
        }
        let result = fut.await;
        drop(guard);
        result
    }

    /// Releases the slot.
    pub fn done(self) {
        debug!(holder = %self.inner.name, "Held slot released");
    }
}

impl Drop for HeldSlot {
    fn drop(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.abort();
        }
        match self.inner.guard.try_lock() {
            Ok(mut guard) => {
                guard.take();
            }
            Err(_) => {
                // The watchdog or an operation holds the lock; release once
                // it lets go.
                let inner = Arc::clone(&self.inner);
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        inner.guard.lock().await.take();
                    });
                }
            }
        }
    }
}
