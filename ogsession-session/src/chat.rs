//! Chat handshake supervisor.
//!
//! Once a session is bound, a background task repeatedly GETs the universe
//! chat's socket.io handshake endpoint. It never upgrades to a socket or
//! holds a connection open; `connected` only reports that the last
//! handshake succeeded. Failures back off exponentially and after too many
//! consecutive failures the task gives up. The task owns a cancellation
//! token that the controller fires on logout or re-bind.

use chrono::Utc;
use ogsession_core::{ChatEndpoint, SessionError};
use ogsession_fetch::{Backoff, RateLimitedClient};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause between successful handshakes.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

/// Handle to a running handshake task. Dropping it stops the task.
#[derive(Debug)]
pub struct ChatSupervisor {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    connected: Arc<AtomicBool>,
    failures: Arc<AtomicU32>,
}

impl ChatSupervisor {
    /// Starts probing the socket.io handshake of `endpoint`.
    pub fn spawn(client: RateLimitedClient, endpoint: ChatEndpoint, max_attempts: u32) -> Self {
        info!(%endpoint, "Starting chat handshake probe");
        let probe_cancel = CancellationToken::new();
        let probe = {
            let probe_cancel = probe_cancel.clone();
            move || {
                let client = client.clone();
                let cancel = probe_cancel.clone();
                let url = format!(
                    "https://{}:{}/socket.io/1/?t={}",
                    endpoint.host,
                    endpoint.port,
                    Utc::now().timestamp_millis()
                );
                async move {
                    let response = client.get(&url, &cancel).await?;
                    if response.status.is_success() {
                        Ok(())
                    } else {
                        Err(SessionError::Transport(format!(
                            "chat handshake returned {}",
                            response.status
                        )))
                    }
                }
            }
        };
        Self::spawn_with(
            probe,
            Backoff::new(max_attempts),
            KEEPALIVE_INTERVAL,
            probe_cancel,
        )
    }

    /// Starts a supervisor around an arbitrary probe.
    pub fn spawn_with<P, Fut>(
        probe: P,
        backoff: Backoff,
        keepalive: Duration,
        cancel: CancellationToken,
    ) -> Self
    where
        P: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), SessionError>> + Send + 'static,
    {
        let connected = Arc::new(AtomicBool::new(false));
        let failures = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(supervise(
            probe,
            backoff,
            keepalive,
            cancel.clone(),
            Arc::clone(&connected),
            Arc::clone(&failures),
        ));

        Self {
            cancel,
            task,
            connected,
            failures,
        }
    }

    /// Whether the last probe succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Consecutive failed probes.
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the task.
    pub fn stop(self) {
        debug!("Stopping chat handshake probe");
    }
}

impl Drop for ChatSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn supervise<P, Fut>(
    probe: P,
    backoff: Backoff,
    keepalive: Duration,
    cancel: CancellationToken,
    connected: Arc<AtomicBool>,
    failures: Arc<AtomicU32>,
) where
    P: Fn() -> Fut,
    Fut: Future<Output = Result<(), SessionError>>,
{
    let mut consecutive = 0u32;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = probe() => result,
        };

        let delay = match result {
            Ok(()) => {
                if consecutive > 0 {
                    info!(after = consecutive, "Chat reconnected");
                }
                consecutive = 0;
                connected.store(true, Ordering::SeqCst);
                keepalive
            }
            Err(e) => {
                consecutive += 1;
                connected.store(false, Ordering::SeqCst);
                if !backoff.allows(consecutive + 1) {
                    warn!(attempts = consecutive, error = %e, "Chat handshake probe giving up");
                    failures.store(consecutive, Ordering::SeqCst);
                    break;
                }
                let delay = backoff.delay_for_attempt(consecutive);
                debug!(attempt = consecutive, ?delay, error = %e, "Chat probe failed");
                delay
            }
        };
        failures.store(consecutive, Ordering::SeqCst);

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    connected.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SessionError::Transport("refused".into())) }
            }
        };

        let supervisor = ChatSupervisor::spawn_with(
            probe,
            Backoff::new(3),
            Duration::from_secs(25),
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(!supervisor.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(supervisor.failures(), 3);
        assert!(!supervisor.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failures_and_stop_cancels() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = {
            let calls = Arc::clone(&calls);
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(SessionError::Transport("first".into()))
                    } else {
                        Ok(())
                    }
                }
            }
        };

        let cancel = CancellationToken::new();
        let supervisor = ChatSupervisor::spawn_with(
            probe,
            Backoff::new(3),
            Duration::from_secs(25),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(supervisor.is_connected());
        assert_eq!(supervisor.failures(), 0);

        supervisor.stop();
        assert!(cancel.is_cancelled());
    }
}
