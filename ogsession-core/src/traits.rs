//! Capability traits consumed by the session layer.
//!
//! The session controller never depends on a concrete server version: it
//! reads pages through [`PageExtractor`], asks a [`ChallengeSolver`] when the
//! lobby demands a challenge, and signs lobby requests with a
//! [`DeviceFingerprint`].

use async_trait::async_trait;
use chrono::NaiveDateTime;
use semver::Version;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::models::{ChatEndpoint, Resources};

// ============================================================================
// Page Extraction
// ============================================================================

/// Version-specific page reading capabilities.
///
/// Implementations must be pure: no I/O, no interior mutability.
pub trait PageExtractor: Send + Sync + fmt::Debug {
    /// Name of the strategy (e.g. `v12.0.0`).
    fn name(&self) -> &str;

    /// Versions this extractor answers for, as `[min, max)`. `None` means
    /// unbounded above.
    fn version_range(&self) -> (Version, Option<Version>);

    /// Extracts the in-game session marker (`ogame-session`).
    fn extract_session_marker(&self, page: &str) -> Option<String>;

    /// Extracts the game version string embedded in the page.
    fn extract_server_version(&self, page: &str) -> Option<String>;

    /// Returns true if the page shows a logged-out state.
    fn is_logged_out(&self, page: &str) -> bool;

    /// Extracts the anti-forgery token used by form submissions.
    fn extract_token(&self, page: &str) -> Option<String>;

    /// Extracts the server wall clock shown on the page.
    fn extract_server_time(&self, page: &str) -> Option<NaiveDateTime>;

    /// Extracts the id of the planet the page was rendered for.
    fn extract_planet_id(&self, page: &str) -> Option<i64>;

    /// Extracts the resource bar.
    fn extract_resources(&self, page: &str) -> Option<Resources>;

    /// Extracts the chat socket endpoint.
    fn extract_chat_endpoint(&self, page: &str) -> Option<ChatEndpoint>;

    /// Returns true if lifeforms are enabled on this universe.
    fn extract_lifeform_enabled(&self, page: &str) -> bool;

    /// Extracts the interface language selected in preferences.
    fn extract_language(&self, page: &str) -> Option<String>;
}

// ============================================================================
// Challenge Solving
// ============================================================================

/// External, possibly interactive, challenge solver.
///
/// The answer is the index (`0..=3`) of the icon matching the question.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Solves one challenge.
    async fn solve(
        &self,
        question: &[u8],
        icons: &[u8],
        cancel: &CancellationToken,
    ) -> Result<i64, SessionError>;
}

/// Adapter turning a plain closure into a [`ChallengeSolver`].
pub struct FnSolver<F>(pub F);

#[async_trait]
impl<F> ChallengeSolver for FnSolver<F>
where
    F: Fn(&[u8], &[u8]) -> Result<i64, SessionError> + Send + Sync,
{
    async fn solve(
        &self,
        question: &[u8],
        icons: &[u8],
        cancel: &CancellationToken,
    ) -> Result<i64, SessionError> {
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        (self.0)(question, icons)
    }
}

#[async_trait]
impl<T: ChallengeSolver + ?Sized> ChallengeSolver for Arc<T> {
    async fn solve(
        &self,
        question: &[u8],
        icons: &[u8],
        cancel: &CancellationToken,
    ) -> Result<i64, SessionError> {
        (**self).solve(question, icons, cancel).await
    }
}

// ============================================================================
// Device Fingerprint
// ============================================================================

/// Produces the device fingerprint ("blackbox") sent with lobby requests.
pub trait DeviceFingerprint: Send + Sync {
    /// Returns the encoded fingerprint, without the `tra:` prefix.
    fn blackbox(&self) -> Result<String, SessionError>;
}

/// Fingerprint that always returns the same pre-computed value.
#[derive(Debug, Clone, Default)]
pub struct StaticFingerprint {
    blackbox: String,
}

impl StaticFingerprint {
    /// Creates a fingerprint from a pre-computed blackbox.
    pub fn new(blackbox: impl Into<String>) -> Self {
        Self {
            blackbox: blackbox.into(),
        }
    }
}

impl DeviceFingerprint for StaticFingerprint {
    fn blackbox(&self) -> Result<String, SessionError> {
        Ok(self.blackbox.clone())
    }
}
