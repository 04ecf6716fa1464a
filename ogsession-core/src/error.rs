//! Core error types for ogsession.
//!
//! [`SessionError`] is the taxonomy every public operation returns. Callers
//! branch on it to decide whether to retry later, prompt the user for new
//! input, or abandon the session.

use thiserror::Error;

/// Error type shared by the login flow, the session controller, and the
/// task arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Network failure or timeout. Retrying the whole operation may succeed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session is no longer authenticated.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The lobby rejected the username/password pair.
    #[error("Bad credentials")]
    BadCredentials,

    /// The account has two-factor auth enabled and no passcode was sent.
    #[error("One-time passcode required")]
    OtpRequired,

    /// The passcode was rejected.
    #[error("One-time passcode invalid")]
    OtpInvalid,

    /// A challenge must be solved and the retry budget is exhausted, or no
    /// solver is configured.
    #[error("Challenge required: {challenge_id}")]
    ChallengeRequired {
        /// Opaque challenge identifier from the lobby.
        challenge_id: String,
    },

    /// The account or device is blocked.
    #[error("Account blocked")]
    AccountBlocked,

    /// The remote service answered with a 5xx status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No strategy knows how to read pages from this server version.
    #[error("Unsupported server version: {0}")]
    UnsupportedVersion(String),

    /// The universe could not be found in the server directory.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// The user has no account on the requested universe.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The lobby refused to issue a login link.
    #[error("Login link unavailable")]
    LoginLinkUnavailable,

    /// An anti-forgery token could not be obtained for an action.
    #[error("Missing token for page {0}")]
    MissingToken(String),

    /// A held slot outlived its configured hold timeout.
    #[error("Held slot {0} expired")]
    HoldExpired(String),

    /// The remote service answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The operation did not finish before its deadline.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl SessionError {
    /// Returns true if retrying the whole operation later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::UpstreamUnavailable(_)
                | Self::DeadlineExceeded
                | Self::NotAuthenticated
        )
    }

    /// Returns true if the caller has to supply new input before retrying.
    pub fn needs_user_input(&self) -> bool {
        matches!(
            self,
            Self::BadCredentials
                | Self::OtpRequired
                | Self::OtpInvalid
                | Self::ChallengeRequired { .. }
        )
    }

    /// Returns true if the error can never be fixed by retrying.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AccountBlocked
                | Self::UnsupportedVersion(_)
                | Self::ServerNotFound(_)
                | Self::AccountNotFound(_)
        ) || self.needs_user_input()
    }

    /// Returns true for cancellation and deadline errors.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
