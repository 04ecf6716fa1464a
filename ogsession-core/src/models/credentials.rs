//! Login credentials.

use std::fmt;

/// Input for one login attempt.
///
/// Never persisted. The `Debug` output redacts the password and OTP secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Lobby identity (usually an email address).
    pub username: String,
    /// Lobby password.
    pub password: String,
    /// Base32 TOTP seed, when the account has two-factor auth enabled.
    pub otp_secret: Option<String>,
    /// Challenge id carried over from a previous attempt.
    pub challenge_id: Option<String>,
}

impl Credentials {
    /// Creates credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            otp_secret: None,
            challenge_id: None,
        }
    }

    /// Attaches a TOTP seed.
    pub fn with_otp_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.otp_secret = (!secret.is_empty()).then_some(secret);
        self
    }

    /// Attaches a challenge id solved out of band.
    pub fn with_challenge_id(mut self, challenge_id: impl Into<String>) -> Self {
        let id = challenge_id.into();
        self.challenge_id = (!id.is_empty()).then_some(id);
        self
    }

    /// Returns true if both username and password are present.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("otp_secret", &self.otp_secret.as_ref().map(|_| "<redacted>"))
            .field("challenge_id", &self.challenge_id)
            .finish()
    }
}
