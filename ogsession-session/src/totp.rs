//! Time-based one-time passcodes (RFC 6238, SHA1, 6 digits, 30 s).

use ogsession_core::SessionError;
use totp_rs::{Algorithm, Secret, TOTP};

const PERIOD_SECS: u64 = 30;
const DIGITS: usize = 6;
const SKEW: u8 = 1;

/// Generates the passcode for the current time.
pub fn generate(secret: &str) -> Result<String, SessionError> {
    build(secret)?
        .generate_current()
        .map_err(|e| SessionError::Config(format!("system clock before epoch: {e}")))
}

/// Generates the passcode for a unix timestamp.
pub fn generate_at(secret: &str, unix_secs: u64) -> Result<String, SessionError> {
    Ok(build(secret)?.generate(unix_secs))
}

/// Authenticator apps show secrets grouped, lowercased, or padded.
fn normalize(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '='))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn build(secret: &str) -> Result<TOTP, SessionError> {
    let bytes = Secret::Encoded(normalize(secret))
        .to_bytes()
        .map_err(|_| SessionError::Config("OTP secret is not valid base32".to_string()))?;
    TOTP::new(Algorithm::SHA1, DIGITS, SKEW, PERIOD_SECS, bytes)
        .map_err(|e| SessionError::Config(format!("OTP secret rejected: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // "12345678901234567890" in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_rfc6238_vectors() {
        assert_eq!(generate_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(generate_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(generate_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
        assert_eq!(generate_at(RFC_SECRET, 2_000_000_000).unwrap(), "279037");
    }

    #[test]
    fn test_secret_formatting_is_ignored() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(generate_at(spaced, 59).unwrap(), "287082");
        assert_eq!(normalize("ab-cd=="), "ABCD");
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(generate_at("not base32!", 0), Err(SessionError::Config(_))));
        assert!(matches!(generate_at("", 0), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_current_code_has_six_digits() {
        let code = generate(RFC_SECRET).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
