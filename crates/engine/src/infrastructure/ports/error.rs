//! Error types for port operations.

/// Token sealing/opening errors.
///
/// `Open` carries no reason: a failed open is reported to the
/// client only as an invalid callback url.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// Encryption failed - includes the underlying cause for tracing.
    #[error("Failed to seal token: {0}")]
    Seal(String),

    /// Sealed data is shorter than nonce + tag.
    #[error("Sealed token is truncated")]
    Truncated,

    /// Authentication or decryption failed.
    #[error("Sealed token failed authentication")]
    Open,
}

impl CipherError {
    /// Create a Seal error.
    pub fn seal(message: impl ToString) -> Self {
        Self::Seal(message.to_string())
    }
}
