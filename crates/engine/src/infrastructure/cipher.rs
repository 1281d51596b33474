//! XChaCha20-Poly1305 token sealing.
//!
//! Sealed layout: `nonce (24 bytes) || ciphertext || tag (16 bytes)`. A fresh
//! random nonce is drawn for every seal, so sealing the same descriptor twice
//! yields different tokens.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;

use crate::infrastructure::ports::{CipherError, TokenCipherPort};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// Process-wide token key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Fresh random key. Tokens sealed with it die with the process.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a key from 64 hex characters.
    pub fn from_hex(value: &str) -> Result<Self, KeyParseError> {
        let bytes = hex::decode(value.trim()).map_err(|e| KeyParseError::Hex(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| KeyParseError::Length(b.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("Key is not valid hex: {0}")]
    Hex(String),
    #[error("Key must be {KEY_LEN} bytes, got {0}")]
    Length(usize),
}

/// XChaCha20-Poly1305 implementation of [`TokenCipherPort`].
#[derive(Clone)]
pub struct XChaChaTokenCipher {
    cipher: XChaCha20Poly1305,
}

impl XChaChaTokenCipher {
    pub fn new(key: &SecretKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(&key.0)),
        }
    }
}

impl TokenCipherPort for XChaChaTokenCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| CipherError::seal(format!("XChaCha20-Poly1305 encryption failed: {e}")))?;

        // Prepend nonce to ciphertext
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Open)
    }
}
