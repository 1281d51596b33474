//! Port traits for host collaborators.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Operation resolution (which named operations a callback may target)
//! - Token sealing (could swap XChaCha20-Poly1305 -> a host-provided crypt)
//! - Client refresh (could swap the broadcast notifier -> a UI framework hook)

mod error;
mod external;

pub use error::CipherError;
pub use external::{Operation, OperationResolver, RefreshPort, TokenCipherPort};

#[cfg(test)]
pub use external::{MockOperation, MockOperationResolver, MockRefreshPort, MockTokenCipherPort};
