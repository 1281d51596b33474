//! External collaborator port traits (operations, sealing, refresh).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use callgate_domain::{CallValue, TargetInvocationError};

use super::error::CipherError;

// =============================================================================
// Operation Resolution
// =============================================================================

/// A named operation a callback can target.
///
/// Implementations may block on I/O; the dispatcher awaits them to
/// completion and never lets their errors escape to the transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Operation: Send + Sync {
    async fn invoke(&self, args: Vec<Value>) -> Result<CallValue, TargetInvocationError>;
}

/// Resolves qualified operation names to invocable handles.
#[cfg_attr(test, mockall::automock)]
pub trait OperationResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Operation>>;
}

// =============================================================================
// Token Sealing
// =============================================================================

/// Authenticated encryption of opaque byte strings under a process-wide key.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCipherPort: Send + Sync {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CipherError>;
}

// =============================================================================
// Client Refresh
// =============================================================================

/// Marks client state dirty after a callback without return value.
#[cfg_attr(test, mockall::automock)]
pub trait RefreshPort: Send + Sync {
    fn mark_dirty(&self, callback_id: Option<String>);
}
