//! In-memory operation registry.
//!
//! Host code registers named operations at startup; the codec checks offers
//! against it and the dispatcher resolves targets through it.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use callgate_domain::{CallValue, TargetInvocationError};

use crate::infrastructure::ports::{Operation, OperationResolver};

/// Operation backed by an async closure.
pub struct FnOperation<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnOperation<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CallValue, TargetInvocationError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _fut: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Operation for FnOperation<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CallValue, TargetInvocationError>> + Send,
{
    async fn invoke(&self, args: Vec<Value>) -> Result<CallValue, TargetInvocationError> {
        (self.f)(args).await
    }
}

/// Registry of invocable operations keyed by qualified name.
#[derive(Default)]
pub struct OperationRegistry {
    operations: DashMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an operation.
    pub fn register(&self, name: impl Into<String>, operation: Arc<dyn Operation>) {
        let name = name.into();
        if self.operations.insert(name.clone(), operation).is_some() {
            tracing::warn!(operation = %name, "Replaced existing callback operation");
        } else {
            tracing::debug!(operation = %name, "Registered callback operation");
        }
    }

    /// Register an async closure as an operation.
    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallValue, TargetInvocationError>> + Send + 'static,
    {
        self.register(name, Arc::new(FnOperation::new(f)));
    }

    /// Remove an operation. Tokens already handed out for it fail at dispatch.
    pub fn unregister(&self, name: &str) -> bool {
        self.operations.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl OperationResolver for OperationRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).map(|entry| entry.value().clone())
    }
}

/// Name of the built-in liveness operation.
pub const PING_OPERATION: &str = "system.ping";
/// Name of the built-in operation returning its arguments.
pub const ECHO_OPERATION: &str = "system.echo";

/// Register the operations every deployment carries.
pub fn register_builtin_operations(registry: &OperationRegistry) {
    registry.register_fn(PING_OPERATION, |_args: Vec<Value>| async {
        Ok(CallValue::Json(Value::String("pong".to_string())))
    });
    registry.register_fn(ECHO_OPERATION, |args: Vec<Value>| async move {
        Ok(CallValue::Json(Value::Array(args)))
    });
}
