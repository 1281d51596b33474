//! Callback dispatch: token in, HTTP-shaped outcome out.

use std::sync::Arc;

use callgate_domain::invocation::{STATUS_BAD_REQUEST, STATUS_INTERNAL_SERVER_ERROR};
use callgate_domain::{
    build_arguments, mime, CallValue, CallbackDescriptor, InvalidTargetError, InvalidTokenError,
    InvocationRequest, InvocationResult, RequestMethod, TargetInvocationError,
};

use super::codec::CallbackCodec;
use crate::infrastructure::ports::{OperationResolver, RefreshPort};

/// Handles inbound callback invocations.
///
/// Never fails: token, resolution, and operation errors all become
/// [`InvocationResult::Fail`].
pub struct Dispatcher {
    codec: Arc<CallbackCodec>,
    resolver: Arc<dyn OperationResolver>,
    refresh: Arc<dyn RefreshPort>,
}

impl Dispatcher {
    pub fn new(
        codec: Arc<CallbackCodec>,
        resolver: Arc<dyn OperationResolver>,
        refresh: Arc<dyn RefreshPort>,
    ) -> Self {
        Self {
            codec,
            resolver,
            refresh,
        }
    }

    /// Decode the token, invoke the target, and map the outcome.
    pub async fn dispatch(&self, request: InvocationRequest) -> InvocationResult {
        let Some(token) = request.token() else {
            tracing::debug!("Callback request without token");
            return InvocationResult::fail(STATUS_BAD_REQUEST, InvalidTokenError.to_string());
        };
        let descriptor = match self.codec.decode(token) {
            Ok(descriptor) => descriptor,
            Err(e) => return InvocationResult::fail(STATUS_BAD_REQUEST, e.to_string()),
        };

        let target = descriptor.target_name().to_string();
        let args = build_arguments(&descriptor, &request);
        tracing::debug!(
            target_name = %target,
            flags = descriptor.flags().bits(),
            arg_count = args.len(),
            "Dispatching callback"
        );

        let Some(operation) = self.resolver.resolve(&target) else {
            let error = InvalidTargetError::new(&target);
            tracing::error!(target_name = %target, error = %error, "Callback target not found");
            return InvocationResult::fail(STATUS_INTERNAL_SERVER_ERROR, error.to_string());
        };

        let value = match operation.invoke(args).await {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(
                    target_name = %target,
                    status = error.status_code(),
                    error = %error,
                    "Callback operation failed"
                );
                return error.into_result();
            }
        };

        self.complete(&descriptor, &request, value)
    }

    fn complete(
        &self,
        descriptor: &CallbackDescriptor,
        request: &InvocationRequest,
        value: CallValue,
    ) -> InvocationResult {
        let flags = descriptor.flags();

        if flags.returns_value() {
            return match serialize(value, descriptor.mime_type()) {
                Ok(result) => result,
                Err(error) => {
                    tracing::error!(
                        target_name = %descriptor.target_name(),
                        error = %error,
                        "Failed to serialize callback return value"
                    );
                    error.into_result()
                }
            };
        }

        if request.method == RequestMethod::Get {
            tracing::warn!(
                target_name = %descriptor.target_name(),
                "Callback received with method GET while configured to not return a value"
            );
        }

        if flags.immediate_update_disabled() {
            InvocationResult::Acknowledged
        } else {
            self.refresh.mark_dirty(descriptor.id().map(str::to_string));
            InvocationResult::Refresh
        }
    }
}

fn serialize(
    value: CallValue,
    mime_override: Option<&str>,
) -> Result<InvocationResult, TargetInvocationError> {
    let (mime_type, body) = match value {
        CallValue::Xml(text) => (mime::XML, text),
        CallValue::Json(value) => (
            mime::JSON,
            serde_json::to_string(&value).map_err(TargetInvocationError::message)?,
        ),
    };

    Ok(InvocationResult::Value {
        mime_type: mime_override.unwrap_or(mime_type).to_string(),
        body,
    })
}
