//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    cipher::{SecretKey, XChaChaTokenCipher},
    config::AppConfig,
    operations::OperationRegistry,
    refresh::RefreshNotifier,
};
use crate::use_cases::callback::{CallbackCodec, CallbackUseCases, Dispatcher};

/// Main application state.
///
/// Built once at startup and passed to HTTP handlers via Axum state. The
/// key material lives inside the codec and never changes afterwards.
pub struct App {
    pub config: AppConfig,
    pub operations: Arc<OperationRegistry>,
    pub refresh: Arc<RefreshNotifier>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub callback: CallbackUseCases,
}

impl App {
    /// Wire the codec and dispatcher around the given key.
    pub fn new(config: AppConfig, key: &SecretKey) -> Self {
        let operations = Arc::new(OperationRegistry::new());
        let refresh = Arc::new(RefreshNotifier::new());

        let codec = Arc::new(CallbackCodec::new(
            Arc::new(XChaChaTokenCipher::new(key)),
            operations.clone(),
            config.callback_path.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            codec.clone(),
            operations.clone(),
            refresh.clone(),
        ));

        Self {
            config,
            operations,
            refresh,
            use_cases: UseCases {
                callback: CallbackUseCases::new(codec, dispatcher),
            },
        }
    }

    /// Build from configuration, falling back to an ephemeral key.
    pub fn from_config(config: AppConfig) -> Self {
        let key = match &config.secret_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!(
                    "CALLGATE_SECRET_KEY not set, generated an ephemeral key; \
                     callback URLs will not survive a restart"
                );
                SecretKey::generate()
            }
        };
        Self::new(config, &key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::operations::{register_builtin_operations, PING_OPERATION};

    #[test]
    fn test_tokens_from_one_app_do_not_open_in_another_without_shared_key() {
        let first = App::from_config(AppConfig::default());
        let second = App::from_config(AppConfig::default());
        register_builtin_operations(&first.operations);

        let url = first
            .use_cases
            .callback
            .codec
            .callback_url(PING_OPERATION, None)
            .expect("url");
        let token = url.strip_prefix("/callback?m=").expect("url shape");

        assert!(first.use_cases.callback.codec.decode(token).is_ok());
        assert!(second.use_cases.callback.codec.decode(token).is_err());
    }

    #[test]
    fn test_configured_key_is_shared_across_instances() {
        let config = AppConfig {
            secret_key: Some(SecretKey::from_bytes([5u8; 32])),
            ..AppConfig::default()
        };
        let first = App::from_config(config.clone());
        let second = App::from_config(config);
        register_builtin_operations(&first.operations);

        let url = first
            .use_cases
            .callback
            .codec
            .callback_url(PING_OPERATION, Some("ping"))
            .expect("url");
        let token = url.strip_prefix("/callback?m=").expect("url shape");

        let descriptor = second.use_cases.callback.codec.decode(token).expect("decode");
        assert_eq!(descriptor.target_name(), PING_OPERATION);
    }
}
