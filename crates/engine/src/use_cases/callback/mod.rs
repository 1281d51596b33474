//! Callback use cases.
//!
//! Offering a callback seals a reference to a registered operation into a
//! token; dispatching opens the token again and runs the operation with the
//! merged arguments.

use std::sync::Arc;

mod codec;
mod dispatch;

pub use codec::{CallbackCodec, CallbackOffer, EncodeError};
pub use dispatch::Dispatcher;

/// Container for callback use cases.
pub struct CallbackUseCases {
    pub codec: Arc<CallbackCodec>,
    pub dispatcher: Arc<Dispatcher>,
}

impl CallbackUseCases {
    pub fn new(codec: Arc<CallbackCodec>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { codec, dispatcher }
    }
}
