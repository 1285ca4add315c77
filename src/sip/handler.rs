// ABOUTME: User-facing message handler trait and the registry that fans messages out
// ABOUTME: Handlers run serially in registration order; a failing handler never breaks the loop

use crate::sip::message::SipMessage;
use crate::sip::transport::{Connection, MessageCallback};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Invoked for every inbound SIP message.
///
/// Errors are logged at warn and swallowed so later handlers and the
/// read loop keep running.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(
        &self,
        connection: &Connection,
        message: &SipMessage,
    ) -> Result<(), crate::Error>;
}

/// Ordered handler list shared between a dispatcher and the callbacks
/// it hands to transports.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, handler: Arc<dyn MessageHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    fn snapshot(&self) -> Vec<Arc<dyn MessageHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Builds the transport callback that drives this registry.
    pub(crate) fn callback(self: &Arc<Self>) -> MessageCallback {
        let registry = Arc::clone(self);
        Arc::new(move |connection, message| {
            let handlers = registry.snapshot();
            Box::pin(async move {
                if handlers.is_empty() {
                    debug!(
                        "no handlers registered; dropping message from {}",
                        connection.remote_address()
                    );
                    return;
                }
                for handler in handlers {
                    if let Err(err) = handler.on_message(&connection, &message).await {
                        warn!(
                            "handler failed for message from {}: {err}",
                            connection.remote_address()
                        );
                    }
                }
            })
        })
    }
}
