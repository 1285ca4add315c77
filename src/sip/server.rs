// ABOUTME: Multi-transport SIP server coordinating lifecycle and handler dispatch
// ABOUTME: Transports start/stop serially; run_forever parks until shutdown is requested

use crate::sip::error::SipError;
use crate::sip::handler::{HandlerRegistry, MessageHandler};
use crate::sip::transport::{Transport, TransportResult};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Coordinates one or more server transports and the user handlers
/// invoked for every inbound message.
pub struct SipServer {
    transports: Vec<Box<dyn Transport>>,
    handlers: Arc<HandlerRegistry>,
    running: bool,
    shutdown: Arc<Notify>,
}

impl SipServer {
    /// Builds a server over the given transports; an empty list is a
    /// state error.
    pub fn new(mut transports: Vec<Box<dyn Transport>>) -> TransportResult<Self> {
        if transports.is_empty() {
            return Err(SipError::State("at least one transport must be provided"));
        }
        let handlers = Arc::new(HandlerRegistry::new());
        for transport in &mut transports {
            transport.bind(handlers.callback());
        }
        Ok(Self {
            transports,
            handlers,
            running: false,
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Attaches a handler invoked for every inbound SIP message, in
    /// registration order.
    pub fn register_handler(&self, handler: Arc<dyn MessageHandler>) {
        self.handlers.register(handler);
    }

    /// Adds a transport; only allowed while stopped.
    pub fn add_transport(&mut self, mut transport: Box<dyn Transport>) -> TransportResult<()> {
        if self.running {
            return Err(SipError::State(
                "cannot add transports while server is running",
            ));
        }
        transport.bind(self.handlers.callback());
        self.transports.push(transport);
        Ok(())
    }

    pub async fn start(&mut self) -> TransportResult<()> {
        if self.running {
            return Ok(());
        }
        info!(
            "starting SIP server with {} transport(s)",
            self.transports.len()
        );
        for transport in &mut self.transports {
            transport.start().await?;
        }
        self.running = true;
        Ok(())
    }

    pub async fn stop(&mut self) -> TransportResult<()> {
        if !self.running {
            return Ok(());
        }
        info!("stopping SIP server");
        for transport in &mut self.transports {
            transport.stop().await?;
        }
        self.running = false;
        Ok(())
    }

    /// Starts, parks until [`SipServer::shutdown`] fires, then stops.
    pub async fn run_forever(&mut self) -> TransportResult<()> {
        self.start().await?;
        let shutdown = self.shutdown.clone();
        shutdown.notified().await;
        self.stop().await
    }

    /// Releases a pending or future [`SipServer::run_forever`].
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn transports(&self) -> &[Box<dyn Transport>] {
        &self.transports
    }
}
