// ABOUTME: Demo: SIP server answering 200 OK to every request over TCP
// ABOUTME: Run with `cargo run --example sip_echo_server -- --port 5060`

use argh::FromArgs;
use async_trait::async_trait;
use sipsms::sip::{
    Connection, MessageHandler, SipMessage, SipServer, TcpServerTransport, Transport,
};
use std::sync::Arc;

/// SIP echo server: every inbound request gets a 200 OK.
#[derive(FromArgs)]
struct Args {
    /// listen host
    #[argh(option, default = "String::from(\"0.0.0.0\")")]
    host: String,

    /// listen port
    #[argh(option, default = "5060")]
    port: u16,
}

struct OkHandler;

#[async_trait]
impl MessageHandler for OkHandler {
    async fn on_message(
        &self,
        connection: &Connection,
        message: &SipMessage,
    ) -> sipsms::Result<()> {
        if message.is_request() {
            connection.send(SipMessage::response(200, "OK")).await?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let transports: Vec<Box<dyn Transport>> =
        vec![Box::new(TcpServerTransport::new(args.host, args.port))];
    let mut server = SipServer::new(transports)?;
    server.register_handler(Arc::new(OkHandler));
    server.run_forever().await?;
    Ok(())
}
