//! Integration tests spanning the SMS codec and the SIP transport stack

use crate::sip::transport::{
    Connection, MessageCallback, MessageSink, Transport, TransportResult,
};
use crate::sip::{
    SipClient, SipError, SipMessage, SipServer, TcpClientTransport, TcpServerTransport,
};
use crate::sms::{
    decode_sms, encode_sms, Address, DataCodingScheme, SmsDeliver, SmsMessage, SmsStatusReport,
    SmsSubmit, Tpdu, UserData, ValidityPeriod,
};
use crate::MessageHandler;
use async_trait::async_trait;
use chrono::DateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

struct NullSink;

#[async_trait]
impl MessageSink for NullSink {
    async fn send_bytes(&self, _payload: &[u8]) -> TransportResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

struct MockTransport {
    callback_slot: Arc<Mutex<Option<MessageCallback>>>,
    started: Arc<AtomicBool>,
}

impl MockTransport {
    fn new() -> (Self, Arc<Mutex<Option<MessageCallback>>>, Arc<AtomicBool>) {
        let callback_slot = Arc::new(Mutex::new(None));
        let started = Arc::new(AtomicBool::new(false));
        (
            Self {
                callback_slot: callback_slot.clone(),
                started: started.clone(),
            },
            callback_slot,
            started,
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn bind(&mut self, callback: MessageCallback) {
        *self.callback_slot.lock().unwrap() = Some(callback);
    }

    async fn start(&mut self) -> TransportResult<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> TransportResult<()> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct RecordingHandler {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
    fail: bool,
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn on_message(
        &self,
        _connection: &Connection,
        _message: &SipMessage,
    ) -> crate::Result<()> {
        self.log.lock().unwrap().push(self.label);
        if self.fail {
            return Err("handler exploded".into());
        }
        Ok(())
    }
}

struct CaptureHandler {
    tx: Mutex<Option<oneshot::Sender<SipMessage>>>,
}

impl CaptureHandler {
    fn new(tx: oneshot::Sender<SipMessage>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

#[async_trait]
impl MessageHandler for CaptureHandler {
    async fn on_message(
        &self,
        _connection: &Connection,
        message: &SipMessage,
    ) -> crate::Result<()> {
        if let Some(tx) = self.tx.lock().unwrap().take() {
            let _ = tx.send(message.clone());
        }
        Ok(())
    }
}

fn echo_callback() -> MessageCallback {
    Arc::new(|connection, message| {
        Box::pin(async move {
            if message.is_request() {
                let call_id = message.get_header("call-id").unwrap_or("?").to_string();
                let response = SipMessage::response(200, "OK").header("Call-ID", call_id);
                let _ = connection.send(response).await;
            }
        })
    })
}

#[cfg(test)]
mod sms_integration {
    use super::*;

    fn scts(s: &str) -> chrono::DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn every_supported_tpdu_survives_a_roundtrip() {
        let smsc = Some(Address::from_string("+447497272726"));
        let header = vec![0x00, 0x03, 0x42, 0x02, 0x02];
        let messages = vec![
            SmsMessage::new(
                smsc.clone(),
                Tpdu::Deliver(SmsDeliver {
                    originating_address: Address::from_string("+4915123456789"),
                    pid: 0x40,
                    dcs: DataCodingScheme::from_raw(0x04),
                    service_centre_time_stamp: scts("2024-03-01T08:15:30+01:00"),
                    user_data: UserData::bytes(vec![1, 2, 3]).with_header(header.clone()),
                    status_report_indication: true,
                    more_messages: true,
                    reply_path: false,
                }),
            ),
            SmsMessage::new(
                None,
                Tpdu::Submit(SmsSubmit {
                    message_reference: 0xFF,
                    destination_address: Address::from_string("447700900123"),
                    pid: 0,
                    dcs: DataCodingScheme::from_raw(0x00),
                    user_data: UserData::text("weekly report {ok}"),
                    status_report_request: true,
                    reject_duplicates: true,
                    reply_path: true,
                    validity_period: ValidityPeriod::Relative(Duration::from_secs(
                        5 * 7 * 24 * 3600,
                    )),
                }),
            ),
            SmsMessage::new(
                smsc,
                Tpdu::StatusReport(SmsStatusReport {
                    message_reference: 0x42,
                    recipient_address: Address::from_string("+441234567890"),
                    service_centre_time_stamp: scts("2024-03-01T08:15:30+00:00"),
                    discharge_time: scts("2024-03-01T08:15:35+00:00"),
                    status: 0x00,
                    pid: Some(0x00),
                    dcs: Some(DataCodingScheme::from_raw(0x08)),
                    user_data: Some(UserData::text("受信")),
                    more_messages: false,
                    status_report_qualifier: true,
                    reply_path: false,
                }),
            ),
        ];
        for message in messages {
            let encoded = encode_sms(&message).unwrap();
            let decoded = decode_sms(&encoded).unwrap();
            assert_eq!(decoded, message);
            // And the re-encode is bit exact.
            assert_eq!(encode_sms(&decoded).unwrap(), encoded);
        }
    }
}

#[cfg(test)]
mod dispatch {
    use super::*;

    #[test]
    fn server_requires_at_least_one_transport() {
        assert!(matches!(
            SipServer::new(Vec::new()),
            Err(SipError::State(_))
        ));
    }

    #[tokio::test]
    async fn handlers_run_in_order_and_failures_are_swallowed() {
        let (mock, callback_slot, _started) = MockTransport::new();
        let mut server = SipServer::new(vec![Box::new(mock)]).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        server.register_handler(Arc::new(RecordingHandler {
            label: "first",
            log: log.clone(),
            fail: true,
        }));
        server.register_handler(Arc::new(RecordingHandler {
            label: "second",
            log: log.clone(),
            fail: false,
        }));
        server.start().await.unwrap();

        let callback = callback_slot.lock().unwrap().clone().unwrap();
        let connection = Connection::new("mock-peer", Arc::new(NullSink));
        let message = SipMessage::request("OPTIONS", "sip:test");
        callback(connection.clone(), message.clone()).await;
        callback(connection, message).await;

        // Two handlers per message, in registration order, despite the
        // first one failing every time.
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first", "second", "first", "second"]
        );
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn add_transport_rejected_while_running() {
        let (mock, _slot, started) = MockTransport::new();
        let mut server = SipServer::new(vec![Box::new(mock)]).unwrap();
        server.start().await.unwrap();
        assert!(started.load(Ordering::SeqCst));

        let (other, _other_slot, _other_started) = MockTransport::new();
        assert!(matches!(
            server.add_transport(Box::new(other)),
            Err(SipError::State(_))
        ));

        server.stop().await.unwrap();
        assert!(!started.load(Ordering::SeqCst));
        let (third, _third_slot, _third_started) = MockTransport::new();
        server.add_transport(Box::new(third)).unwrap();
    }

    #[tokio::test]
    async fn run_forever_exits_on_shutdown() {
        let (mock, _slot, started) = MockTransport::new();
        let mut server = SipServer::new(vec![Box::new(mock)]).unwrap();
        server.shutdown();
        timeout(Duration::from_secs(5), server.run_forever())
            .await
            .unwrap()
            .unwrap();
        assert!(!server.is_running());
        assert!(!started.load(Ordering::SeqCst));
    }
}

#[cfg(test)]
mod tcp_transport {
    use super::*;

    #[tokio::test]
    async fn unbound_transport_fails_to_start() {
        let mut transport = TcpServerTransport::new("127.0.0.1", 0);
        assert!(matches!(
            transport.start().await,
            Err(SipError::State(_))
        ));
    }

    #[tokio::test]
    async fn send_before_connect_is_a_state_error() {
        let client = SipClient::new(TcpClientTransport::new("127.0.0.1", 5060));
        assert!(matches!(
            client.send("ping").await,
            Err(SipError::State(_))
        ));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn register_echo_roundtrip() {
        let mut server_transport = TcpServerTransport::new("127.0.0.1", 0);
        server_transport.bind(echo_callback());
        server_transport.start().await.unwrap();
        let addr = server_transport.local_addr().unwrap();

        let mut client = SipClient::new(TcpClientTransport::new("127.0.0.1", addr.port()));
        let (tx, rx) = oneshot::channel();
        client.register_handler(Arc::new(CaptureHandler::new(tx)));
        client.connect().await.unwrap();
        assert!(client.is_connected());

        let register = SipMessage::request("REGISTER", "sip:127.0.0.1")
            .header("Call-ID", "reg-1")
            .header("CSeq", "1 REGISTER");
        client.send(&register).await.unwrap();

        let response = timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
        assert!(response.is_response());
        assert_eq!(response.get_header("call-id"), Some("reg-1"));

        client.disconnect().await.unwrap();
        assert!(!client.is_connected());
        server_transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut server_transport = TcpServerTransport::new("127.0.0.1", 0);
        server_transport.bind(echo_callback());
        server_transport.start().await.unwrap();
        server_transport.stop().await.unwrap();
        server_transport.stop().await.unwrap();

        let mut client_transport = TcpClientTransport::new("127.0.0.1", 1);
        client_transport.bind(echo_callback());
        client_transport.stop().await.unwrap();
        client_transport.stop().await.unwrap();
    }
}

#[cfg(all(test, feature = "websocket"))]
mod websocket_transport {
    use super::*;
    use crate::sip::{WebSocketClientTransport, WebSocketServerTransport};

    #[tokio::test]
    async fn register_echo_roundtrip_over_ws() {
        let mut server_transport = WebSocketServerTransport::new("127.0.0.1", 0);
        server_transport.bind(echo_callback());
        server_transport.start().await.unwrap();
        let addr = server_transport.local_addr().unwrap();

        let mut client =
            SipClient::new(WebSocketClientTransport::new("127.0.0.1", addr.port()));
        let (tx, rx) = oneshot::channel();
        client.register_handler(Arc::new(CaptureHandler::new(tx)));
        client.connect().await.unwrap();

        let register = SipMessage::request("REGISTER", "sip:127.0.0.1")
            .header("Call-ID", "ws-reg-1");
        client.send(&register).await.unwrap();

        let response = timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
        assert!(response.is_response());
        assert_eq!(response.get_header("call-id"), Some("ws-reg-1"));

        client.disconnect().await.unwrap();
        server_transport.stop().await.unwrap();
    }
}
