use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use quizreader_room::RoomConfig;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Single-connection room server. Records the request URI and every text
/// frame the client sends; pushes frames on demand. Pushes after the
/// connection ends are dropped. The server keeps reading after a close frame
/// in either direction until the client drops the transport.
pub struct TestRoomServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    after_close: Arc<Mutex<Vec<String>>>,
    received: mpsc::UnboundedReceiver<String>,
    push: mpsc::UnboundedSender<Message>,
}

impl TestRoomServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let after_close = Arc::new(Mutex::new(Vec::new()));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (push, mut push_rx) = mpsc::unbounded_channel::<Message>();

        let captured = requests.clone();
        let late = after_close.clone();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = accept_hdr_async(stream, move |req: &Request, resp: Response| {
                captured.lock().unwrap().push(req.uri().to_string());
                Ok(resp)
            })
            .await
            .unwrap();
            let (mut sink, mut source) = ws.split();
            let mut closed = false;

            loop {
                tokio::select! {
                    incoming = source.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let text = text.as_str().to_string();
                            if closed {
                                late.lock().unwrap().push(text.clone());
                            }
                            let _ = received_tx.send(text);
                        }
                        Some(Ok(Message::Close(_))) => closed = true,
                        Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    },
                    outgoing = push_rx.recv(), if !closed => match outgoing {
                        Some(message) => {
                            closed = matches!(message, Message::Close(_));
                            if sink.send(message).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Self {
            addr,
            requests,
            after_close,
            received,
            push,
        }
    }

    pub fn config(&self) -> RoomConfig {
        RoomConfig {
            server_url: format!("ws://{}/play/mp", self.addr),
            ..RoomConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Text frames the client sent after the close handshake began.
    pub fn texts_after_close(&self) -> Vec<String> {
        self.after_close.lock().unwrap().clone()
    }

    pub fn push_text(&self, text: &str) {
        let _ = self.push.send(Message::Text(text.to_string().into()));
    }

    pub fn push_close(&self, code: u16, reason: &str) {
        let _ = self.push.send(Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        })));
    }

    /// Next text frame from the client, parsed as JSON.
    pub async fn next_message(&mut self) -> Option<serde_json::Value> {
        let text = tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .ok()??;
        serde_json::from_str(&text).ok()
    }

    /// Wait until the connection task ends (client closed the transport).
    pub async fn wait_closed(&mut self) -> bool {
        let drain = async { while self.received.recv().await.is_some() {} };
        tokio::time::timeout(Duration::from_secs(2), drain).await.is_ok()
    }
}

/// Await one value from a handler-fed channel.
pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Option<T> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}
