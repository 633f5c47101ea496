//! Shared helpers for integration tests

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Greeting the scripted server sends right after the handshake, matching
/// the real backend's behavior.
pub const GREETING: &str = "Bot: Hello! I'm ready to assist you.";

/// Spawns a scripted WebSocket chat server on an ephemeral port.
///
/// Behavior per connection:
/// - the request URI is reported on the returned channel
/// - a greeting is sent immediately after the handshake
/// - every text frame `t` is echoed back as `Bot: you said {t}`
/// - the literal frame `close` triggers an orderly server-side close
///
/// Returns the bound address and the URI channel.
pub async fn spawn_chat_server() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let (uri_tx, uri_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let uri_tx = uri_tx.clone();
            tokio::spawn(handle_connection(stream, uri_tx));
        }
    });

    (addr, uri_rx)
}

async fn handle_connection(stream: TcpStream, uri_tx: mpsc::UnboundedSender<String>) {
    let callback = |req: &Request, resp: Response| {
        let _ = uri_tx.send(req.uri().to_string());
        Ok(resp)
    };
    let mut ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(_) => return,
    };

    if ws.send(WsMessage::Text(GREETING.to_string())).await.is_err() {
        return;
    }

    while let Some(Ok(frame)) = ws.next().await {
        match frame {
            WsMessage::Text(text) => {
                if text == "close" {
                    let _ = ws.close(None).await;
                    break;
                }
                let reply = format!("Bot: you said {}", text);
                if ws.send(WsMessage::Text(reply)).await.is_err() {
                    break;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
}
