// WebSocket test utilities: a real server on a random port and a small client.

use std::net::TcpListener;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use cardtable::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use cardtable::AppState;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type TestServer = (
    actix_web::dev::ServerHandle,
    std::net::SocketAddr,
    tokio::task::JoinHandle<Result<(), std::io::Error>>,
);

/// Serve every application route on 127.0.0.1 with an OS-assigned port.
pub async fn start_test_server(state: AppState) -> Result<TestServer, Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let state_data = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .configure(cardtable::routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let server_handle = server.handle();
    let join = tokio::spawn(server);

    Ok((server_handle, addr, join))
}

pub fn room_ws_url(addr: std::net::SocketAddr, room_code: &str, viewer: Option<&str>) -> String {
    match viewer {
        Some(viewer) => format!("ws://{addr}/api/rooms/{room_code}/ws?viewer={viewer}"),
        None => format!("ws://{addr}/api/rooms/{room_code}/ws"),
    }
}

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Connect, retrying until the server accepts or `timeout` passes.
    pub async fn connect_retry(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Text(value.to_string().into())).await?;
        Ok(())
    }

    /// Next text frame as JSON. `None` once the server closes the socket.
    pub async fn recv_json(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        loop {
            let next = tokio::time::timeout(timeout, self.stream.next())
                .await
                .map_err(|_| "Timeout waiting for message")?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(Box::new(err)),
            }
        }
    }

    /// Skip frames until one of type `kind` arrives.
    pub async fn recv_type(
        &mut self,
        kind: &str,
        timeout: Duration,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            match self.recv_json(timeout).await? {
                Some(msg) if msg["type"] == kind => return Ok(msg),
                Some(_) => continue,
                None => return Err(format!("socket closed before a {kind} message").into()),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}
