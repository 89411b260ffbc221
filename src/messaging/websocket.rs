use super::MessagingClient;
use crate::error::MessagingError;
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Messaging client speaking to a gateway over a WebSocket.
///
/// The connected flag is owned by the reader task, so it drops as soon as
/// the gateway closes the socket or the stream errors.
pub struct WebSocketClient {
    url: String,
    connected: Arc<AtomicBool>,
    sink: Mutex<Option<WsSink>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WebSocketClient {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            connected: Arc::new(AtomicBool::new(false)),
            sink: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MessagingClient for WebSocketClient {
    async fn connect(&self) -> Result<(), MessagingError> {
        let (stream, response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| MessagingError::Connect {
                    details: format!("{}: {}", self.url, e),
                })?;

        debug!("Gateway handshake completed with status {}", response.status());

        let (sink, mut source) = stream.split();
        *self.sink.lock().await = Some(sink);
        self.connected.store(true, Ordering::Release);

        let connected = Arc::clone(&self.connected);
        let handle = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Close(reason)) => {
                        info!("Messaging gateway closed the connection: {:?}", reason);
                        break;
                    }
                    Ok(message) => trace!("Gateway frame: {} bytes", message.len()),
                    Err(e) => {
                        warn!("Messaging connection error: {}", e);
                        break;
                    }
                }
            }
            connected.store(false, Ordering::Release);
        });

        if let Some(previous) = self.reader.lock().await.replace(handle) {
            previous.abort();
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn disconnect(&self) -> Result<(), MessagingError> {
        let sink = self.sink.lock().await.take();
        let reader = self.reader.lock().await.take();

        let result = match sink {
            Some(mut sink) => {
                let sent = sink.send(Message::Close(None)).await;
                let _ = sink.close().await;
                sent.map_err(|e| MessagingError::Disconnect {
                    details: e.to_string(),
                })
            }
            None => Ok(()),
        };

        // The reader exits once the close handshake completes
        if let Some(reader) = reader {
            let _ = reader.await;
        }
        self.connected.store(false, Ordering::Release);

        result
    }
}
