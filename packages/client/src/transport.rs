//! Relay transport: one persistent event connection per open.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use huddle_shared::protocol::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        http::{HeaderValue, StatusCode, header::AUTHORIZATION},
        protocol::Message,
    },
};

use crate::{
    credential::BearerToken,
    error::{AuthError, ConnectError, TransportError},
};

/// An open relay connection.
///
/// Dropping `outbound` closes the connection; `inbound` yields `None` once the
/// relay side is gone.
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub inbound: mpsc::UnboundedReceiver<ServerEvent>,
}

/// Opens authenticated relay connections
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, token: &BearerToken) -> Result<TransportLink, ConnectError>;
}

/// WebSocket transport sending the bearer token in the upgrade request
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, token: &BearerToken) -> Result<TransportLink, ConnectError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let authorization = HeaderValue::from_str(&token.header_value())
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, authorization);

        let (ws_stream, _response) = connect_async(request).await.map_err(classify)?;
        tracing::info!("Connected to relay at {}", self.url);

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(event) => {
                            let json = match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!("Failed to serialize {}: {}", event.name(), e);
                                    continue;
                                }
                            };
                            tracing::debug!("-> {}", json);
                            if let Err(e) = write.send(Message::Text(json.into())).await {
                                tracing::warn!("Failed to send to relay: {}", e);
                                break;
                            }
                        }
                        None => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                    },
                    incoming = read.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            tracing::debug!("<- {}", text.as_str());
                            match serde_json::from_str::<ServerEvent>(text.as_str()) {
                                Ok(event) => {
                                    if inbound_tx.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => tracing::warn!("Ignoring unparseable relay frame: {}", e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Relay closed the connection");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("WebSocket read error: {}", e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    },
                }
            }
        });

        Ok(TransportLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Map a handshake failure to an auth rejection or a transient transport error
fn classify(error: tungstenite::Error) -> ConnectError {
    if let tungstenite::Error::Http(response) = &error {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return AuthError::Rejected {
                status: status.as_u16(),
            }
            .into();
        }
    }
    TransportError::Connect(error.to_string()).into()
}
