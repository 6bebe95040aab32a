//! A hub connection delivering merged events over a WebSocket feed.

use crate::events::FeedEvent;
use crate::events::MERGE_MESSAGE_EVENT;
use async_trait::async_trait;
use futures_util::SinkExt;
use futures_util::StreamExt;
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tracing::debug;
use tracing::warn;
use url::Url;

pub const CONNECT_TIMEOUT_SECS: u64 = 10;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Connection(#[from] tungstenite::Error),

    #[error("Connection to the hub timed out after {} seconds", CONNECT_TIMEOUT_SECS)]
    ConnectTimeout,

    #[error("The hub rejected the subscription: {reason}")]
    SubscriptionRejected { reason: String },

    #[error("The hub closed the event stream")]
    StreamClosed,

    #[error("Invalid hub auth token")]
    InvalidAuthToken(#[from] InvalidHeaderValue),

    #[error("Failed to encode the subscription request: {0}")]
    EncodeRequest(serde_json::Error),
}

/// Event categories a hub subscription can be scoped to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HubEventKind {
    /// A message accepted by the hub and merged into its state.
    MergeMessage,
}

impl HubEventKind {
    fn wire_name(self) -> &'static str {
        match self {
            HubEventKind::MergeMessage => MERGE_MESSAGE_EVENT,
        }
    }
}

#[automock]
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Opens a fresh connection subscribed to the given event kinds.
    async fn subscribe(
        &self,
        kinds: Vec<HubEventKind>,
    ) -> Result<Box<dyn HubEventStream>, HubError>;
}

#[async_trait]
#[automock]
pub trait HubEventStream: Send + Sync {
    /// The next event envelope, `None` once the stream ended.
    ///
    /// Unparseable envelopes are skipped, not reported as errors.
    async fn next(&mut self) -> Option<Result<FeedEvent, HubError>>;

    /// Closes the connection underneath the stream.
    async fn close(&mut self);
}

#[derive(Debug, Serialize)]
struct SubscribeRequest {
    #[serde(rename = "type")]
    request_type: &'static str,

    #[serde(rename = "eventTypes")]
    event_types: Vec<&'static str>,
}

impl SubscribeRequest {
    fn new(kinds: &[HubEventKind]) -> Self {
        SubscribeRequest {
            request_type: "subscribe",
            event_types: kinds.iter().map(|kind| kind.wire_name()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubscribeReply {
    #[serde(rename = "type")]
    reply_type: String,

    message: Option<String>,
}

fn check_subscribe_reply(frame: &str) -> Result<(), HubError> {
    match serde_json::from_str::<SubscribeReply>(frame) {
        Ok(reply) if reply.reply_type == "subscribed" => Ok(()),
        Ok(reply) => Err(HubError::SubscriptionRejected {
            reason: reply.message.unwrap_or(reply.reply_type),
        }),
        Err(_) => Err(HubError::SubscriptionRejected {
            reason: format!("unexpected reply: {frame}"),
        }),
    }
}

async fn await_subscribe_ack(socket: &mut WsStream) -> Result<(), HubError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(frame))) => return check_subscribe_reply(&frame),
            Some(Ok(Message::Close(_))) | None => return Err(HubError::StreamClosed),
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
        }
    }
}

/// Hub client connecting over a WebSocket, one connection per subscription.
pub struct WsHubClient {
    hub_url: Url,
    auth_token: String,
}

impl WsHubClient {
    pub fn new(hub_url: Url, auth_token: String) -> Self {
        WsHubClient {
            hub_url,
            auth_token,
        }
    }

    async fn connect(&self) -> Result<WsStream, HubError> {
        let mut request = self.hub_url.as_str().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.auth_token))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let connecting = connect_async(request);
        let (socket, _) = timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connecting)
            .await
            .map_err(|_| HubError::ConnectTimeout)??;
        Ok(socket)
    }
}

#[async_trait]
impl HubClient for WsHubClient {
    async fn subscribe(
        &self,
        kinds: Vec<HubEventKind>,
    ) -> Result<Box<dyn HubEventStream>, HubError> {
        let mut socket = self.connect().await?;

        let request = SubscribeRequest::new(&kinds);
        let frame = serde_json::to_string(&request).map_err(HubError::EncodeRequest)?;
        socket.send(Message::text(frame)).await?;
        await_subscribe_ack(&mut socket).await?;

        Ok(Box::new(WsHubStream { socket }))
    }
}

struct WsHubStream {
    socket: WsStream,
}

#[async_trait]
impl HubEventStream for WsHubStream {
    async fn next(&mut self) -> Option<Result<FeedEvent, HubError>> {
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(frame))) => match FeedEvent::parse_from(&frame) {
                    Ok(event) => return Some(Ok(event)),
                    Err(err) => {
                        warn!("Skipping an unparseable hub event: {err}");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) => {
                    debug!("The hub closed the connection");
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Some(Err(err.into())),
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.socket.close(None).await;
    }
}
