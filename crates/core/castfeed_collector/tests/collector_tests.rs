use batcher::BatchConfig;
use batcher::CastBatcher;
use castfeed_collector::hub::WsHubClient;
use castfeed_collector::monitor::FeedMonitor;
use castfeed_collector::sink::HttpBatchSink;
use clock::Clock;
use clock::Timestamp;
use futures_util::SinkExt;
use futures_util::StreamExt;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::Request;
use tokio_tungstenite::tungstenite::handshake::server::Response;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const RECEIPT_MILLIS: i64 = 1_700_000_000_000;

struct TestClock;

impl Clock for TestClock {
    fn now(&self) -> Timestamp {
        datetime!(2023-11-14 22:13:20 UTC)
    }
}

struct FakeHub {
    url: Url,
    frames: mpsc::UnboundedSender<Message>,
    auth_header: oneshot::Receiver<String>,
    subscribe_frame: oneshot::Receiver<String>,
}

/// A hub accepting one subscriber and forwarding the frames given to it.
async fn spawn_fake_hub() -> FakeHub {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Message>();
    let (auth_tx, auth_rx) = oneshot::channel();
    let (subscribe_tx, subscribe_rx) = oneshot::channel();

    tokio::task::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = move |request: &Request, response: Response| {
            let auth = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let _ = auth_tx.send(auth);
            Ok(response)
        };
        let mut socket = accept_hdr_async(stream, callback).await.unwrap();

        if let Some(Ok(Message::Text(frame))) = socket.next().await {
            let _ = subscribe_tx.send(frame.to_string());
        }
        socket
            .send(Message::text(r#"{"type":"subscribed"}"#))
            .await
            .unwrap();

        while let Some(frame) = frame_rx.recv().await {
            socket.send(frame).await.unwrap();
        }
        let _ = socket.close(None).await;
    });

    FakeHub {
        url: Url::parse(&format!("ws://{addr}")).unwrap(),
        frames: frame_tx,
        auth_header: auth_rx,
        subscribe_frame: subscribe_rx,
    }
}

fn cast_frame(fid: u64) -> Message {
    Message::text(format!(
        r#"{{"type":"MERGE_MESSAGE","message":{{"type":1,"fid":{fid}}}}}"#
    ))
}

fn collector_for(
    hub: &FakeHub,
    sink_server: &mockito::ServerGuard,
    max_batch_size: usize,
) -> FeedMonitor {
    let sink_url = Url::parse(&sink_server.url()).unwrap();
    let sink = HttpBatchSink::new(&sink_url).unwrap();
    let config = BatchConfig::default().with_max_batch_size(max_batch_size);
    let batcher = CastBatcher::new(config, Arc::new(sink));
    let client = WsHubClient::new(hub.url.clone(), "test-token".to_string());
    FeedMonitor::new(Arc::new(client), batcher, Arc::new(TestClock))
}

async fn wait_until_matched(mock: &mockito::Mock) {
    for _ in 0..100 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("the sink did not receive the expected batch in time");
}

#[tokio::test]
async fn collects_casts_from_the_hub_and_posts_them_in_batches() {
    let mut sink_server = mockito::Server::new_async().await;
    let batch_mock = sink_server
        .mock("POST", "/api/batch-casts")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "casts": [
                {"fid": 101, "timestamp": RECEIPT_MILLIS},
                {"fid": 102, "timestamp": RECEIPT_MILLIS},
            ]
        })))
        .with_status(200)
        .create_async()
        .await;

    let hub = spawn_fake_hub().await;
    let monitor = collector_for(&hub, &sink_server, 2);
    let _monitor_tid = tokio::task::spawn(async move { monitor.run().await });

    let auth = tokio::time::timeout(Duration::from_secs(5), hub.auth_header)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth, "Bearer test-token");

    let subscribe = tokio::time::timeout(Duration::from_secs(5), hub.subscribe_frame)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&subscribe).unwrap(),
        json!({"type": "subscribe", "eventTypes": ["MERGE_MESSAGE"]})
    );

    hub.frames.send(cast_frame(101)).unwrap();
    hub.frames
        .send(Message::text(
            r#"{"type":"MERGE_MESSAGE","message":{"type":13,"fid":555}}"#,
        ))
        .unwrap();
    hub.frames.send(cast_frame(102)).unwrap();

    wait_until_matched(&batch_mock).await;
    batch_mock.assert_async().await;
}

#[tokio::test]
async fn redelivers_the_requeued_casts_after_a_failed_delivery() {
    let mut sink_server = mockito::Server::new_async().await;
    let rejected_mock = sink_server
        .mock("POST", "/api/batch-casts")
        .match_body(Matcher::Json(json!({
            "casts": [
                {"fid": 201, "timestamp": RECEIPT_MILLIS},
                {"fid": 202, "timestamp": RECEIPT_MILLIS},
            ]
        })))
        .with_status(500)
        .create_async()
        .await;
    let accepted_mock = sink_server
        .mock("POST", "/api/batch-casts")
        .match_body(Matcher::Json(json!({
            "casts": [
                {"fid": 201, "timestamp": RECEIPT_MILLIS},
                {"fid": 202, "timestamp": RECEIPT_MILLIS},
                {"fid": 203, "timestamp": RECEIPT_MILLIS},
            ]
        })))
        .with_status(200)
        .create_async()
        .await;

    let hub = spawn_fake_hub().await;
    let monitor = collector_for(&hub, &sink_server, 2);
    let _monitor_tid = tokio::task::spawn(async move { monitor.run().await });

    hub.frames.send(cast_frame(201)).unwrap();
    hub.frames.send(cast_frame(202)).unwrap();
    wait_until_matched(&rejected_mock).await;

    hub.frames.send(cast_frame(203)).unwrap();
    wait_until_matched(&accepted_mock).await;

    rejected_mock.assert_async().await;
    accepted_mock.assert_async().await;
}
