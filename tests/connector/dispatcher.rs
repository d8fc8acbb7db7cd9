use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde_json::{Value, json};

use koreai_connector::connector::{
    dispatcher::{Dispatcher, HttpTransport},
    error::{ConnectorError, ConnectorErrorKind},
    types::{AnalyticsRequest, ChannelRequest, HeaderPair, RawResponse, TurnRequests},
};

const CHANNEL_URL: &str = "https://bots.example/chatbot/hooks/st-1";
const ANALYTICS_URL: &str =
    "https://bots.example/api/public/bot/st-1/findIntent?fetchConfiguredTasks=false";

/// Answers each URL after a fixed delay with a canned response.
struct ScriptedTransport {
    channel_delay: Duration,
    analytics_delay: Duration,
    analytics_status: u16,
    calls: AtomicUsize,
    seen_urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(channel_delay: Duration, analytics_delay: Duration) -> Self {
        Self {
            channel_delay,
            analytics_delay,
            analytics_status: 200,
            calls: AtomicUsize::new(0),
            seen_urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        _headers: &[HeaderPair],
        _body: &Value,
    ) -> Result<RawResponse, ConnectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_urls
            .lock()
            .expect("lock should not be poisoned")
            .push(url.to_string());

        if url == ANALYTICS_URL {
            tokio::time::sleep(self.analytics_delay).await;
            return Ok(RawResponse::new(
                self.analytics_status,
                Some("application/json"),
                json!({"response": {"result": "failintent"}}).to_string(),
            ));
        }

        tokio::time::sleep(self.channel_delay).await;
        Ok(RawResponse::new(
            200,
            Some("application/json"),
            json!({"text": "Hello"}).to_string(),
        ))
    }
}

fn requests(with_analytics: bool) -> TurnRequests {
    TurnRequests {
        channel: ChannelRequest {
            url: CHANNEL_URL.to_string(),
            headers: vec![],
            body: json!({"message": {"text": "Hi"}}),
        },
        analytics: with_analytics.then(|| AnalyticsRequest {
            url: ANALYTICS_URL.to_string(),
            headers: vec![],
            body: json!({"input": "Hi"}),
        }),
    }
}

#[tokio::test]
async fn given_channel_and_analytics_when_dispatched_then_both_run_concurrently() {
    let transport = Arc::new(ScriptedTransport::new(
        Duration::from_millis(300),
        Duration::from_millis(300),
    ));
    let dispatcher = Dispatcher::new(transport.clone());

    let started = Instant::now();
    let outcome = dispatcher
        .dispatch(&requests(true), Duration::from_secs(5))
        .await
        .expect("dispatch should succeed");

    assert!(
        started.elapsed() < Duration::from_millis(550),
        "calls should overlap, took {:?}",
        started.elapsed()
    );
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.primary.status, 200);
    assert!(outcome.analytics.is_some());
}

#[tokio::test]
async fn given_no_analytics_request_when_dispatched_then_only_channel_is_called() {
    let transport = Arc::new(ScriptedTransport::new(Duration::ZERO, Duration::ZERO));
    let dispatcher = Dispatcher::new(transport.clone());

    let outcome = dispatcher
        .dispatch(&requests(false), Duration::from_secs(1))
        .await
        .expect("dispatch should succeed");

    assert!(outcome.analytics.is_none());
    assert_eq!(
        *transport.seen_urls.lock().expect("lock should not be poisoned"),
        vec![CHANNEL_URL.to_string()]
    );
}

#[tokio::test]
async fn given_slow_analytics_when_deadline_elapses_then_timeout_names_channel_endpoint() {
    let transport = Arc::new(ScriptedTransport::new(
        Duration::ZERO,
        Duration::from_millis(2000),
    ));
    let dispatcher = Dispatcher::new(transport);

    let started = Instant::now();
    let err = dispatcher
        .dispatch(&requests(true), Duration::from_millis(100))
        .await
        .expect_err("dispatch should time out");

    assert!(started.elapsed() < Duration::from_millis(1000));
    assert_eq!(err.kind, ConnectorErrorKind::Timeout);
    assert_eq!(err.endpoint.as_deref(), Some(CHANNEL_URL));
    assert!(err.message.contains("timeout of 100ms exceeded"));
}

#[tokio::test]
async fn given_analytics_http_error_when_dispatched_then_turn_fails() {
    let mut transport = ScriptedTransport::new(Duration::ZERO, Duration::ZERO);
    transport.analytics_status = 500;
    let dispatcher = Dispatcher::new(Arc::new(transport));

    let err = dispatcher
        .dispatch(&requests(true), Duration::from_secs(1))
        .await
        .expect_err("analytics failure should fail the turn");

    assert_eq!(err.kind, ConnectorErrorKind::Dispatch);
    assert_eq!(err.http_status, Some(500));
    assert_eq!(err.endpoint.as_deref(), Some(ANALYTICS_URL));
}
