//! Pipeline tests over a scripted in-memory transport.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier::interceptor::{InterceptContext, Interceptor};
use courier::{
    CancellationToken, Client, ClientOptions, Error, HeaderMap, HeaderValue, RawResponse, Request,
    Response, ResponseStatus, Result, Transport, WireRequest, async_trait, header,
};
use serde::Deserialize;

/// Replies with a fixed response, optionally after a delay.
#[derive(Debug, Clone)]
struct Scripted {
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<WireRequest>>>,
}

impl Scripted {
    fn json(status: u16, body: &'static str) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            body,
            delay: None,
            calls: Arc::default(),
            sent: Arc::default(),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_sent(&self) -> WireRequest {
        self.sent
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a request was sent")
    }
}

impl Transport for Scripted {
    fn send(
        &self,
        request: WireRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<RawResponse>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().expect("lock").push(request);

        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        let response = RawResponse::new(self.status, headers, self.body);
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::select! {
                    () = cancel.cancelled() => return Err(Error::Aborted),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            Ok(response)
        }
    }
}

/// Records every hook call as `name:hook`.
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, hook: &str) {
        self.log
            .lock()
            .expect("lock")
            .push(format!("{}:{hook}", self.name));
    }
}

#[async_trait]
impl Interceptor for Recorder {
    async fn before_serialize(&self, _ctx: &InterceptContext, _request: &mut Request) -> Result<()> {
        self.record("before_serialize");
        Ok(())
    }

    async fn before_send(&self, _ctx: &InterceptContext, _request: &mut WireRequest) -> Result<()> {
        self.record("before_send");
        Ok(())
    }

    async fn after_send(&self, _ctx: &InterceptContext, _response: &mut RawResponse) -> Result<()> {
        self.record("after_send");
        Ok(())
    }

    async fn before_deserialize(&self, _ctx: &InterceptContext, _response: &mut Response) -> Result<()> {
        self.record("before_deserialize");
        Ok(())
    }
}

/// Fails `before_send`.
struct Reject;

#[async_trait]
impl Interceptor for Reject {
    async fn before_send(&self, _ctx: &InterceptContext, _request: &mut WireRequest) -> Result<()> {
        Err(Error::interceptor("rejected"))
    }
}

/// Fails `after_send`.
struct RejectResponse;

#[async_trait]
impl Interceptor for RejectResponse {
    async fn after_send(&self, _ctx: &InterceptContext, _response: &mut RawResponse) -> Result<()> {
        Err(Error::interceptor("bad response"))
    }
}

/// Fails `before_deserialize`.
struct RejectEnvelope;

#[async_trait]
impl Interceptor for RejectEnvelope {
    async fn before_deserialize(&self, _ctx: &InterceptContext, _response: &mut Response) -> Result<()> {
        Err(Error::interceptor("bad envelope"))
    }
}

/// Adds a header from `before_serialize`.
struct Stamp;

#[async_trait]
impl Interceptor for Stamp {
    async fn before_serialize(&self, _ctx: &InterceptContext, request: &mut Request) -> Result<()> {
        request.push_parameter(courier::Parameter::header("X-Stamp", "1"));
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
struct Item {
    id: u64,
}

fn options() -> courier::ClientOptionsBuilder {
    ClientOptions::builder("http://example.com")
}

#[tokio::test]
async fn test_interceptors_run_in_order_for_every_hook() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let options = options()
        .interceptor(Recorder {
            name: "a",
            log: Arc::clone(&log),
        })
        .interceptor(Recorder {
            name: "b",
            log: Arc::clone(&log),
        })
        .build()
        .expect("options");
    let client = Client::with_transport(options, Scripted::json(200, r#"{"id":1}"#));

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert!(response.is_successful());
    assert_eq!(
        *log.lock().expect("lock"),
        vec![
            "a:before_serialize",
            "b:before_serialize",
            "a:before_send",
            "b:before_send",
            "a:after_send",
            "b:after_send",
            "a:before_deserialize",
            "b:before_deserialize",
        ]
    );
}

#[tokio::test]
async fn test_interceptor_mutations_reach_the_wire() {
    let transport = Scripted::json(200, "");
    let options = options().interceptor(Stamp).build().expect("options");
    let client = Client::with_transport(options, transport.clone());

    let response = client.execute(Request::get("/")).await;

    assert!(response.is_successful());
    assert_eq!(transport.last_sent().header("x-stamp"), Some("1"));
}

#[tokio::test]
async fn test_interceptor_failure_stops_execution() {
    let transport = Scripted::json(200, "");
    let options = options().interceptor(Reject).build().expect("options");
    let client = Client::with_transport(options, transport.clone());

    let response = client.execute(Request::get("/items")).await;

    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(matches!(response.error(), Some(Error::Interceptor(_))));
    assert_eq!(
        response.url().map(courier::Url::as_str),
        Some("http://example.com/items")
    );
    assert_eq!(transport.calls(), 0);
}

fn assert_failed_without_payload<D>(response: &Response<D>) {
    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(matches!(response.error(), Some(Error::Interceptor(_))));
    assert_eq!(response.status(), 0);
    assert!(!response.is_success_status_code());
    assert!(response.raw_bytes().is_empty());
    assert!(response.data().is_none());
    assert_eq!(
        response.url().map(courier::Url::as_str),
        Some("http://example.com/items/1")
    );
}

#[tokio::test]
async fn test_after_send_failure_discards_response() {
    let transport = Scripted::json(200, r#"{"id":1}"#);
    let options = options().interceptor(RejectResponse).build().expect("options");
    let client = Client::with_transport(options, transport.clone());

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert_failed_without_payload(&response);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_before_deserialize_failure_discards_response() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let options = options()
        .interceptor(RejectEnvelope)
        .interceptor(Recorder {
            name: "late",
            log: Arc::clone(&log),
        })
        .build()
        .expect("options");
    let client = Client::with_transport(options, Scripted::json(200, r#"{"id":1}"#));

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert_failed_without_payload(&response);
    assert!(!log
        .lock()
        .expect("lock")
        .contains(&"late:before_deserialize".to_string()));
}

#[tokio::test]
async fn test_cancelled_before_execution_never_sends() {
    let transport = Scripted::json(200, "");
    let client = Client::with_transport(options().build().expect("options"), transport.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let response = client
        .execute_with_cancel(Request::get("/"), cancel)
        .await;

    assert_eq!(response.response_status(), ResponseStatus::Aborted);
    assert!(response.error().is_some_and(Error::is_aborted));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_awaiting_response() {
    let transport = Scripted::json(200, "").delayed(Duration::from_secs(30));
    let client = Client::with_transport(options().build().expect("options"), transport.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let response = client
        .execute_with_cancel(Request::get("/slow"), cancel)
        .await;

    assert_eq!(response.response_status(), ResponseStatus::Aborted);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout() {
    let transport = Scripted::json(200, "").delayed(Duration::from_secs(30));
    let client = Client::with_transport(options().build().expect("options"), transport);

    let response = client
        .execute(Request::get("/slow").timeout(Duration::from_secs(1)))
        .await;

    assert_eq!(response.response_status(), ResponseStatus::TimedOut);
    assert!(response.error().is_some_and(Error::is_timeout));
}

#[tokio::test(start_paused = true)]
async fn test_client_timeout_applies_without_request_timeout() {
    let transport = Scripted::json(200, "").delayed(Duration::from_secs(30));
    let options = options()
        .timeout(Duration::from_secs(2))
        .build()
        .expect("options");
    let client = Client::with_transport(options, transport);

    let response = client.execute(Request::get("/slow")).await;

    assert_eq!(response.response_status(), ResponseStatus::TimedOut);
}

#[tokio::test]
async fn test_deserialization_error_keeps_status() {
    let client = Client::with_transport(
        options().build().expect("options"),
        Scripted::json(200, r#"{"id":"not a number"}"#),
    );

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(response.is_success_status_code());
    assert!(!response.is_successful());
    assert!(response.data().is_none());
    assert!(matches!(response.error(), Some(Error::Deserialization { .. })));
    assert_eq!(response.content(), r#"{"id":"not a number"}"#);
}

#[tokio::test]
async fn test_empty_body_has_no_data() {
    let client = Client::with_transport(options().build().expect("options"), Scripted::json(200, ""));

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert!(response.is_successful());
    assert!(response.data().is_none());
}

#[tokio::test]
async fn test_non_success_status_is_not_deserialized() {
    let client = Client::with_transport(
        options().build().expect("options"),
        Scripted::json(500, r#"{"message":"boom"}"#),
    );

    let response = client.execute_as::<Item>(Request::get("/items/1")).await;

    assert_eq!(response.response_status(), ResponseStatus::Completed);
    assert_eq!(response.status(), 500);
    assert!(response.data().is_none());
    assert!(response.error().is_none());
}

#[tokio::test]
async fn test_missing_content_type_uses_default_serializer() {
    let mut transport = Scripted::json(200, r#"{"id":9}"#);
    transport.content_type = None;
    let client = Client::with_transport(options().build().expect("options"), transport);

    let response = client.execute_as::<Item>(Request::get("/items/9")).await;

    assert_eq!(response.data(), Some(&Item { id: 9 }));
}

#[tokio::test]
async fn test_unknown_content_type_falls_back_to_default_serializer() {
    let mut transport = Scripted::json(200, r#"{"id":9}"#);
    transport.content_type = Some("application/octet-stream");
    let client = Client::with_transport(options().build().expect("options"), transport);

    let response = client.execute_as::<Item>(Request::get("/items/9")).await;

    assert_eq!(response.data(), Some(&Item { id: 9 }));
}

#[tokio::test]
async fn test_no_default_serializer_is_an_error() {
    let mut transport = Scripted::json(200, "id: 9");
    transport.content_type = Some("application/yaml");
    let options = options()
        .registry(courier::SerializerRegistry::empty())
        .build()
        .expect("options");
    let client = Client::with_transport(options, transport);

    let response = client.execute_as::<Item>(Request::get("/items/9")).await;

    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(matches!(
        response.error(),
        Some(Error::UnsupportedContentType(_))
    ));
}

#[tokio::test]
async fn test_concurrent_executions_share_one_client() {
    let transport = Scripted::json(200, r#"{"id":1}"#);
    let client = Client::with_transport(options().build().expect("options"), transport.clone());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .execute_as::<Item>(Request::get("/items/{id}").add_url_segment("id", i))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.expect("join");
        assert!(response.is_successful());
    }
    assert_eq!(transport.calls(), 8);
}
