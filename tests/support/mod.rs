//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use search_throttle::resilience::backoff::BackoffPolicy;
use search_throttle::transport::{RawResponse, SearchTransport, TransportError};
use search_throttle::{SearchClient, SearchClientBuilder, SearchConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub const BASE_DELAY: Duration = Duration::from_millis(500);

/// One scripted backend reaction.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(u16, &'static str),
    Fail(&'static str),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    repeat: Option<Step>,
}

/// In-process backend that replays a script of responses.
///
/// Records when each call happened and how many calls overlapped. With a gate
/// installed, every call parks until the test hands out a gate permit.
pub struct ScriptedTransport {
    script: Mutex<Script>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    queries: Mutex<Vec<serde_json::Value>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(Script {
                steps: steps.into(),
                repeat: None,
            }),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Same reaction forever.
    pub fn always(step: Step) -> Self {
        let t = Self::new(Vec::new());
        t.script.lock().unwrap().repeat = Some(step);
        t
    }

    /// After the scripted steps run out, keep answering with `step`.
    pub fn then_always(self, step: Step) -> Self {
        self.script.lock().unwrap().repeat = Some(step);
        self
    }

    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn queries(&self) -> Vec<serde_json::Value> {
        self.queries.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        script
            .steps
            .pop_front()
            .or_else(|| script.repeat.clone())
            .expect("scripted transport ran out of steps")
    }
}

#[async_trait]
impl SearchTransport for ScriptedTransport {
    async fn post_search(
        &self,
        query: &serde_json::Value,
        _request_id: &str,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        self.queries.lock().unwrap().push(query.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let step = self.next_step();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match step {
            Step::Respond(status, body) => Ok(RawResponse::new(status, body)),
            Step::Fail(msg) => Err(TransportError::Other(msg.to_string())),
        }
    }
}

pub fn test_config() -> SearchConfig {
    SearchConfig::new("http://127.0.0.1:9200", "reviews", "dashboard", "s3cret")
        .expect("valid test config")
        .with_base_delay(BASE_DELAY)
}

/// Client over a scripted transport with a seeded backoff policy.
pub fn scripted_client(
    transport: Arc<ScriptedTransport>,
    max_concurrent: usize,
    max_retries: u32,
) -> SearchClient {
    let config = test_config()
        .with_max_concurrent(max_concurrent)
        .expect("positive capacity")
        .with_max_retries(max_retries);
    SearchClientBuilder::new(config)
        .transport(transport)
        .backoff(BackoffPolicy::with_seed(BASE_DELAY, 1234))
        .build()
        .expect("client builds")
}

/// Let spawned tasks run until they park.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Test fixture that manages a mock search backend.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn config(&self) -> SearchConfig {
        SearchConfig::new(&self.base_url, "reviews", "dashboard", "s3cret")
            .expect("mock server url is valid")
            .with_base_delay(Duration::from_millis(1))
    }

    /// JSON response on `POST /reviews/_search`, expected exactly `hits` times.
    pub async fn mock_search(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", "/reviews/_search")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}
