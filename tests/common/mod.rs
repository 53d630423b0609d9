//! Shared fakes and helpers for integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ris_foods_api::config::AppConfig;
use ris_foods_api::services::{
    EmailMessage, GenerationRequest, Notifier, Outbox, RowStore, TextGenerator, UpstreamError,
};
use ris_foods_api::{HttpServer, Services};

pub const ALLOWED_ORIGIN: &str = "https://ris-foods.vercel.app";

/// Row store remembering every insert.
#[derive(Default)]
pub struct RecordingStore {
    pub rows: Mutex<Vec<(String, Value)>>,
}

impl RecordingStore {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(String, Value)> {
        self.rows.lock().unwrap().last().cloned()
    }
}

impl RowStore for RecordingStore {
    fn insert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            self.rows.lock().unwrap().push((table.to_string(), row));
            Ok(())
        })
    }
}

/// Row store that always fails, optionally after a delay.
pub struct FailingStore {
    pub delay: Duration,
}

impl RowStore for FailingStore {
    fn insert<'a>(&'a self, _table: &'a str, _row: Value) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Err(UpstreamError::Status {
                status: 500,
                body: "relation does not exist".to_string(),
            })
        })
    }
}

/// Notifier remembering every message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl Notifier for RecordingNotifier {
    fn send<'a>(&'a self, message: &'a EmailMessage) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        })
    }
}

/// Generator answering from a closure and remembering requests.
pub struct FakeGenerator {
    pub reply: Box<dyn Fn() -> Result<String, UpstreamError> + Send + Sync>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn replying(text: &'static str) -> Self {
        Self::with(move || Ok(text.to_string()))
    }

    pub fn with<F>(reply: F) -> Self
    where
        F: Fn() -> Result<String, UpstreamError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl TextGenerator for FakeGenerator {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Result<String, UpstreamError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            (self.reply)()
        })
    }
}

pub fn services(store: Arc<dyn RowStore>, generator: Arc<dyn TextGenerator>) -> Services {
    Services {
        store,
        outbox: Outbox::disabled(),
        generator,
        outbox_worker: None,
    }
}

/// Router over the given collaborators.
pub fn router(config: AppConfig, services: Services) -> Router {
    HttpServer::with_services(config, services)
        .expect("valid test configuration")
        .router()
}

/// Router with a recording store and a fixed chat reply.
pub fn default_router(config: AppConfig) -> (Router, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::default());
    let router = router(
        config,
        services(store.clone(), Arc::new(FakeGenerator::replying("Naadan puttu!"))),
    );
    (router, store)
}

/// JSON POST from an allowed origin and a fixed client address.
pub fn post_json(path: &str, body: &Value) -> Request<Body> {
    post_raw(path, body.to_string())
}

pub fn post_raw(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "1.2.3.4")
        .body(body.into())
        .unwrap()
}

pub fn request(method: Method, path: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn valid_general_enquiry() -> Value {
    serde_json::json!({
        "full_name": "Meera Nair",
        "email": "meera@example.com",
        "mobile": "98470 12345",
        "message": "Do you deliver to Thrissur?",
    })
}

pub fn valid_distributor_enquiry() -> Value {
    serde_json::json!({
        "name": "Ravi",
        "firm_name": "Ravi Traders",
        "address": "MG Road, Kochi",
        "mobile": "9847012345",
        "email": "ravi@traders.in",
        "type": "Proprietorship",
    })
}

pub fn valid_feedback() -> Value {
    serde_json::json!({
        "name": "Asha",
        "email": "asha@example.com",
        "mobile": "9847012345",
        "feedback": "The puttu podi is excellent.",
        "rating": 5,
    })
}

/// A raw HTTP request captured by [`start_programmable_backend`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Start a mock upstream on an ephemeral port. `f` decides the response and
/// every request is forwarded to the returned channel.
pub async fn start_programmable_backend<F, Fut>(
    f: F,
) -> (SocketAddr, tokio::sync::mpsc::UnboundedReceiver<CapturedRequest>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(captured) = read_request(&mut socket).await else {
                    return;
                };
                let _ = tx.send(captured);

                let (status, body) = f().await;
                let response = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let head = text[..end].to_string();
            let length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                let body = String::from_utf8_lossy(&buf[end + 4..end + 4 + length]).to_string();
                return Some(CapturedRequest { head, body });
            }
        }
    }
}
