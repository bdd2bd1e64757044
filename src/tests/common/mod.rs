// tests/common/mod.rs
pub use axum::{body::Body, Router};
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;

use crate::config::env::EnvSnapshot;
use crate::error::Result;
use crate::helpers::time::EXPIRATION_FORMAT;
use crate::providers::ProviderContext;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RuntimeOptions};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// In-memory transport that records every request and answers from a closure.
#[derive(Clone)]
pub struct FakeTransport {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    responder: Arc<Responder>,
}

impl FakeTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Transport that fails the test if it is ever called.
    pub fn unreachable() -> Self {
        Self::new(|request| panic!("unexpected request to {}", request.url))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_to(&self, needle: &str) -> usize {
        self.requests().iter().filter(|r| r.url.contains(needle)).count()
    }
}

impl fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeTransport").field("calls", &self.call_count()).finish()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }
}

pub fn ok(body: impl Into<String>) -> Result<HttpResponse> {
    Ok(HttpResponse { status: 200, body: body.into().into_bytes() })
}

pub fn status(code: u16, body: impl Into<String>) -> Result<HttpResponse> {
    Ok(HttpResponse { status: code, body: body.into().into_bytes() })
}

pub fn context_with(transport: &FakeTransport, env: EnvSnapshot) -> ProviderContext {
    ProviderContext::new(Arc::new(transport.clone()), RuntimeOptions::default(), env)
}

/// Expiration timestamp `seconds` from now, in wire format.
pub fn expiration_in(seconds: i64) -> String {
    (Utc::now() + Duration::seconds(seconds)).format(EXPIRATION_FORMAT).to_string()
}

pub fn sts_body(access_key_id: &str, expiration: &str) -> String {
    json!({
        "RequestId": "req-1",
        "Credentials": {
            "AccessKeyId": access_key_id,
            "AccessKeySecret": "sts-secret",
            "SecurityToken": "sts-token",
            "Expiration": expiration,
        }
    })
    .to_string()
}

pub fn ecs_body(access_key_id: &str, expiration: &str) -> String {
    json!({
        "Code": "Success",
        "AccessKeyId": access_key_id,
        "AccessKeySecret": "ecs-secret",
        "SecurityToken": "ecs-token",
        "Expiration": expiration,
        "LastUpdated": "2021-10-20T03:27:09Z",
    })
    .to_string()
}
