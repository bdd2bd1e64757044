//! HTTP collaborator used by every network-backed provider.
//!
//! Providers only describe requests; sockets, timeouts and proxies live behind
//! [`HttpTransport`]. The default implementation is [`reqwest_transport::ReqwestTransport`].

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use http::Method;
use serde::Deserialize;

use crate::error::Result;

pub mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10000;

/// Per-request network options forwarded to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeOptions {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    pub proxy: Option<String>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            proxy: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

/// Request descriptor handed to the transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub runtime: RuntimeOptions,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            runtime: RuntimeOptions::default(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn runtime(mut self, runtime: &RuntimeOptions) -> Self {
        self.runtime = runtime.clone();
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes one request and returns the status and raw body. No retries.
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
