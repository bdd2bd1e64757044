use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::error::{CredentialError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RuntimeOptions};

/// [`HttpTransport`] backed by `reqwest`.
///
/// A client is built per runtime configuration; the plain default client is reused.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    default_client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let default_client = build_client(&RuntimeOptions::default())?;
        Ok(Self { default_client })
    }

    fn client_for(&self, runtime: &RuntimeOptions) -> Result<Client> {
        if *runtime == RuntimeOptions::default() {
            return Ok(self.default_client.clone());
        }
        build_client(runtime)
    }
}

fn build_client(runtime: &RuntimeOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_millis(runtime.connect_timeout_ms))
        .timeout(Duration::from_millis(runtime.read_timeout_ms));

    if let Some(proxy) = runtime.proxy.as_deref().filter(|p| !p.is_empty()) {
        let proxy = Proxy::all(proxy)
            .map_err(|err| CredentialError::transport(format!("invalid proxy '{proxy}': {err}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|err| CredentialError::transport(format!("failed to build http client: {err}")))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let client = self.client_for(&request.runtime)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| CredentialError::transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| CredentialError::transport(err.to_string()))?;

        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use httpmock::MockServer;

    #[tokio::test]
    async fn forwards_method_headers_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PUT)
                    .path("/latest/api/token")
                    .header("X-aliyun-ecs-metadata-token-ttl-seconds", "21600")
                    .body("payload");
                then.status(200).body("token-value");
            })
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(
                HttpRequest::new(Method::PUT, server.url("/latest/api/token"))
                    .header("X-aliyun-ecs-metadata-token-ttl-seconds", "21600")
                    .body("payload"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert_eq!(response.text(), "token-value");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        let runtime = RuntimeOptions { connect_timeout_ms: 500, read_timeout_ms: 500, proxy: None };
        let err = transport
            .send(HttpRequest::new(Method::GET, "http://127.0.0.1:1/").runtime(&runtime))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Transport(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/missing");
                then.status(404).body("not found");
            })
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(HttpRequest::new(Method::GET, server.url("/missing")))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }
}
