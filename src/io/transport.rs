//! Transport abstraction.
//!
//! # Responsibilities
//! - Describe one HTTP exchange as plain data
//! - Hide the HTTP client behind a capability provider chosen at startup
//!
//! # Design Decisions
//! - One attempt per logical request; no retry, no timeout
//! - Acquisition fails synchronously when no transport exists, so callers
//!   learn about it at the call site rather than on completion

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::io::types::{IoError, IoResult, MethodType};

/// A request as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: MethodType,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub text: String,
}

/// Performs a single asynchronous HTTP exchange.
pub trait Transport: Send + Sync {
    /// Resolves once the response is complete, or with
    /// [`IoError::Transport`] if the exchange raised.
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, IoResult<TransportResponse>>;
}

/// Hands out the transport for the current environment.
pub trait TransportProvider: Send + Sync {
    fn acquire(&self) -> IoResult<Arc<dyn Transport>>;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> IoResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| IoError::TransportUnavailable(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: MethodType) -> reqwest::Method {
    match method {
        MethodType::Get => reqwest::Method::GET,
        MethodType::Post => reqwest::Method::POST,
        MethodType::Put => reqwest::Method::PUT,
        MethodType::Delete => reqwest::Method::DELETE,
        MethodType::Head => reqwest::Method::HEAD,
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, IoResult<TransportResponse>> {
        let client = self.client.clone();
        async move {
            let mut builder = client.request(to_reqwest_method(request.method), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| IoError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .map_err(|e| IoError::Transport(e.to_string()))?;

            Ok(TransportResponse { status, text })
        }
        .boxed()
    }
}

/// Default provider: a `reqwest` transport, built once at startup.
#[derive(Debug)]
pub struct ReqwestProvider {
    transport: Result<Arc<ReqwestTransport>, String>,
}

impl ReqwestProvider {
    /// Build the client now; a failure is reported on every `acquire`.
    pub fn detect() -> Self {
        let transport = ReqwestTransport::new().map(Arc::new).map_err(|e| {
            tracing::warn!(error = %e, "HTTP client could not be built");
            e.to_string()
        });
        Self { transport }
    }
}

impl TransportProvider for ReqwestProvider {
    fn acquire(&self) -> IoResult<Arc<dyn Transport>> {
        match &self.transport {
            Ok(transport) => Ok(transport.clone() as Arc<dyn Transport>),
            Err(reason) => Err(IoError::TransportUnavailable(reason.clone())),
        }
    }
}

/// Provider returning an injected transport.
pub struct StaticProvider {
    transport: Arc<dyn Transport>,
}

impl StaticProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl TransportProvider for StaticProvider {
    fn acquire(&self) -> IoResult<Arc<dyn Transport>> {
        Ok(self.transport.clone())
    }
}

/// Provider for environments with no HTTP capability at all.
#[derive(Debug, Default)]
pub struct NoTransport;

impl TransportProvider for NoTransport {
    fn acquire(&self) -> IoResult<Arc<dyn Transport>> {
        Err(IoError::TransportUnavailable("no xhr available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(MethodType::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(MethodType::Head), reqwest::Method::HEAD);
    }

    #[test]
    fn test_providers() {
        assert!(matches!(
            NoTransport.acquire(),
            Err(IoError::TransportUnavailable(_))
        ));
        assert!(ReqwestProvider::detect().acquire().is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let result = transport
            .send(TransportRequest {
                method: MethodType::Get,
                url: format!("http://{addr}/"),
                headers: Vec::new(),
                body: None,
            })
            .await;
        assert!(matches!(result, Err(IoError::Transport(_))));
    }
}
