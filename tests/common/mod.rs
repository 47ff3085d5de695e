//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use gadget_io::io::{
    GadgetIo, IoError, IoResult, ResponseRecord, Transport, TransportRequest, TransportResponse,
    UNPARSEABLE_CRUFT,
};
use gadget_io::{IoConfig, PageContext};

/// In-memory transport that records requests and replays canned results.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<TransportRequest>>,
    responses: Mutex<VecDeque<IoResult<TransportResponse>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(TransportResponse {
            status,
            text: text.into(),
        }));
    }

    pub fn fail(&self, description: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(IoError::Transport(description.to_string())));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, IoResult<TransportResponse>> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(IoError::Transport("no canned response".to_string())));
        async move { next }.boxed()
    }
}

/// Wrap `record` in a proxy envelope keyed by `url`.
pub fn envelope(url: &str, record: &ResponseRecord) -> String {
    let mut records = HashMap::new();
    records.insert(url, record);
    format!("{}{}", UNPARSEABLE_CRUFT, serde_json::to_string(&records).unwrap())
}

pub fn record(rc: u16, body: &str) -> ResponseRecord {
    ResponseRecord {
        rc: Some(rc),
        body: Some(body.to_string()),
        ..ResponseRecord::default()
    }
}

pub fn page(host: &str) -> PageContext {
    PageContext {
        host: host.to_string(),
        protocol: "http".to_string(),
        gadget: Some("http://gadgets.example/hello.xml".to_string()),
        container: Some("default".to_string()),
        ..PageContext::default()
    }
}

/// A context wired to `transport` with the usual proxy templates.
pub fn gadget_io(transport: Arc<RecordingTransport>) -> GadgetIo {
    GadgetIo::builder(IoConfig::new(
        "//%host%/gadgets/makeRequest",
        "//%host%/gadgets/proxy?url=%url%&refresh=%refresh%",
    ))
    .page(page("proxy.example"))
    .transport(transport)
    .build()
}

/// Find a `key=value` pair in an encoded parameter string.
pub fn form_value(encoded: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();
    let length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(header_end + length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    Some(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

/// Start a programmable mock backend on an ephemeral port.
///
/// Every request is forwarded to the returned receiver and answered with
/// whatever `f` returns.
pub async fn start_programmable_backend<F>(
    f: F,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>)
where
    F: Fn(&CapturedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(&request);
                        let _ = tx.send(request);
                        let status_text = match status {
                            200 => "200 OK",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}
