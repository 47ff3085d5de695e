//! Requests over real HTTP against raw TCP mock backends.

mod common;

use std::time::Duration;

use common::{envelope, form_value, page, record, start_programmable_backend};
use gadget_io::io::{ContentType, GadgetIo, MethodType, RequestParameters};
use gadget_io::IoConfig;

fn io_for(addr: std::net::SocketAddr) -> GadgetIo {
    GadgetIo::builder(IoConfig::new(
        "//%host%/gadgets/makeRequest",
        "//%host%/gadgets/proxy?url=%url%",
    ))
    .page(page(&addr.to_string()))
    .build()
}

#[tokio::test]
async fn test_proxied_get_over_http() {
    let (addr, mut requests) = start_programmable_backend(|_| {
        (200, envelope("http://x.com/feed", &record(200, "[1,2,3]")))
    })
    .await;
    let io = io_for(addr);

    let response = io
        .fetch(
            "http://x.com/feed",
            RequestParameters::new().content_type(ContentType::Json),
        )
        .await
        .unwrap()
        .expect("envelope accepted");
    assert_eq!(response.rc, 200);
    assert_eq!(response.json(), Some(&serde_json::json!([1, 2, 3])));

    let captured = tokio::time::timeout(Duration::from_secs(5), requests.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(
        captured
            .request_line
            .starts_with("GET /gadgets/makeRequest?refresh=3600&url=http%3A%2F%2Fx.com%2Ffeed&"),
        "unexpected request line {}",
        captured.request_line
    );
    assert!(captured.body.is_empty());
}

#[tokio::test]
async fn test_proxied_post_over_http() {
    let (addr, mut requests) = start_programmable_backend(|_| {
        (200, envelope("http://x.com/api", &record(200, "ok")))
    })
    .await;
    let io = io_for(addr);

    let response = io
        .fetch(
            "http://x.com/api",
            RequestParameters::new()
                .method(MethodType::Post)
                .post_data("k=v"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.text_data(), Some("ok"));

    let captured = requests.recv().await.unwrap();
    assert!(captured.request_line.starts_with("POST /gadgets/makeRequest "));
    assert_eq!(
        captured.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(form_value(&captured.body, "url").as_deref(), Some("http://x.com/api"));
    assert_eq!(form_value(&captured.body, "postData").as_deref(), Some("k=v"));
}

#[tokio::test]
async fn test_proxy_error_status_over_http() {
    let (addr, _requests) =
        start_programmable_backend(|_| (502, "upstream down".to_string())).await;
    let io = io_for(addr);

    let response = io
        .fetch("http://x.com", RequestParameters::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.rc, 502);
    assert_eq!(response.errors, vec!["502 upstream down"]);
    assert_eq!(response.text.as_deref(), Some("upstream down"));
}

#[tokio::test]
async fn test_direct_request_over_http() {
    let (addr, mut requests) =
        start_programmable_backend(|req| (200, format!("echo:{}", req.body))).await;
    let io = io_for(addr);

    let response = io
        .fetch_non_proxied(
            "/data",
            RequestParameters::new()
                .method(MethodType::Put)
                .post_data("payload"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.text_data(), Some("echo:payload"));

    let captured = requests.recv().await.unwrap();
    assert!(captured.request_line.starts_with("PUT /data "));
}

#[tokio::test]
async fn test_unreachable_proxy_reports_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let io = io_for(addr);

    let response = io
        .fetch("http://x.com", RequestParameters::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.rc, 0);
    assert_eq!(response.errors.len(), 1);
}
