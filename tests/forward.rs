//! Integration tests for plain HTTP forwarding through the proxy.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use relay::server::{self, ProxyState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BLOB_LEN: usize = 256 * 1024;

async fn start_proxy() -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(ProxyState::new(server::build_http_client()));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        server::serve(listener, router, async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

async fn inspect(headers: HeaderMap) -> impl IntoResponse {
    let xff = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let proxy_auth = headers.contains_key("proxy-authorization");

    (
        StatusCode::CREATED,
        [("x-origin", "yes"), ("keep-alive", "timeout=5")],
        format!("xff={xff};proxy-auth={proxy_auth}"),
    )
}

async fn echo(body: Bytes) -> Bytes {
    body
}

fn blob() -> Vec<u8> {
    (0..BLOB_LEN).map(|i| (i % 251) as u8).collect()
}

async fn start_origin() -> SocketAddr {
    let router = Router::new()
        .route("/inspect", get(inspect))
        .route("/echo", post(echo))
        .route("/blob", get(|| async { blob() }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn proxied_client(proxy: SocketAddr) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{proxy}")).unwrap())
        .build()
        .unwrap()
}

#[tokio::test]
async fn relays_origin_status_and_headers() {
    let (proxy, shutdown) = start_proxy().await;
    let origin = start_origin().await;

    let resp = proxied_client(proxy)
        .get(format!("http://{origin}/inspect"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    assert_eq!(resp.headers().get("x-origin").unwrap(), "yes");
    assert!(resp.headers().get("keep-alive").is_none());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn extends_forwarded_for_and_drops_proxy_credentials() {
    let (proxy, shutdown) = start_proxy().await;
    let origin = start_origin().await;

    let body = proxied_client(proxy)
        .get(format!("http://{origin}/inspect"))
        .header("x-forwarded-for", "10.0.0.1")
        .header("proxy-authorization", "Basic Zm9vOmJhcg==")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "xff=10.0.0.1, 127.0.0.1;proxy-auth=false");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn sets_forwarded_for_on_first_hop() {
    let (proxy, shutdown) = start_proxy().await;
    let origin = start_origin().await;

    let body = proxied_client(proxy)
        .get(format!("http://{origin}/inspect"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(body, "xff=127.0.0.1;proxy-auth=false");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn forwards_request_body() {
    let (proxy, shutdown) = start_proxy().await;
    let origin = start_origin().await;

    let resp = proxied_client(proxy)
        .post(format!("http://{origin}/echo"))
        .body("hello through the proxy")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "hello through the proxy");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn streams_large_body_unchanged() {
    let (proxy, shutdown) = start_proxy().await;
    let origin = start_origin().await;

    let body = proxied_client(proxy)
        .get(format!("http://{origin}/blob"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();

    assert_eq!(body.len(), BLOB_LEN);
    assert_eq!(body.as_ref(), blob().as_slice());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_origin_returns_500() {
    let (proxy, shutdown) = start_proxy().await;

    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = closed.local_addr().unwrap();
    drop(closed);

    let resp = proxied_client(proxy)
        .get(format!("http://{dead}/anything"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    assert!(resp.headers().get("x-origin").is_none());
    assert_eq!(
        resp.text().await.unwrap(),
        relay::proxy::forward::TRANSPORT_ERROR_BODY
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn origin_form_request_returns_500() {
    let (proxy, shutdown) = start_proxy().await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let resp = client.get(format!("http://{proxy}/")).send().await.unwrap();

    assert_eq!(resp.status(), 500);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn short_origin_body_truncates_without_second_status() {
    let (proxy, shutdown) = start_proxy().await;

    // Promises 100 bytes, sends 10, then hangs up.
    let origin = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin_addr = origin.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut conn, _) = origin.accept().await.unwrap();
        let mut request = Vec::new();
        let mut byte = [0u8; 1];
        while !request.ends_with(b"\r\n\r\n") {
            if conn.read(&mut byte).await.unwrap() == 0 {
                return;
            }
            request.push(byte[0]);
        }
        conn.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
            .await
            .unwrap();
    });

    let mut client = tokio::net::TcpStream::connect(proxy).await.unwrap();
    let request = format!(
        "GET http://{origin_addr}/short HTTP/1.1\r\nHost: {origin_addr}\r\n\r\n"
    );
    client.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client.read_to_end(&mut response),
    )
    .await
    .expect("proxy kept the truncated response open")
    .unwrap();
    let response = String::from_utf8(response).unwrap();

    assert!(
        response.starts_with("HTTP/1.1 200 OK\r\n"),
        "unexpected response: {response}"
    );
    assert_eq!(response.matches("HTTP/1.1").count(), 1);
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    assert!(head.to_ascii_lowercase().contains("content-length: 100"));
    assert_eq!(body, "0123456789");

    let _ = shutdown.send(());
}
