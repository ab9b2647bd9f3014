//! Internal HTTP endpoints against a live pool

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use container_pool::config::Config;
use container_pool::observability::PoolMetrics;
use container_pool::server::{serve, InternalState, PoolHandle};
use container_pool::Pool;

use crate::helpers::{settings, wait_until, FastFactory, WAIT};

struct Running {
    addr: std::net::SocketAddr,
    pool: Arc<Pool<FastFactory>>,
}

async fn start(size: usize) -> Running {
    let metrics = Arc::new(PoolMetrics::new().unwrap());
    let pool = Arc::new(
        Pool::start_with_metrics(
            FastFactory::new(Duration::ZERO),
            settings(size),
            Arc::clone(&metrics),
        )
        .unwrap(),
    );

    let config = Config::from_lookup(&|key: &str| match key {
        "CONTAINER_CREATE_CMD" => Some("true".to_string()),
        "POOL_SIZE" => Some(size.to_string()),
        _ => None,
    })
    .unwrap();

    let handle: Arc<dyn PoolHandle> = Arc::clone(&pool) as Arc<dyn PoolHandle>;
    let state = Arc::new(InternalState::new(handle, config.info()).with_metrics(metrics));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state));

    Running { addr, pool }
}

/// Send one HTTP/1.1 request and return (status code, body).
async fn request(addr: std::net::SocketAddr, method: &str, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        method, path
    );
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

async fn wait_for_size(pool: &Arc<Pool<FastFactory>>, size: usize) {
    let pool = Arc::clone(pool);
    let filled = tokio::task::spawn_blocking(move || wait_until(WAIT, || pool.size() == size))
        .await
        .unwrap();
    assert!(filled);
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = start(2).await;
    wait_for_size(&server.pool, 2).await;

    let (status, body) = request(server.addr, "GET", "/health").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["pool_capacity"], 2);

    let (status, _) = request(server.addr, "GET", "/health/live").await;
    assert_eq!(status, 200);

    let (status, _) = request(server.addr, "GET", "/health/ready").await;
    assert_eq!(status, 200);

    let (status, _) = request(server.addr, "GET", "/health/startup").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_not_ready_after_cleanup() {
    let server = start(2).await;
    wait_for_size(&server.pool, 2).await;

    let pool = Arc::clone(&server.pool);
    tokio::task::spawn_blocking(move || pool.cleanup(Duration::ZERO))
        .await
        .unwrap()
        .unwrap();

    let (status, body) = request(server.addr, "GET", "/health/ready").await;
    assert_eq!(status, 503);
    assert!(body.contains("not_ready"));

    let (status, _) = request(server.addr, "GET", "/health/live").await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_status_and_metrics() {
    let server = start(3).await;
    wait_for_size(&server.pool, 3).await;

    let (status, body) = request(server.addr, "GET", "/status").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["size"], 3);
    assert_eq!(json["running"], true);

    let (status, body) = request(server.addr, "GET", "/metrics").await;
    assert_eq!(status, 200);
    assert!(body.contains("container_pool_containers_created_total 3"));

    let (_, body) = request(server.addr, "GET", "/config").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["POOL_SIZE"], "3");
}

#[tokio::test]
async fn test_lease_takes_container() {
    let server = start(2).await;
    wait_for_size(&server.pool, 2).await;

    let (status, body) = request(server.addr, "POST", "/lease").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["name"].as_str().unwrap().starts_with("test-"));

    // Replenished after the lease.
    wait_for_size(&server.pool, 2).await;

    let (status, _) = request(server.addr, "GET", "/unknown").await;
    assert_eq!(status, 404);
}
