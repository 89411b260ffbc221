use super::*;
use crate::app::LifecycleState;
use crate::messaging::MessagingAdapter;
use crate::storage::{SqlxDriver, StorageDriver, StorageHandle, StorageTarget};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

async fn memory_storage() -> StorageHandle {
    let target = StorageTarget::parse("sqlite::memory:").unwrap();
    let pool = SqlxDriver::new(Duration::from_secs(5))
        .authenticate(&target)
        .await
        .unwrap();
    StorageHandle::new(target, pool)
}

async fn test_state() -> (ServerState, watch::Sender<LifecycleState>) {
    let (lifecycle, receiver) = watch::channel(LifecycleState::Running);
    let state = ServerState::new(
        memory_storage().await,
        MessagingAdapter::disabled(),
        receiver,
        "0.1.0",
    );
    (state, lifecycle)
}

async fn get(state: ServerState, path: &str) -> (StatusCode, Vec<u8>) {
    let response = StatusServer::router(state)
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let (state, _lifecycle) = test_state().await;

    let (status, body) = get(state, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, LIVENESS_MESSAGE.as_bytes());
}

#[tokio::test]
async fn test_health_endpoint_fields() {
    let (state, _lifecycle) = test_state().await;

    let (status, body) = get(state, "/health").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["databaseConnected"], true);
    assert_eq!(json["whatsappConnected"], false);
    assert_eq!(json["version"], "0.1.0");
    assert_eq!(json["lifecycle"], "running");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_is_computed_per_request() {
    let (state, lifecycle) = test_state().await;

    let (_, body) = get(state.clone(), "/health").await;
    let before: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(before["databaseConnected"], true);

    state.storage.close(Duration::from_secs(1)).await;
    lifecycle.send_replace(LifecycleState::ShuttingDown);

    let (_, body) = get(state, "/health").await;
    let after: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(after["databaseConnected"], false);
    assert_eq!(after["lifecycle"], "shutting_down");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (state, _lifecycle) = test_state().await;

    let (status, _) = get(state, "/metrics").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bind_serve_and_drain() {
    let (state, _lifecycle) = test_state().await;

    let server = StatusServer::bind("127.0.0.1:0", state).await.unwrap();
    let addr = server.local_addr();
    assert_ne!(addr.port(), 0);
    assert!(tokio::net::TcpStream::connect(addr).await.is_ok());

    server.stop_accepting();
    assert!(server.drain(Duration::from_secs(2)).await);
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let (state, _lifecycle) = test_state().await;
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = occupied.local_addr().unwrap().to_string();

    match StatusServer::bind(&address, state).await {
        Err(crate::error::StatusError::BindFailed { address: reported, .. }) => {
            assert_eq!(reported, address)
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("bind on an occupied port must fail"),
    }
}
