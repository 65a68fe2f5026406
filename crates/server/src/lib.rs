//! HTTP 管理服务器

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use keycast_services::SyncCoordinator;
use std::future::Future;
use std::net::SocketAddr;

/// 请求体上限
const BODY_LIMIT: usize = 64 * 1024;

/// 服务器错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: SyncCoordinator,
}

impl AppState {
    pub fn new(coordinator: SyncCoordinator) -> Self {
        Self { coordinator }
    }
}

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/add", post(handlers::add_credential))
        .route("/edit/:id", get(handlers::edit_form))
        .route("/update/:id", post(handlers::update_credential))
        .route("/delete/:id", post(handlers::delete_credential))
        .route("/client/:id", get(handlers::client_config))
        .route("/api", get(handlers::client_config_by_key))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// 启动服务器，直到 `shutdown` 完成
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("[SERVER] 管理服务已监听: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("[SERVER] 管理服务已停止");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use keycast_core::Settings;
    use keycast_infra::{ProxyController, RestartError, RestartOutcome, UsageSnapshot, UsageSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SAMPLE: &str = r#"services:
  - listeners:
      - type: tcp
        address: "[::]:9000"
    keys:
      - id: 1
        name: alice
        cipher: chacha20-ietf-poly1305
        secret: AAAAbbbbCCCCddddEEEE
"#;

    #[derive(Default)]
    struct CountingController {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProxyController for CountingController {
        async fn restart(&self) -> Result<RestartOutcome, RestartError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RestartOutcome::Restarted)
        }
    }

    struct NoUsage;

    #[async_trait]
    impl UsageSource for NoUsage {
        async fn scrape(&self) -> UsageSnapshot {
            UsageSnapshot::new()
        }
    }

    fn test_app(content: &str) -> (TempDir, Arc<CountingController>, Router) {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, content).unwrap();
        let settings = Settings {
            config_path,
            domain: "vpn.example.org".to_string(),
            ..Settings::default()
        };
        let controller = Arc::new(CountingController::default());
        let coordinator = SyncCoordinator::new(&settings, controller.clone(), Arc::new(NoUsage));
        (dir, controller, build_router(AppState::new(coordinator)))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "admin.local:5000")
            .body(Body::empty())
            .unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, _controller, app) = test_app(SAMPLE);
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("ok"));
    }

    #[tokio::test]
    async fn test_index_uses_host_as_api_base() {
        let (_dir, _controller, app) = test_app(SAMPLE);
        let response = app.oneshot(get_request("/?search=ALI")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(view["api_base_url"], "http://admin.local:5000");
        assert_eq!(view["rows"].as_array().unwrap().len(), 1);
        assert_eq!(view["rows"][0]["secret_masked"], "AAAA************EEEE");
    }

    #[tokio::test]
    async fn test_api_key_lookup() {
        let (_dir, _controller, app) = test_app(SAMPLE);

        let response = app
            .clone()
            .oneshot(get_request("/api?key=AAAAbbbbCCCCddddEEEE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/yaml; charset=utf-8"
        );
        let yaml = body_text(response).await;
        assert!(yaml.contains("$type: tcpudp"));
        assert!(yaml.contains("wss://vpn.example.org/udp-ray"));

        let response = app.clone().oneshot(get_request("/api?key=%20")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(get_request("/api")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get_request("/api?key=nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_config_failure_is_500() {
        let (_dir, _controller, app) = test_app("services: [broken");
        let response = app.oneshot(get_request("/api?key=abc")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_add_then_update_then_delete() {
        let (_dir, controller, app) = test_app(SAMPLE);

        let response = app
            .clone()
            .oneshot(json_post("/add", r#"{"expire_date":"2999-01-01"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let outcome: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(outcome["credential"]["id"], 2);

        let response = app
            .clone()
            .oneshot(json_post(
                "/update/2",
                r#"{"name":"bob","cipher":"aes-256-gcm","secret":"newsecret"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_post("/update/2", r#"{"cipher":"rc4-md5","secret":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_post("/update/2", r#"{"secret":"  "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_post("/delete/2", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(json_post("/delete/99", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(controller.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_edit_form_and_client_page() {
        let (_dir, _controller, app) = test_app(SAMPLE);

        let response = app.clone().oneshot(get_request("/edit/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let form: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(form["name"], "alice");

        let response = app.clone().oneshot(get_request("/edit/9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(get_request("/client/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("AAAAbbbbCCCCddddEEEE"));

        let response = app.oneshot(get_request("/client/9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
