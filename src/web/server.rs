//! Web服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, AppState};
use crate::config::WebConfig;
use crate::error::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{info, Level};

/// 创建路由
///
/// `/healthy-endpoint` 与 `/status` 返回相同内容
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthy-endpoint", get(handlers::healthy_endpoint))
        .route("/status", get(handlers::healthy_endpoint))
        .route("/api/v1/targets", get(handlers::api_targets))
        .route("/api/v1/health", get(handlers::api_health))
        // 全部目标不可用时的 503 是正常应答，不按服务器错误记录
        .layer(
            TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Web服务器
pub struct WebServer {
    /// 监听地址
    address: String,
    /// 共享状态
    state: AppState,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(config: &WebConfig, state: AppState) -> Self {
        Self {
            address: format!("{}:{}", config.bind_address, config.port),
            state,
        }
    }

    /// 绑定监听地址
    ///
    /// # 返回
    /// * `Result<TcpListener>` - 已绑定的监听器
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.address).await?;
        Ok(listener)
    }

    /// 在已绑定的监听器上提供服务，直到收到关闭信号
    ///
    /// # 参数
    /// * `listener` - 已绑定的监听器
    /// * `shutdown_rx` - 关闭信号接收器
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        let app = create_router(self.state);

        info!("Web服务器已启动: http://{}", local_addr);
        info!("首选目标查询: http://{}/healthy-endpoint", local_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeFailure;
    use crate::health::record::ProbeOutcome;
    use crate::health::store::HealthStateStore;
    use crate::health::target::{TargetId, TargetRegistry};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_store() -> Arc<HealthStateStore> {
        Arc::new(HealthStateStore::new(Arc::new(
            TargetRegistry::new(["http://a.example", "http://b.example"]).unwrap(),
        )))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_is_alias_of_healthy_endpoint() {
        let store = create_store();
        store.update(
            TargetId(1),
            &ProbeOutcome::healthy(200, Duration::ZERO),
            Utc::now(),
        );
        let app = create_router(AppState::new(store));

        let (status_a, body_a) = get_json(app.clone(), "/healthy-endpoint").await;
        let (status_b, body_b) = get_json(app, "/status").await;

        assert_eq!(status_a, StatusCode::OK);
        assert_eq!(status_a, status_b);
        assert_eq!(body_a, body_b);
        assert_eq!(body_a["healthy_url"], "http://b.example");
    }

    #[tokio::test]
    async fn test_router_all_down() {
        let store = create_store();
        for index in 0..2 {
            store.update(
                TargetId(index),
                &ProbeOutcome::unhealthy(
                    ProbeFailure::ConnectionFailure("Connection refused".to_string()),
                    Duration::ZERO,
                ),
                Utc::now(),
            );
        }
        let app = create_router(AppState::new(store));

        let (status, body) = get_json(app, "/status").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "all_endpoints_down");
    }

    /// 写入共享缓冲区的日志输出
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_all_down_answer_is_not_logged_as_error() {
        use tracing::instrument::WithSubscriber;

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let app = create_router(AppState::new(create_store()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthy-endpoint")
                    .body(Body::empty())
                    .unwrap(),
            )
            .with_subscriber(subscriber)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.is_empty(), "unexpected log output: {output}");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(AppState::new(create_store()));
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_server_graceful_shutdown() {
        let config = WebConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 1,
        };
        let server = WebServer::new(&config, AppState::new(create_store()));
        // 使用随机端口代替配置端口
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(server.serve(listener, shutdown_rx));

        let response = reqwest::get(format!("http://{addr}/api/v1/health"))
            .await
            .unwrap();
        assert!(response.status().is_success());

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
