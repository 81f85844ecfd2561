//! # 看板服务器
//!
//! Axum HTTP 服务器：JSON API、PDF 报表下载与静态看板页面

use std::future::Future;
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::services::EggService;
use crate::config::ServerConfig;
use crate::error::{DashboardError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    service: Arc<EggService>,
}

impl AppState {
    #[must_use]
    pub const fn new(service: Arc<EggService>) -> Self {
        Self { service }
    }

    #[must_use]
    pub const fn service_arc(&self) -> &Arc<EggService> {
        &self.service
    }
}

impl Deref for AppState {
    type Target = EggService;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}

/// 看板服务器
pub struct DashboardServer {
    /// 配置
    config: ServerConfig,
    /// 路由器
    router: Router,
}

impl DashboardServer {
    /// 创建新的服务器
    #[must_use]
    pub fn new(config: ServerConfig, service: Arc<EggService>) -> Self {
        let router = create_router(AppState::new(service), &config);
        Self { config, router }
    }

    /// 已装配中间件的路由器
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 监听地址
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let bind = &self.config.bind;
        let ip = bind.parse::<std::net::IpAddr>().map_err(|e| {
            DashboardError::config_with_source(format!("无效的监听地址 '{bind}'"), e)
        })?;
        Ok(SocketAddr::new(ip, self.config.port))
    }

    /// 启动服务器，`shutdown` 完成后优雅退出
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.bind_address()?;
        let listener = TcpListener::bind(&addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// 在已绑定的监听器上提供服务
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("看板服务已启动: http://{addr}")
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DashboardError::internal_with_source("HTTP 服务异常退出", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stop",
            "看板服务已停止"
        );
        Ok(())
    }
}

/// 创建路由器：API 路由、静态页面、追踪、CORS 与请求体上限
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = super::routes::create_routes(state);

    // 静态看板页面
    match config.static_dir.as_deref().map(Path::new) {
        Some(dir) if dir.is_dir() => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "static_service_enabled",
                &format!("静态页面目录: {}", dir.display())
            );
            app = app.fallback_service(
                ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html"))),
            );
        }
        Some(dir) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "static_dir_not_found",
                &format!("静态页面目录不存在，仅提供 API: {}", dir.display())
            );
            app = app.route("/", get(super::handlers::system::root_handler));
        }
        None => {
            app = app.route("/", get(super::handlers::system::root_handler));
        }
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes));

    if config.enable_cors {
        app.layer(service_builder.layer(cors_layer(&config.cors_origins)))
    } else {
        app.layer(service_builder)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    match origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(origins) => layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("无效的 CORS 来源配置: {e}，改为允许任意来源")
            );
            layer.allow_origin(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CounterStrategyKind, ReportSettings};
    use crate::statistics::build_strategy;
    use crate::store::{MemoryStore, SharedStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn service() -> Arc<EggService> {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let counters = build_strategy(CounterStrategyKind::Recompute, Arc::clone(&store));
        Arc::new(EggService::new(store, counters, ReportSettings::default()))
    }

    #[tokio::test]
    async fn test_root_without_static_dir() {
        let config = ServerConfig {
            static_dir: None,
            ..ServerConfig::default()
        };
        let router = DashboardServer::new(config, service()).router();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_dir_is_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Egg Dashboard</h1>").unwrap();
        let config = ServerConfig {
            static_dir: Some(dir.path().display().to_string()),
            ..ServerConfig::default()
        };

        let router = DashboardServer::new(config, service()).router();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"<h1>Egg Dashboard</h1>");
    }

    #[tokio::test]
    async fn test_body_limit_rejects_large_payloads() {
        let config = ServerConfig {
            static_dir: None,
            body_limit_bytes: 16,
            ..ServerConfig::default()
        };
        let router = DashboardServer::new(config, service()).router();
        let body = serde_json::json!({"size": "small", "color": "white", "quality": "good", "qty": 1});
        let response = router
            .oneshot(
                Request::post("/api/manual-add")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = ServerConfig {
            bind: "not-an-ip".to_string(),
            ..ServerConfig::default()
        };
        let server = DashboardServer::new(config, service());
        assert!(server.bind_address().is_err());
    }
}
