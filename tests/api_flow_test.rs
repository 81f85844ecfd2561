//! # 看板 API 流程测试
//!
//! 通过路由器直接驱动完整请求流程：
//! 1. 写入（手动录入 / 设备上报）
//! 2. 看板计数
//! 3. 报表与 PDF 下载
//! 4. 重置

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

use egg_dashboard::config::{CounterStrategyKind, ReportSettings, ServerConfig};
use egg_dashboard::management::{DashboardServer, EggService};
use egg_dashboard::statistics::build_strategy;
use egg_dashboard::store::{EggStore, MemoryStore, SharedStore};
use egg_dashboard::types::RawEggRecord;

struct TestApp {
    router: Router,
    memory: Arc<MemoryStore>,
}

impl TestApp {
    fn new(kind: CounterStrategyKind) -> Self {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let counters = build_strategy(kind, Arc::clone(&store));
        let service = Arc::new(EggService::new(store, counters, ReportSettings::default()));
        let config = ServerConfig {
            static_dir: None,
            ..ServerConfig::default()
        };
        Self {
            router: DashboardServer::new(config, service).router(),
            memory,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), headers)
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let (status, body, _) = self
            .send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

#[rstest]
#[case(CounterStrategyKind::Recompute)]
#[case(CounterStrategyKind::Incremental)]
#[tokio::test]
async fn test_write_then_dashboard(#[case] kind: CounterStrategyKind) {
    let app = TestApp::new(kind);

    let (status, body) = app
        .post_json(
            "/api/manual-add",
            &json!({"size": "small", "color": "white", "quality": "good", "qty": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 3);

    let (status, record) = app
        .post_json(
            "/api/egg",
            &json!({"size": "xlarge", "color": "brown", "quality": "bad", "confidence": 0.62, "source": "ai-sorter"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["source"], "ai-sorter");
    assert_eq!(record["size"], "xlarge");

    let (status, data) = app.get_json("/api/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        data["counters"],
        json!({"total": 4, "good": 3, "bad": 1, "white": 3, "brown": 1})
    );
    assert_eq!(
        data["sizes"],
        json!({"small": 3, "medium": 0, "large": 0, "xlarge": 1})
    );
    assert_eq!(data["total"], 4);
    assert_eq!(data["strategy"], kind.as_str());
    assert_eq!(data["recent"].as_array().unwrap().len(), 4);

    // 读取是幂等的
    let (_, again) = app.get_json("/api/stats").await;
    assert_eq!(again["counters"], data["counters"]);
}

#[tokio::test]
async fn test_egg_defaults_source_and_confidence() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let (status, record) = app
        .post_json(
            "/api/egg",
            &json!({"size": "medium", "color": "white", "quality": "good"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["source"], "web-dashboard");
    assert_eq!(record["confidence"], 1.0);
}

#[rstest]
#[case(json!({"size": "small", "color": "white", "quality": "good", "qty": 0}))]
#[case(json!({"size": "small", "color": "white", "quality": "good", "qty": 6}))]
#[case(json!({"size": "small", "color": "white", "quality": "good", "qty": "many"}))]
#[case(json!({"size": "jumbo", "color": "white", "quality": "good"}))]
#[case(json!({"size": "small", "color": "green", "quality": "good"}))]
#[case(json!({"size": "small", "color": "white"}))]
#[tokio::test]
async fn test_invalid_manual_add_is_rejected_without_writes(#[case] body: Value) {
    let app = TestApp::new(CounterStrategyKind::Incremental);
    let (status, error) = app.post_json("/api/manual_add", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert!(error["error"].is_string());
    assert!(app.memory.is_empty().await);
    assert!(app.memory.fetch_counters().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let (status, error) = app.post_raw("/api/egg", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_qty_string_and_default() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let (status, body) = app
        .post_json(
            "/api/manual-add",
            &json!({"size": "large", "color": "brown", "quality": "bad", "qty": "2"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 2);

    let (_, body) = app
        .post_json(
            "/api/manual-add",
            &json!({"size": "large", "color": "brown", "quality": "bad"}),
        )
        .await;
    assert_eq!(body["created"], 1);
    assert_eq!(app.memory.len().await, 3);
}

#[rstest]
#[case(CounterStrategyKind::Recompute)]
#[case(CounterStrategyKind::Incremental)]
#[tokio::test]
async fn test_reset_clears_state(#[case] kind: CounterStrategyKind) {
    let app = TestApp::new(kind);
    app.post_json(
        "/api/manual-add",
        &json!({"size": "small", "color": "white", "quality": "good", "qty": 5}),
    )
    .await;

    let (status, body) = app.post_json("/api/reset", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["records_deleted"], 5);

    let (_, data) = app.get_json("/api/data").await;
    assert_eq!(data["total"], 0);
    assert_eq!(
        data["counters"],
        json!({"total": 0, "good": 0, "bad": 0, "white": 0, "brown": 0})
    );
}

#[tokio::test]
async fn test_report_json_and_pdf() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    app.post_json(
        "/api/manual-add",
        &json!({"size": "medium", "color": "brown", "quality": "good", "qty": 2}),
    )
    .await;

    let (status, report) = app.get_json("/api/report/daily").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["period"], "daily");
    assert_eq!(report["totals"]["total"], 2);
    assert_eq!(report["listing"]["shown"], 2);
    assert_eq!(report["listing"]["truncated"], false);
    assert_eq!(report["listing"]["rows"][0]["confidence"], "100.0%");
    assert_eq!(report["sources"]["manual"], 2);

    for uri in ["/report/weekly", "/pdf/weekly"] {
        let (status, body, headers) = app
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"weekly_report.pdf\""
        );
        assert!(body.starts_with(b"%PDF-"));
    }
}

#[tokio::test]
async fn test_unknown_report_period_is_404() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let (status, error) = app.get_json("/api/report/monthly").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "RESOURCE_NOT_FOUND");

    let (status, _, _) = app
        .send(Request::get("/pdf/monthly").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_listing_is_capped() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let now = chrono::Utc::now();
    for i in 0..150 {
        app.memory
            .insert_raw(RawEggRecord {
                size: Some("small".to_string()),
                color: Some("white".to_string()),
                quality: Some("good".to_string()),
                confidence: Some(0.9),
                source: Some("sequential-sorter".to_string()),
                timestamp: Some((now - chrono::Duration::seconds(i)).to_rfc3339()),
            })
            .await;
    }

    let (_, report) = app.get_json("/api/report/weekly").await;
    assert_eq!(report["listing"]["shown"], 100);
    assert_eq!(report["listing"]["total"], 150);
    assert_eq!(report["listing"]["truncated"], true);
    assert_eq!(report["totals"]["total"], 150);
    assert_eq!(report["sources"]["automated"], 150);
}

#[tokio::test]
async fn test_stored_record_defaults() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    app.memory
        .insert_raw(RawEggRecord {
            size: Some("jumbo".to_string()),
            quality: Some("cracked".to_string()),
            ..RawEggRecord::default()
        })
        .await;

    let (_, data) = app.get_json("/api/data").await;
    assert_eq!(data["total"], 1);
    assert_eq!(data["counters"]["bad"], 1);
    assert_eq!(
        data["sizes"],
        json!({"small": 0, "medium": 0, "large": 0, "xlarge": 0})
    );
    // 没有时间戳的记录不出现在最近列表
    assert_eq!(data["recent"], json!([]));
}

#[tokio::test]
async fn test_ping_and_health() {
    let app = TestApp::new(CounterStrategyKind::Recompute);
    let (status, body, _) = app
        .send(Request::get("/ping").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"pong");

    let (status, health) = app.get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["backend"], "memory");
    assert_eq!(health["strategy"], "recompute");
}
