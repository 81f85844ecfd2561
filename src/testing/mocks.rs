//! # 测试 Mock 对象
//!
//! 可注入故障的存储包装，以及模拟 Firebase REST 接口的 HTTP 服务器

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashSet;
use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::FirebaseConfig;
use crate::error::{DashboardError, Result};
use crate::store::{CounterField, CounterValues, EggStore};
use crate::types::{EggRecord, NewEggRecord};

/// 可注入故障的存储
///
/// 整体不可用时所有操作返回 `StoreUnavailable`；也可以只让指定计数字段的清零失败。
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    unavailable: AtomicBool,
    failing_resets: DashSet<CounterField>,
}

impl<S: EggStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            unavailable: AtomicBool::new(false),
            failing_resets: DashSet::new(),
        }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// 切换整体不可用状态
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 让指定字段的清零失败
    pub fn fail_reset_of(&self, field: CounterField) {
        self.failing_resets.insert(field);
    }

    /// 清除所有故障
    pub fn heal(&self) {
        self.set_unavailable(false);
        self.failing_resets.clear();
    }

    fn guard(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DashboardError::store_unavailable("模拟存储故障"));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: EggStore> EggStore for FlakyStore<S> {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn fetch_records(&self) -> Result<Vec<EggRecord>> {
        self.guard()?;
        self.inner.fetch_records().await
    }

    async fn push_record(&self, record: &NewEggRecord) -> Result<String> {
        self.guard()?;
        self.inner.push_record(record).await
    }

    async fn increment_counter(&self, field: CounterField, delta: u64) -> Result<u64> {
        self.guard()?;
        self.inner.increment_counter(field, delta).await
    }

    async fn fetch_counters(&self) -> Result<CounterValues> {
        self.guard()?;
        self.inner.fetch_counters().await
    }

    async fn reset_counter(&self, field: CounterField) -> Result<()> {
        self.guard()?;
        if self.failing_resets.contains(&field) {
            return Err(DashboardError::store_unavailable(format!(
                "模拟清零失败: {field}"
            )));
        }
        self.inner.reset_counter(field).await
    }

    async fn delete_records(&self) -> Result<u64> {
        self.guard()?;
        self.inner.delete_records().await
    }

    async fn ping(&self) -> Result<()> {
        self.guard()?;
        self.inner.ping().await
    }
}

/// 模拟 Firebase Realtime Database 的 HTTP 服务器
pub struct MockFirebaseServer {
    server: MockServer,
}

impl MockFirebaseServer {
    /// 启动 Mock 服务器
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// 获取服务器 URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// 指向本服务器的 Firebase 配置
    pub fn config(&self) -> FirebaseConfig {
        FirebaseConfig {
            database_url: self.uri(),
            timeout_seconds: 2,
            ..FirebaseConfig::default()
        }
    }

    /// 添加 Mock 响应
    pub async fn mock_response(&self, http_method: &str, url_path: &str, status: u16, body: Value) {
        Mock::given(method(http_method.to_uppercase().as_str()))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `GET /records.json` 返回给定的记录集合
    pub async fn mock_records(&self, body: Value) {
        self.mock_response("GET", "/records.json", 200, body).await;
    }

    /// `POST /records.json` 返回推送键
    pub async fn mock_push(&self, name: &str) {
        self.mock_response("POST", "/records.json", 200, serde_json::json!({ "name": name }))
            .await;
    }

    /// `PUT /counters/{field}.json` 返回自增后的值
    pub async fn mock_increment(&self, field: CounterField, value: u64) {
        self.mock_response(
            "PUT",
            &format!("/counters/{}.json", field.path()),
            200,
            serde_json::json!(value),
        )
        .await;
    }

    /// 只有携带指定 `auth` 参数的读取请求才成功
    pub async fn require_auth_for_records(&self, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/records.json"))
            .and(query_param("auth", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/records.json"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "Permission denied" })),
            )
            .mount(&self.server)
            .await;
    }
}
