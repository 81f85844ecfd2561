//! # Firebase Realtime Database 存储
//!
//! 通过 REST 接口访问记录集合与计数字段：
//!
//! | 操作 | 请求 |
//! |------|------|
//! | 读取记录 | `GET {db}/{records}.json` |
//! | 追加记录 | `POST {db}/{records}.json` |
//! | 删除记录 | `DELETE {db}/{records}.json` |
//! | 原子自增 | `PUT {db}/{counters}/{field}.json` 携带 `{".sv": {"increment": n}}` |
//! | 读取计数 | `GET {db}/{counters}.json` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{CounterField, CounterValues, EggStore};
use crate::config::FirebaseConfig;
use crate::error::{DashboardError, Result};
use crate::types::{EggRecord, NewEggRecord, RawEggRecord, counter_from_i64, json_number_as_i64};
use crate::{
    ldebug, lwarn,
    logging::{LogComponent, LogStage},
};

/// `POST` 返回的推送键
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Firebase 存储
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    http_client: Client,
    base_url: String,
    auth_token: Option<String>,
    records_path: String,
    counters_path: String,
}

impl FirebaseStore {
    pub fn new(config: &FirebaseConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DashboardError::config_with_source("创建 HTTP 客户端失败", e))?;

        Ok(Self {
            http_client,
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            records_path: config.records_path.trim_matches('/').to_string(),
            counters_path: config.counters_path.trim_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, self.url(path));
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token.as_str())]),
            None => builder,
        }
    }

    fn counter_path(&self, field: CounterField) -> String {
        format!("{}/{}", self.counters_path, field.path())
    }

    /// 非 2xx 响应一律视为存储不可用
    async fn check(response: Response, operation: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(DashboardError::store_unavailable(format!(
            "Firebase {operation} 失败 ({status}): {error_text}"
        )))
    }

    async fn get_json(&self, path: &str, shallow: bool, operation: &str) -> Result<Value> {
        let mut builder = self.request(Method::GET, path);
        if shallow {
            builder = builder.query(&[("shallow", "true")]);
        }
        let response = Self::check(builder.send().await?, operation).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn read_counter(&self, field: CounterField) -> Result<u64> {
        let value = self
            .get_json(&self.counter_path(field), false, "read_counter")
            .await?;
        match value {
            Value::Null => Ok(0),
            other => Self::counter_value(&other, field),
        }
    }

    fn counter_value(value: &Value, field: CounterField) -> Result<u64> {
        let number = json_number_as_i64(value).ok_or_else(|| {
            DashboardError::store_unavailable(format!(
                "计数字段 {field} 不是整数: {value}"
            ))
        })?;
        counter_from_i64(number, field.path())
            .map_err(|e| DashboardError::store_unavailable_with_source("计数值损坏", e))
    }

    /// 把记录集合解析为按推送键排序的记录列表
    ///
    /// 字段类型不符时按缺失处理，只有非对象条目会被跳过。
    fn parse_records(value: Value) -> Result<Vec<EggRecord>> {
        let entries: Vec<(String, Value)> = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Object(map) => {
                let mut entries: Vec<_> = map.into_iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                entries
            }
            // 整数键的集合会被 Firebase 以数组形式返回，下标顺序即插入顺序
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            other => {
                return Err(DashboardError::store_unavailable(format!(
                    "记录集合格式异常: {other}"
                )));
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            match RawEggRecord::from_json(&item) {
                Some(raw) => records.push(EggRecord::from_raw(key, raw)),
                None => {
                    lwarn!(
                        "store",
                        LogStage::ExternalApi,
                        LogComponent::Store,
                        "skip_malformed_record",
                        &format!("跳过非对象记录 {key}: {item}")
                    );
                }
            }
        }
        Ok(records)
    }

    fn parse_counters(value: &Value) -> Result<CounterValues> {
        let mut values = CounterValues::new();
        if value.is_null() {
            return Ok(values);
        }
        if !value.is_object() {
            return Err(DashboardError::store_unavailable(format!(
                "计数器格式异常: {value}"
            )));
        }

        for field in CounterField::ALL {
            let node = field
                .path()
                .split('/')
                .try_fold(value, |node, segment| node.get(segment));
            if let Some(node) = node.filter(|node| !node.is_null()) {
                values.insert(field, Self::counter_value(node, field)?);
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl EggStore for FirebaseStore {
    fn backend_name(&self) -> &'static str {
        "firebase"
    }

    async fn fetch_records(&self) -> Result<Vec<EggRecord>> {
        let value = self
            .get_json(&self.records_path, false, "fetch_records")
            .await?;
        let records = Self::parse_records(value)?;

        ldebug!(
            "store",
            LogStage::ExternalApi,
            LogComponent::Store,
            "fetch_records",
            "读取全部分拣记录",
            count = records.len()
        );
        Ok(records)
    }

    async fn push_record(&self, record: &NewEggRecord) -> Result<String> {
        let response = self
            .request(Method::POST, &self.records_path)
            .json(&record.to_raw())
            .send()
            .await?;
        let pushed: PushResponse = Self::check(response, "push_record").await?.json().await?;
        Ok(pushed.name)
    }

    async fn increment_counter(&self, field: CounterField, delta: u64) -> Result<u64> {
        let response = self
            .request(Method::PUT, &self.counter_path(field))
            .json(&json!({ ".sv": { "increment": delta } }))
            .send()
            .await?;
        let body: Value = Self::check(response, "increment_counter")
            .await?
            .json()
            .await
            .unwrap_or(Value::Null);

        if body.is_null() {
            return self.read_counter(field).await;
        }
        Self::counter_value(&body, field)
    }

    async fn fetch_counters(&self) -> Result<CounterValues> {
        let value = self
            .get_json(&self.counters_path, false, "fetch_counters")
            .await?;
        Self::parse_counters(&value)
    }

    async fn reset_counter(&self, field: CounterField) -> Result<()> {
        let response = self
            .request(Method::PUT, &self.counter_path(field))
            .json(&json!(0))
            .send()
            .await?;
        Self::check(response, "reset_counter").await?;
        Ok(())
    }

    async fn delete_records(&self) -> Result<u64> {
        let keys = self
            .get_json(&self.records_path, true, "count_records")
            .await?;
        let count = match &keys {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.iter().filter(|item| !item.is_null()).count(),
            _ => 0,
        };

        let response = self
            .request(Method::DELETE, &self.records_path)
            .send()
            .await?;
        Self::check(response, "delete_records").await?;

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<()> {
        self.get_json(&self.counters_path, true, "ping").await?;
        Ok(())
    }
}
