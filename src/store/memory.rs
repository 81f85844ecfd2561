//! # 内存存储
//!
//! 进程内的记录集合与计数字段，适用于开发环境与测试

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{CounterField, CounterValues, EggStore};
use crate::error::Result;
use crate::types::{EggRecord, NewEggRecord, RawEggRecord};

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<IndexMap<String, RawEggRecord>>,
    counters: DashMap<CounterField, u64>,
    next_id: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("egg_{id:08}")
    }

    /// 直接写入一条原始记录（可包含缺失或异常字段）
    pub async fn insert_raw(&self, raw: RawEggRecord) -> String {
        let key = self.next_key();
        self.records.write().await.insert(key.clone(), raw);
        key
    }

    /// 当前记录条数
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EggStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_records(&self) -> Result<Vec<EggRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|(key, raw)| EggRecord::from_raw(key.clone(), raw.clone()))
            .collect())
    }

    async fn push_record(&self, record: &NewEggRecord) -> Result<String> {
        Ok(self.insert_raw(record.to_raw()).await)
    }

    async fn increment_counter(&self, field: CounterField, delta: u64) -> Result<u64> {
        let mut entry = self.counters.entry(field).or_insert(0);
        let value = entry.value_mut();
        *value = value.saturating_add(delta);
        Ok(*value)
    }

    async fn fetch_counters(&self) -> Result<CounterValues> {
        Ok(self
            .counters
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect())
    }

    async fn reset_counter(&self, field: CounterField) -> Result<()> {
        self.counters.insert(field, 0);
        Ok(())
    }

    async fn delete_records(&self) -> Result<u64> {
        let mut records = self.records.write().await;
        let deleted = u64::try_from(records.len()).unwrap_or(u64::MAX);
        records.clear();
        Ok(deleted)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
