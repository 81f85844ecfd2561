//! 计数策略
//!
//! 同一个计数快照契约的两种实现：
//!
//! - [`RecomputeCounters`]: 读取时扫描全部记录重新聚合，写入无额外操作
//! - [`IncrementalCounters`]: 写入时逐字段原子自增，读取时直接取维护好的字段
//!
//! 对同一组写入，两者得到的快照必须一致。

use std::sync::Arc;

use async_trait::async_trait;

use super::aggregator::{CounterSnapshot, aggregate, counter_fields};
use crate::config::CounterStrategyKind;
use crate::error::{DashboardError, Result};
use crate::store::{CounterField, SharedStore};
use crate::types::EggRecord;
use crate::{
    ldebug, lerror,
    logging::{LogComponent, LogStage},
};

/// 计数策略
#[async_trait]
pub trait CounterStrategy: Send + Sync {
    /// 策略类型
    fn kind(&self) -> CounterStrategyKind;

    /// 记录写入成功后调用
    async fn record_written(&self, record: &EggRecord) -> Result<()>;

    /// 当前计数快照
    async fn snapshot(&self) -> Result<CounterSnapshot>;

    /// 已持有全部记录时的计数快照，避免重复读取
    async fn snapshot_with(&self, _records: &[EggRecord]) -> Result<CounterSnapshot> {
        self.snapshot().await
    }

    /// 记录删除后调用，返回已清零的计数字段数
    async fn reset(&self) -> Result<usize>;
}

/// 读取时重新聚合
pub struct RecomputeCounters {
    store: SharedStore,
}

impl RecomputeCounters {
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CounterStrategy for RecomputeCounters {
    fn kind(&self) -> CounterStrategyKind {
        CounterStrategyKind::Recompute
    }

    async fn record_written(&self, _record: &EggRecord) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<CounterSnapshot> {
        let records = self.store.fetch_records().await?;
        Ok(aggregate(&records))
    }

    async fn snapshot_with(&self, records: &[EggRecord]) -> Result<CounterSnapshot> {
        Ok(aggregate(records))
    }

    async fn reset(&self) -> Result<usize> {
        Ok(0)
    }
}

/// 写入时逐字段自增
pub struct IncrementalCounters {
    store: SharedStore,
}

impl IncrementalCounters {
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CounterStrategy for IncrementalCounters {
    fn kind(&self) -> CounterStrategyKind {
        CounterStrategyKind::Incremental
    }

    async fn record_written(&self, record: &EggRecord) -> Result<()> {
        // 各字段独立自增，快照不是一个多字段事务
        for field in counter_fields(record.size, record.color, record.quality) {
            let value = self.store.increment_counter(field, 1).await.map_err(|e| {
                lerror!(
                    "store",
                    LogStage::Aggregation,
                    LogComponent::Statistics,
                    "increment_failed",
                    &format!("计数字段自增失败: {field}"),
                    record_id = %record.id
                );
                e
            })?;
            ldebug!(
                "store",
                LogStage::Aggregation,
                LogComponent::Statistics,
                "increment",
                "计数字段已自增",
                field = field.path(),
                value = value
            );
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<CounterSnapshot> {
        let values = self.store.fetch_counters().await?;
        Ok(CounterSnapshot::from_values(&values))
    }

    async fn reset(&self) -> Result<usize> {
        let mut pending = Vec::new();
        let mut last_error = None;

        for field in CounterField::ALL {
            if let Err(e) = self.store.reset_counter(field).await {
                lerror!(
                    "store",
                    LogStage::Aggregation,
                    LogComponent::Statistics,
                    "reset_counter_failed",
                    &format!("计数字段清零失败: {field}: {e}")
                );
                pending.push(field.path().to_string());
                last_error = Some(e);
            }
        }

        if pending.is_empty() {
            return Ok(CounterField::ALL.len());
        }

        Err(DashboardError::partial_reset(
            "记录已删除，但部分计数字段未清零；重新执行重置即可修复",
            pending,
            last_error.map(anyhow::Error::new),
        ))
    }
}

/// 根据配置选择计数策略
#[must_use]
pub fn build_strategy(kind: CounterStrategyKind, store: SharedStore) -> Arc<dyn CounterStrategy> {
    match kind {
        CounterStrategyKind::Recompute => Arc::new(RecomputeCounters::new(store)),
        CounterStrategyKind::Incremental => Arc::new(IncrementalCounters::new(store)),
    }
}
