//! # 记录存储适配层
//!
//! 抽象"读取全部记录 / 追加一条记录 / 原子自增计数字段 / 批量删除"，
//! 并提供内存、SQLite、Firebase 三种实现。所有实现都在边界处把原始记录
//! 解析为 [`EggRecord`]，上层不再处理缺失字段。

pub mod firebase;
pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::types::{Color, EggRecord, NewEggRecord, Size};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// 独立维护的计数字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CounterField {
    Total,
    Good,
    Bad,
    White,
    Brown,
    Size(Size),
}

impl CounterField {
    /// 全部计数字段
    pub const ALL: [Self; 9] = [
        Self::Total,
        Self::Good,
        Self::Bad,
        Self::White,
        Self::Brown,
        Self::Size(Size::Small),
        Self::Size(Size::Medium),
        Self::Size(Size::Large),
        Self::Size(Size::Xlarge),
    ];

    /// 存储中的字段路径，尺寸字段嵌套在 `sizes/` 下
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Good => "good",
            Self::Bad => "bad",
            Self::White => "white",
            Self::Brown => "brown",
            Self::Size(Size::Small) => "sizes/small",
            Self::Size(Size::Medium) => "sizes/medium",
            Self::Size(Size::Large) => "sizes/large",
            Self::Size(Size::Xlarge) => "sizes/xlarge",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.path() == path)
    }

    /// 颜色对应的计数字段，未单独统计的颜色返回 `None`
    #[must_use]
    pub const fn for_color(color: Color) -> Option<Self> {
        match color {
            Color::White => Some(Self::White),
            Color::Brown => Some(Self::Brown),
            Color::Other => None,
        }
    }
}

impl fmt::Display for CounterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// 存储中读到的计数值，缺失字段视为 0
pub type CounterValues = BTreeMap<CounterField, u64>;

/// 记录存储接口
///
/// 读取结果按插入顺序返回，但调用方不应依赖存储顺序做时间排序。
#[async_trait]
pub trait EggStore: Send + Sync {
    /// 后端名称，用于日志与健康检查
    fn backend_name(&self) -> &'static str;

    /// 读取全部记录
    async fn fetch_records(&self) -> Result<Vec<EggRecord>>;

    /// 追加一条记录，返回存储分配的 id
    async fn push_record(&self, record: &NewEggRecord) -> Result<String>;

    /// 原子自增单个计数字段，返回自增后的值
    async fn increment_counter(&self, field: CounterField, delta: u64) -> Result<u64>;

    /// 读取当前维护的计数字段
    async fn fetch_counters(&self) -> Result<CounterValues>;

    /// 将单个计数字段置零
    async fn reset_counter(&self, field: CounterField) -> Result<()>;

    /// 删除全部记录，返回删除条数
    async fn delete_records(&self) -> Result<u64>;

    /// 连通性检查
    async fn ping(&self) -> Result<()>;
}

/// 共享的存储句柄
pub type SharedStore = Arc<dyn EggStore>;

/// 根据配置创建存储
pub async fn build_store(config: &StoreConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::connect(&config.sqlite).await?),
        StoreBackend::Firebase => Arc::new(FirebaseStore::new(&config.firebase)?),
    };

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Store,
        "build_store",
        &format!("记录存储已就绪: {}", store.backend_name()),
        backend = store.backend_name()
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_paths_round_trip() {
        for field in CounterField::ALL {
            assert_eq!(CounterField::from_path(field.path()), Some(field));
        }
        assert_eq!(CounterField::from_path("sizes/jumbo"), None);
        assert_eq!(CounterField::Size(Size::Xlarge).to_string(), "sizes/xlarge");
    }

    #[test]
    fn test_color_fields() {
        assert_eq!(CounterField::for_color(Color::White), Some(CounterField::White));
        assert_eq!(CounterField::for_color(Color::Other), None);
    }

    #[tokio::test]
    async fn test_build_memory_store() {
        let store = build_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert!(store.fetch_records().await.unwrap().is_empty());
    }
}
