//! # SQLite 存储
//!
//! 基于 Sea-ORM 的本地存储；计数字段自增在事务内以 upsert 完成

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use entity::{egg_counters, egg_records};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, QueryOrder, Set, Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;

use super::{CounterField, CounterValues, EggStore};
use crate::config::DatabaseConfig;
use crate::error::{Context, DashboardError, Result};
use crate::types::{EggRecord, NewEggRecord, RawEggRecord, counter_from_i64, delta_to_i64};
use crate::{
    ldebug, linfo, lwarn,
    logging::{LogComponent, LogStage},
};

const INCREMENT_SQL: &str = "INSERT INTO egg_counters (field, value, updated_at) \
     VALUES (?, ?, CURRENT_TIMESTAMP) \
     ON CONFLICT(field) DO UPDATE SET value = value + excluded.value, updated_at = CURRENT_TIMESTAMP";

const RESET_SQL: &str = "INSERT INTO egg_counters (field, value, updated_at) \
     VALUES (?, 0, CURRENT_TIMESTAMP) \
     ON CONFLICT(field) DO UPDATE SET value = 0, updated_at = CURRENT_TIMESTAMP";

/// SQLite 存储
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// 连接数据库并执行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.get_connection_url()?;

        let mut options = ConnectOptions::new(url.clone());
        options
            .max_connections(config.max_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .sqlx_logging(false);
        if config.is_memory_database() {
            // 内存库每个连接互相独立，只能保留单个连接
            options.max_connections(1).min_connections(1);
        }

        let db = Database::connect(options).await.map_err(|e| {
            DashboardError::store_unavailable_with_source(format!("无法连接数据库: {url}"), e)
        })?;

        migration::Migrator::up(&db, None)
            .await
            .context("数据库迁移失败")?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Store,
            "sqlite_connected",
            "SQLite 存储已连接，迁移完成",
            memory = config.is_memory_database()
        );

        Ok(Self { db })
    }

    /// 使用已迁移的连接
    #[must_use]
    pub const fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 直接写入一条原始记录（可包含缺失或异常字段）
    pub async fn insert_raw(&self, raw: RawEggRecord) -> Result<String> {
        let model = egg_records::ActiveModel {
            size: Set(raw.size),
            color: Set(raw.color),
            quality: Set(raw.quality),
            confidence: Set(raw.confidence),
            source: Set(raw.source),
            timestamp: Set(raw.timestamp),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await.context("写入分拣记录失败")?;
        Ok(inserted.id.to_string())
    }
}

fn to_raw(model: egg_records::Model) -> (String, RawEggRecord) {
    (
        model.id.to_string(),
        RawEggRecord {
            size: model.size,
            color: model.color,
            quality: model.quality,
            confidence: model.confidence,
            source: model.source,
            timestamp: model.timestamp,
        },
    )
}

#[async_trait]
impl EggStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_records(&self) -> Result<Vec<EggRecord>> {
        let models = egg_records::Entity::find()
            .order_by_asc(egg_records::Column::Id)
            .all(&self.db)
            .await?;

        ldebug!(
            "store",
            LogStage::Db,
            LogComponent::Store,
            "fetch_records",
            "读取全部分拣记录",
            count = models.len()
        );

        Ok(models
            .into_iter()
            .map(|model| {
                let (id, raw) = to_raw(model);
                EggRecord::from_raw(id, raw)
            })
            .collect())
    }

    async fn push_record(&self, record: &NewEggRecord) -> Result<String> {
        self.insert_raw(record.to_raw()).await
    }

    async fn increment_counter(&self, field: CounterField, delta: u64) -> Result<u64> {
        let delta = delta_to_i64(delta, field.path())
            .map_err(|e| DashboardError::validation(e.to_string()))?;

        let txn = self.db.begin().await?;
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            INCREMENT_SQL,
            [field.path().into(), delta.into()],
        ))
        .await?;

        let value = egg_counters::Entity::find_by_id(field.path().to_string())
            .one(&txn)
            .await?
            .map_or(0, |row| row.value);
        txn.commit().await?;

        counter_from_i64(value, field.path())
            .map_err(|e| DashboardError::store_unavailable_with_source("计数值损坏", e))
    }

    async fn fetch_counters(&self) -> Result<CounterValues> {
        let rows = egg_counters::Entity::find().all(&self.db).await?;

        let mut values = CounterValues::new();
        for row in rows {
            let Some(field) = CounterField::from_path(&row.field) else {
                lwarn!(
                    "store",
                    LogStage::Db,
                    LogComponent::Store,
                    "unknown_counter",
                    &format!("忽略未知计数字段: {}", row.field)
                );
                continue;
            };
            let value = counter_from_i64(row.value, &row.field)
                .map_err(|e| DashboardError::store_unavailable_with_source("计数值损坏", e))?;
            values.insert(field, value);
        }
        Ok(values)
    }

    async fn reset_counter(&self, field: CounterField) -> Result<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                RESET_SQL,
                [field.path().into()],
            ))
            .await?;
        Ok(())
    }

    async fn delete_records(&self) -> Result<u64> {
        let result = egg_records::Entity::delete_many()
            .exec(&self.db)
            .await
            .context("删除分拣记录失败")?;
        Ok(result.rows_affected)
    }

    async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_store;
    use crate::types::{EggSpec, Size};

    #[tokio::test]
    async fn test_push_and_fetch() {
        let store = create_test_store().await.unwrap();
        let spec = EggSpec::validate("large", "brown", "bad", false).unwrap();
        let record = NewEggRecord::new(spec, 0.42, "sequential-sorter", Utc::now()).unwrap();

        let id = store.push_record(&record).await.unwrap();
        let records = store.fetch_records().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].size, Some(Size::Large));
        assert_eq!(records[0].source, "sequential-sorter");
    }

    #[tokio::test]
    async fn test_increment_returns_new_value() {
        let store = create_test_store().await.unwrap();
        let field = CounterField::Size(Size::Medium);

        assert_eq!(store.increment_counter(field, 1).await.unwrap(), 1);
        assert_eq!(store.increment_counter(field, 2).await.unwrap(), 3);

        store.reset_counter(field).await.unwrap();
        assert_eq!(store.fetch_counters().await.unwrap().get(&field), Some(&0));
    }

    #[tokio::test]
    async fn test_delete_records_reports_count() {
        let store = create_test_store().await.unwrap();
        store.insert_raw(RawEggRecord::default()).await.unwrap();
        store.insert_raw(RawEggRecord::default()).await.unwrap();

        assert_eq!(store.delete_records().await.unwrap(), 2);
        assert!(store.fetch_records().await.unwrap().is_empty());
    }
}
