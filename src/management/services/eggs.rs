//! # 分拣记录服务
//!
//! 写入、手动批量录入、重置、看板数据与报表生成。HTTP handler 只负责
//! 提取参数与组装响应，业务规则都在这里。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::{CounterStrategyKind, ReportSettings};
use crate::error::{DashboardError, Result};
use crate::report::{PdfRenderer, ReportPayload, ReportRenderer, build_report};
use crate::statistics::{CounterStrategy, ReportPeriod, SizeHistogram, select_window};
use crate::store::SharedStore;
use crate::types::{
    EggRecord, EggSpec, MANUAL_SOURCE, NewEggRecord, json_number_as_i64, timezone_utils,
};
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 单次手动录入的数量上限
pub const MAX_MANUAL_QTY: u32 = 5;

/// 看板计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounters {
    pub total: u64,
    pub good: u64,
    pub bad: u64,
    pub white: u64,
    pub brown: u64,
}

/// 品质分布
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBreakdown {
    pub good: u64,
    pub bad: u64,
    /// 合格率（百分比）
    pub good_rate: f64,
}

/// 最近记录，附带本地展示时间
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRecord {
    #[serde(flatten)]
    pub record: EggRecord,
    pub local_time: Option<String>,
}

/// `/api/data` 的响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub counters: DashboardCounters,
    pub sizes: SizeHistogram,
    pub quality: QualityBreakdown,
    pub total: u64,
    pub recent: Vec<RecentRecord>,
    pub strategy: CounterStrategyKind,
}

/// 手动录入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualAddOutcome {
    pub created: usize,
    pub records: Vec<EggRecord>,
}

/// 重置结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub status: &'static str,
    pub records_deleted: u64,
    pub counters_reset: usize,
}

/// 健康检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub backend: &'static str,
    pub strategy: CounterStrategyKind,
    pub timestamp: DateTime<Utc>,
}

/// 已渲染的报表文件
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// 解析手动录入数量：缺省为 1，接受数字或数字字符串，范围 `1..=5`
pub fn parse_quantity(value: Option<&Value>) -> Result<u32> {
    let qty = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::Number(_)) => value.and_then(json_number_as_i64),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| {
        DashboardError::validation_field("qty must be an integer between 1 and 5", "qty")
    })?;

    u32::try_from(qty)
        .ok()
        .filter(|qty| (1..=MAX_MANUAL_QTY).contains(qty))
        .ok_or_else(|| {
            DashboardError::validation_field(
                format!("qty {qty} is outside 1..={MAX_MANUAL_QTY}"),
                "qty",
            )
        })
}

/// 分拣记录服务
pub struct EggService {
    store: SharedStore,
    counters: Arc<dyn CounterStrategy>,
    settings: ReportSettings,
    renderer: Arc<dyn ReportRenderer>,
}

impl EggService {
    /// 创建服务，默认使用 PDF 渲染器
    #[must_use]
    pub fn new(
        store: SharedStore,
        counters: Arc<dyn CounterStrategy>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            store,
            counters,
            settings,
            renderer: Arc::new(PdfRenderer::new()),
        }
    }

    /// 替换报表渲染器
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    #[must_use]
    pub const fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// 写入一条已校验的记录并更新计数
    async fn write(&self, new_record: NewEggRecord) -> Result<EggRecord> {
        let id = self.store.push_record(&new_record).await?;
        let record = new_record.into_record(id);
        self.counters.record_written(&record).await?;
        Ok(record)
    }

    /// 写入一条分拣记录
    ///
    /// 校验失败时不产生任何写入。
    pub async fn record_egg(
        &self,
        size: &str,
        color: &str,
        quality: &str,
        confidence: f64,
        source: &str,
    ) -> Result<EggRecord> {
        let spec = EggSpec::validate(size, color, quality, self.settings.allow_other_color)?;
        let new_record = NewEggRecord::new(spec, confidence, source, Utc::now())?;

        let record = self.write(new_record).await?;
        linfo!(
            "api",
            LogStage::Request,
            LogComponent::Handler,
            "record_egg",
            "分拣记录已写入",
            record_id = %record.id,
            source = %record.source
        );
        Ok(record)
    }

    /// 手动批量录入 `qty` 条相同记录，每条独立写入
    pub async fn manual_add(
        &self,
        size: &str,
        color: &str,
        quality: &str,
        qty: u32,
    ) -> Result<ManualAddOutcome> {
        if !(1..=MAX_MANUAL_QTY).contains(&qty) {
            return Err(DashboardError::validation_field(
                format!("qty {qty} is outside 1..={MAX_MANUAL_QTY}"),
                "qty",
            ));
        }
        let spec = EggSpec::validate(size, color, quality, self.settings.allow_other_color)?;

        let mut records = Vec::with_capacity(qty as usize);
        for _ in 0..qty {
            let new_record = NewEggRecord::new(spec, 1.0, MANUAL_SOURCE, Utc::now())?;
            records.push(self.write(new_record).await?);
        }

        linfo!(
            "api",
            LogStage::Request,
            LogComponent::Handler,
            "manual_add",
            &format!("手动录入 {qty} 条记录"),
            size = spec.size.as_str(),
            color = spec.color.as_str(),
            quality = spec.quality.as_str()
        );

        Ok(ManualAddOutcome {
            created: records.len(),
            records,
        })
    }

    /// 删除全部记录并清零计数
    pub async fn reset_all(&self) -> Result<ResetOutcome> {
        let records_deleted = self.store.delete_records().await?;
        let counters_reset = self.counters.reset().await.map_err(|e| {
            lwarn!(
                "api",
                LogStage::Request,
                LogComponent::Handler,
                "reset_partial",
                &format!("重置未完成: {e}"),
                records_deleted = records_deleted
            );
            e
        })?;

        linfo!(
            "api",
            LogStage::Request,
            LogComponent::Handler,
            "reset_all",
            "记录与计数已重置",
            records_deleted = records_deleted,
            counters_reset = counters_reset
        );

        Ok(ResetOutcome {
            status: "ok",
            records_deleted,
            counters_reset,
        })
    }

    /// 看板数据：计数快照与最近记录
    pub async fn dashboard(&self) -> Result<DashboardView> {
        let offset = self.settings.offset()?;
        let records = self.store.fetch_records().await?;
        let snapshot = self.counters.snapshot_with(&records).await?;

        let recent = select_window(&records, &DateTime::<Utc>::MIN_UTC)
            .into_iter()
            .take(self.settings.recent_limit)
            .map(|record| RecentRecord {
                local_time: record
                    .timestamp
                    .as_ref()
                    .map(|ts| timezone_utils::format_for_display(ts, &offset)),
                record: record.clone(),
            })
            .collect();

        Ok(DashboardView {
            counters: DashboardCounters {
                total: snapshot.total,
                good: snapshot.good,
                bad: snapshot.bad,
                white: snapshot.white,
                brown: snapshot.brown,
            },
            sizes: snapshot.sizes,
            quality: QualityBreakdown {
                good: snapshot.good,
                bad: snapshot.bad,
                good_rate: snapshot.good_rate(),
            },
            total: snapshot.total,
            recent,
            strategy: self.counters.kind(),
        })
    }

    /// 以给定时刻为"现在"组装报表
    pub async fn report_at(&self, period: ReportPeriod, now: DateTime<Utc>) -> Result<ReportPayload> {
        let records = self.store.fetch_records().await?;
        let payload = build_report(&records, period, now, &self.settings)?;

        linfo!(
            "api",
            LogStage::Reporting,
            LogComponent::Report,
            "build_report",
            &format!("{} 报表已生成", period.as_str()),
            window_total = payload.listing.total,
            shown = payload.listing.shown
        );
        Ok(payload)
    }

    /// 组装当前时刻的报表
    pub async fn report(&self, period: ReportPeriod) -> Result<ReportPayload> {
        self.report_at(period, Utc::now()).await
    }

    /// 渲染报表文件
    pub async fn render_report(&self, period: ReportPeriod) -> Result<RenderedReport> {
        let payload = self.report(period).await?;
        let bytes = self.renderer.render(&payload)?;
        Ok(RenderedReport {
            filename: period.filename(),
            content_type: self.renderer.content_type(),
            bytes,
        })
    }

    /// 存储连通性检查
    pub async fn health(&self) -> Result<HealthStatus> {
        self.store.ping().await?;
        Ok(HealthStatus {
            status: "ok",
            backend: self.store.backend_name(),
            strategy: self.counters.kind(),
            timestamp: Utc::now(),
        })
    }
}
