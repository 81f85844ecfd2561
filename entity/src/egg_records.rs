//! # 分拣记录实体定义
//!
//! 与远程文档库保持同样的宽松形态：除主键外所有列都可为空，
//! 默认值在读取时统一解析。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 分拣记录实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "egg_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quality: Option<String>,
    pub confidence: Option<f64>,
    pub source: Option<String>,
    /// ISO-8601 字符串，原样保存
    pub timestamp: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
