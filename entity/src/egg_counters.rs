//! # 计数器实体定义
//!
//! 每个计数字段一行，`field` 形如 `total`、`sizes/small`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 计数器实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "egg_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub field: String,
    pub value: i64,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
