//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod egg_counters;
pub mod egg_records;

pub use egg_counters::Entity as EggCounters;
pub use egg_records::Entity as EggRecords;

#[cfg(test)]
mod tests;
