//! # 实体定义测试
//!
//! 测试所有 Sea-ORM 实体定义的正确性

#[cfg(test)]
mod tests {
    use crate::{egg_counters, egg_records};
    use sea_orm::{EntityName, Set};

    #[tokio::test]
    async fn test_egg_record_creation() {
        let record = egg_records::ActiveModel {
            size: Set(Some("large".to_string())),
            color: Set(Some("brown".to_string())),
            quality: Set(Some("good".to_string())),
            confidence: Set(Some(0.93)),
            source: Set(Some("ai-sorter".to_string())),
            timestamp: Set(Some("2024-01-01T10:00:00Z".to_string())),
            ..Default::default()
        };

        assert_eq!(record.size.as_ref().as_deref(), Some("large"));
        assert_eq!(record.confidence.as_ref(), &Some(0.93));
        assert!(record.id.is_not_set());
    }

    #[tokio::test]
    async fn test_egg_record_allows_missing_fields() {
        let record = egg_records::ActiveModel {
            size: Set(None),
            quality: Set(None),
            ..Default::default()
        };

        assert_eq!(record.size.as_ref(), &None);
        assert!(record.timestamp.is_not_set());
    }

    #[tokio::test]
    async fn test_counter_creation() {
        let counter = egg_counters::ActiveModel {
            field: Set("sizes/small".to_string()),
            value: Set(3),
            ..Default::default()
        };

        assert_eq!(counter.field.as_ref(), "sizes/small");
        assert_eq!(counter.value.as_ref(), &3);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(egg_records::Entity.table_name(), "egg_records");
        assert_eq!(egg_counters::Entity.table_name(), "egg_counters");
    }
}
