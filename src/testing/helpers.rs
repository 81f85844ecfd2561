//! # 测试辅助函数
//!
//! 提供通用的测试工具和辅助函数

use std::sync::Once;

use tracing::Level;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::store::SqliteStore;

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建已迁移的内存 SQLite 存储
pub async fn create_test_store() -> Result<SqliteStore> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    SqliteStore::connect(&config).await
}

/// 断言错误类型
#[macro_export]
macro_rules! assert_error_type {
    ($result:expr, $error_type:pat) => {
        match $result {
            Err($error_type) => (),
            Err(other) => panic!("Expected error type, got: {:?}", other),
            Ok(val) => panic!("Expected error, got Ok: {:?}", val),
        }
    };
}

/// 断言包含文本
#[macro_export]
macro_rules! assert_contains {
    ($text:expr, $substring:expr) => {
        assert!(
            $text.contains($substring),
            "Text '{}' does not contain '{}'",
            $text,
            $substring
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EggStore;

    #[tokio::test]
    async fn test_create_test_store() {
        init_test_env();
        let store = create_test_store().await.unwrap();
        store.ping().await.unwrap();
        assert!(store.fetch_records().await.unwrap().is_empty());
    }

    #[test]
    fn test_assert_macros() {
        assert_contains!("hello world", "world");

        let result: Result<()> = Err(crate::error::DashboardError::config("test"));
        assert_error_type!(result, crate::error::DashboardError::Config { .. });
    }
}
