use sea_orm_migration::prelude::*;

// 连接串来自 DATABASE_URL 或 `-u` 参数，例如 sqlite://data/egg_dashboard.db?mode=rwc
#[tokio::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
