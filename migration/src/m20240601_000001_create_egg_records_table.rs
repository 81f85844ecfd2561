use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EggRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EggRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EggRecords::Size).string_len(16))
                    .col(ColumnDef::new(EggRecords::Color).string_len(16))
                    .col(ColumnDef::new(EggRecords::Quality).string_len(16))
                    .col(ColumnDef::new(EggRecords::Confidence).double())
                    .col(ColumnDef::new(EggRecords::Source).string_len(64))
                    .col(ColumnDef::new(EggRecords::Timestamp).string_len(64))
                    .col(
                        ColumnDef::new(EggRecords::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_egg_records_timestamp")
                    .table(EggRecords::Table)
                    .col(EggRecords::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EggRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EggRecords {
    Table,
    Id,
    Size,
    Color,
    Quality,
    Confidence,
    Source,
    Timestamp,
    CreatedAt,
}
