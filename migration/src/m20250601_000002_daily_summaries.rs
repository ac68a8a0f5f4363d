use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailySummary::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailySummary::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DailySummary::SummaryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DailySummary::Summaries).text().not_null())
                    .col(
                        ColumnDef::new(DailySummary::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每天只有一份摘要
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_daily_summaries_date")
                    .table(DailySummary::Table)
                    .col(DailySummary::SummaryDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_daily_summaries_date").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DailySummary::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DailySummary {
    #[sea_orm(iden = "daily_summaries")]
    Table,
    Id,
    SummaryDate,
    Summaries,
    UpdatedAt,
}
