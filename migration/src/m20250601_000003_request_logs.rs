use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RequestLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RequestLog::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RequestLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RequestLog::ModelId).string().not_null())
                    .col(ColumnDef::new(RequestLog::Payload).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_request_logs_created_at")
                    .table(RequestLog::Table)
                    .col(RequestLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_request_logs_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(RequestLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RequestLog {
    #[sea_orm(iden = "request_logs")]
    Table,
    Id,
    CreatedAt,
    ModelId,
    Payload,
}
