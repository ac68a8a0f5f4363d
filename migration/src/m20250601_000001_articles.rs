use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Article::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Article::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Article::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(Article::Title).text().not_null())
                    .col(
                        ColumnDef::new(Article::Summary)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Article::Article).text().not_null())
                    .col(ColumnDef::new(Article::Category).string().not_null())
                    .col(
                        ColumnDef::new(Article::PublishedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // URL 唯一，导入时用于去重
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_articles_url")
                    .table(Article::Table)
                    .col(Article::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_articles_published_at")
                    .table(Article::Table)
                    .col(Article::PublishedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_articles_category_published_at")
                    .table(Article::Table)
                    .col(Article::Category)
                    .col(Article::PublishedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_articles_category_published_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_articles_published_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_articles_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Article::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Article {
    #[sea_orm(iden = "articles")]
    Table,
    Id,
    Url,
    Title,
    Summary,
    Article,
    Category,
    PublishedAt,
}
