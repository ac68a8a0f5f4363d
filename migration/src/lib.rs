pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250601_000001_articles;
mod m20250601_000002_daily_summaries;
mod m20250601_000003_request_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_articles::Migration),
            Box::new(m20250601_000002_daily_summaries::Migration),
            Box::new(m20250601_000003_request_logs::Migration),
        ]
    }
}
