pub mod article;
pub mod daily_summary;
pub mod request_log;

pub use article::Entity as ArticleEntity;
pub use daily_summary::Entity as DailySummaryEntity;
pub use request_log::Entity as RequestLogEntity;
