//! SeaORM storage backend
//!
//! Articles, daily digests and model request logs, stored in SQLite,
//! MySQL/MariaDB or PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::storage::models::{DailySummary, StorageConfig};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_daily_summary, new_article_to_active_model};
pub use query::{ARTICLE_PART_LIMIT, SKIPPED_DIGEST_CATEGORIES};

/// 每日摘要缓存 TTL（秒）
const SUMMARY_CACHE_TTL_SECS: u64 = 60;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AppError::config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 每日摘要缓存，写入时失效
    summary_cache: Cache<String, DailySummary>,
    /// 每次摘要写入后递增，读取方据此丢弃过期的缓存项
    summary_generation: Arc<AtomicU64>,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(AppError::config("database.database_url is empty"));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config.database.pool_size).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            summary_cache: Cache::builder()
                .time_to_live(Duration::from_secs(SUMMARY_CACHE_TTL_SECS))
                .max_capacity(366)
                .build(),
            summary_generation: Arc::new(AtomicU64::new(0)),
            retry_config,
        };

        run_migrations(&storage.db).await?;

        info!(
            "{} storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
        }
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Close the connection pool
    pub async fn close(&self) {
        match self.db.clone().close().await {
            Ok(()) => info!("Database connection closed."),
            Err(e) => warn!("Failed to close database connection: {}", e),
        }
    }

    fn summary_generation(&self) -> u64 {
        self.summary_generation.load(Ordering::SeqCst)
    }

    fn invalidate_summary_cache(&self, key: &str) {
        self.summary_generation.fetch_add(1, Ordering::SeqCst);
        self.summary_cache.invalidate(key);
    }

    /// Cache a digest read at `seen_generation`
    ///
    /// A write that committed while the row was being read bumps the
    /// generation; the entry is then dropped again so the next read goes to
    /// the database.
    fn cache_loaded_summary(&self, key: String, summary: DailySummary, seen_generation: u64) {
        self.summary_cache.insert(key.clone(), summary);
        if self.summary_generation() != seen_generation {
            self.summary_cache.invalidate(&key);
        }
    }
}
