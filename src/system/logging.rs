//! Logging system initialization
//!
//! Three output formats are supported:
//! - `text`: human readable, ANSI colors when writing to the console
//! - `json`: tracing-subscriber's JSON lines
//! - `cloud`: one JSON object per line in the shape Google Cloud Logging
//!   understands (`severity`, `message`, `timestamp`, ...), with event and
//!   span fields as top-level keys

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{JsonFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

use crate::config::{Environment, LogFormat, LoggingConfig};
use crate::errors::{AppError, Result};

const DEFAULT_LOG_FILE_NAME: &str = "newsdigest.log";
/// 数据库驱动日志过多，默认压低
const QUIET_TARGETS: &str = "sqlx=warn,sea_orm_migration=warn";

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_filter(level: &str) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("{},{}", level, QUIET_TARGETS));
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!(
            "[WARN] Invalid log filter '{}': {}. Falling back to 'info'.",
            directives, e
        );
        EnvFilter::new(format!("info,{}", QUIET_TARGETS))
    })
}

fn build_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let log_file = match config.file.as_deref() {
        Some(file) if !file.is_empty() => file,
        _ => return Ok(Box::new(std::io::stdout())),
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE_NAME);
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(filename.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
            .map_err(|e| {
                AppError::file_operation(format!("Failed to create rolling log appender: {}", e))
            })?;
        Ok(Box::new(appender))
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| {
                AppError::file_operation(format!("Failed to open log file '{}': {}", log_file, e))
            })?;
        Ok(Box::new(file))
    }
}

/// Initialize the global subscriber
///
/// The returned guard flushes the non-blocking writer on drop and must be
/// kept alive for as long as the program logs.
pub fn init_logging(config: &LoggingConfig, env: Environment) -> Result<WorkerGuard> {
    let writer = build_writer(config)?;
    let to_console = config.file.as_deref().is_none_or(str::is_empty);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = build_filter(&config.effective_level(env));

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true);

    let result = match config.effective_format(env) {
        LogFormat::Text => builder.with_ansi(to_console).try_init(),
        LogFormat::Json => builder.with_ansi(false).json().try_init(),
        LogFormat::Cloud => builder
            .with_ansi(false)
            .fmt_fields(JsonFields::new())
            .event_format(CloudLogFormat)
            .try_init(),
    };
    result.map_err(|e| AppError::config(format!("Failed to install log subscriber: {}", e)))?;

    Ok(guard)
}

/// Cloud Logging severity of a tracing level
pub fn severity(level: &Level) -> &'static str {
    match *level {
        Level::TRACE | Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

/// Event formatter for Google Cloud Logging
///
/// Span fields are read back from the `JsonFields` formatter, so the
/// subscriber must be built with `.fmt_fields(JsonFields::new())`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudLogFormat;

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

impl<S, N> FormatEvent<S, N> for CloudLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        // 外层 span 字段先写入，内层与事件字段依次覆盖
        let mut entry = Map::new();
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(formatted) = extensions.get::<FormattedFields<N>>()
                    && !formatted.fields.is_empty()
                    && let Ok(fields) = serde_json::from_str::<Map<String, Value>>(&formatted.fields)
                {
                    entry.extend(fields);
                }
                entry.insert("span".into(), Value::from(span.name()));
            }
        }
        entry.extend(visitor.fields);

        // 保留键最后写入，不会被同名字段覆盖
        entry.insert(
            "message".into(),
            Value::from(visitor.message.unwrap_or_default()),
        );
        entry.insert("severity".into(), Value::from(severity(metadata.level())));
        entry.insert(
            "timestamp".into(),
            Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)),
        );
        entry.insert("target".into(), Value::from(metadata.target()));
        if let Some(file) = metadata.file() {
            entry.insert("file".into(), Value::from(file));
        }
        if let Some(line) = metadata.line() {
            entry.insert("line".into(), Value::from(line));
        }

        let line = serde_json::to_string(&Value::Object(entry)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}
