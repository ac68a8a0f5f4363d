use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

#[derive(Debug, Clone)]
pub enum AppError {
    Config(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    DateParse(String),
    NotFound(String),
    Serialization(String),
    Upstream { status: u16, message: String },
    UpstreamUnavailable(String),
    TokenLimit(String),
    AgentResponse(String),
    FileOperation(String),
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "E001",
            AppError::DatabaseConnection(_) => "E002",
            AppError::DatabaseOperation(_) => "E003",
            AppError::Validation(_) => "E004",
            AppError::DateParse(_) => "E005",
            AppError::NotFound(_) => "E006",
            AppError::Serialization(_) => "E007",
            AppError::Upstream { .. } => "E008",
            AppError::UpstreamUnavailable(_) => "E009",
            AppError::TokenLimit(_) => "E010",
            AppError::AgentResponse(_) => "E011",
            AppError::FileOperation(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Configuration Error",
            AppError::DatabaseConnection(_) => "Database Connection Error",
            AppError::DatabaseOperation(_) => "Database Operation Error",
            AppError::Validation(_) => "Validation Error",
            AppError::DateParse(_) => "Date Parse Error",
            AppError::NotFound(_) => "Resource Not Found",
            AppError::Serialization(_) => "Serialization Error",
            AppError::Upstream { .. } => "Upstream Error",
            AppError::UpstreamUnavailable(_) => "Upstream Unavailable",
            AppError::TokenLimit(_) => "Token Limit Exceeded",
            AppError::AgentResponse(_) => "Agent Response Error",
            AppError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AppError::Config(msg)
            | AppError::DatabaseConnection(msg)
            | AppError::DatabaseOperation(msg)
            | AppError::Validation(msg)
            | AppError::DateParse(msg)
            | AppError::NotFound(msg)
            | AppError::Serialization(msg)
            | AppError::UpstreamUnavailable(msg)
            | AppError::TokenLimit(msg)
            | AppError::AgentResponse(msg)
            | AppError::FileOperation(msg) => msg,
            AppError::Upstream { message, .. } => message,
        }
    }

    /// HTTP status the API answers with for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DateParse(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseConnection(_) | AppError::UpstreamUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Config(_)
            | AppError::DatabaseOperation(_)
            | AppError::Serialization(_)
            | AppError::TokenLimit(_)
            | AppError::AgentResponse(_)
            | AppError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("application/json; charset=utf-8")
            .json(json!({
                "detail": self.message(),
                "code": self.code(),
            }))
    }
}

// 便捷的构造函数
impl AppError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        AppError::Config(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AppError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AppError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        AppError::DateParse(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AppError::Serialization(msg.into())
    }

    pub fn upstream<T: Into<String>>(status: u16, msg: T) -> Self {
        AppError::Upstream {
            status,
            message: msg.into(),
        }
    }

    pub fn upstream_unavailable<T: Into<String>>(msg: T) -> Self {
        AppError::UpstreamUnavailable(msg.into())
    }

    pub fn token_limit<T: Into<String>>(msg: T) -> Self {
        AppError::TokenLimit(msg.into())
    }

    pub fn agent_response<T: Into<String>>(msg: T) -> Self {
        AppError::AgentResponse(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        AppError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
