use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::Environment;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "NEWSDIGEST";

/// 日志输出格式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// tracing-subscriber JSON lines
    Json,
    /// Google Cloud Logging structured lines (`severity`, `message`, ...)
    Cloud,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值
/// ENV 前缀：NEWSDIGEST，分隔符：__
/// 示例：NEWSDIGEST__SERVER__PORT=9999
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub adk: AdkConfig,
    #[serde(default)]
    pub vertex: VertexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// Build the layered configuration from `path` and the environment
    pub fn try_load_from(path: &str) -> Result<Self, config::ConfigError> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            )
            .build()?;

        let mut config: StaticConfig = settings.try_deserialize()?;

        // LOG_LEVEL 优先于配置文件
        if let Ok(level) = std::env::var("LOG_LEVEL")
            && !level.trim().is_empty()
        {
            config.logging.level = Some(level.trim().to_lowercase());
        }

        Ok(config)
    }

    /// Same as [`StaticConfig::try_load_from`], falling back to defaults on error
    pub fn load_from(path: &str) -> Self {
        match Self::try_load_from(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }

    /// 将示例配置写入文件，必要时创建父目录
    pub fn write_sample_config<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = Self::generate_sample_config()?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings the server can start without but which break a feature
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.vertex.project_id.trim().is_empty() {
            warnings.push("vertex.project_id is empty, daily summaries are unavailable".into());
        }
        if self.vertex.system_prompt.trim().is_empty() {
            warnings.push("vertex.system_prompt is empty, the model gets no instructions".into());
        }
        if url::Url::parse(&self.adk.base_url).is_err() {
            warnings.push(format!(
                "adk.base_url '{}' is not a valid URL, agent chat is unavailable",
                self.adk.base_url
            ));
        }
        if let Some(endpoint) = &self.vertex.endpoint
            && url::Url::parse(endpoint).is_err()
        {
            warnings.push(format!("vertex.endpoint '{}' is not a valid URL", endpoint));
        }

        warnings
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// Empty keeps the browser's same-origin policy, `*` allows any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Agent runtime (ADK api_server) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdkConfig {
    #[serde(default = "default_adk_base_url")]
    pub base_url: String,
    #[serde(default = "default_session_max_retries")]
    pub session_max_retries: u32,
    /// Delay before the second attempt; doubles on every further attempt
    #[serde(default = "default_session_backoff_base_ms")]
    pub session_backoff_base_ms: u64,
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default)]
    pub system_username: String,
    #[serde(default)]
    pub system_session_id: String,
}

/// Vertex AI (Gemini) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_vertex_region")]
    pub region: String,
    #[serde(default = "default_vertex_model")]
    pub model_id: String,
    #[serde(default = "default_vertex_model")]
    pub token_count_model: String,
    #[serde(default = "default_token_limit")]
    pub token_limit: u64,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
    #[serde(default)]
    pub system_prompt: String,
    /// Overrides `https://{region}-aiplatform.googleapis.com`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Static bearer token; when unset the GCE metadata server is asked
    #[serde(default)]
    pub access_token: Option<String>,
    /// Overrides the GCE metadata server token URL
    #[serde(default)]
    pub metadata_url: Option<String>,
    #[serde(default = "default_vertex_timeout_secs")]
    pub timeout_secs: u64,
}

impl VertexConfig {
    pub fn effective_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                endpoint.trim_end_matches('/').to_string()
            }
            _ => format!("https://{}-aiplatform.googleapis.com", self.region),
        }
    }
}

/// 日志配置
///
/// `level` 和 `format` 未设置时按运行环境取默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub format: Option<LogFormat>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

impl LoggingConfig {
    pub fn effective_level(&self, env: Environment) -> String {
        match &self.level {
            Some(level) if !level.is_empty() => level.clone(),
            _ if env.is_development() => "debug".to_string(),
            _ => "info".to_string(),
        }
    }

    pub fn effective_format(&self, env: Environment) -> LogFormat {
        match self.format {
            Some(format) => format,
            None if env.is_development() => LogFormat::Text,
            None => LogFormat::Cloud,
        }
    }
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8001
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "newsdigest.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_adk_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_session_max_retries() -> u32 {
    5
}

fn default_session_backoff_base_ms() -> u64 {
    1000
}

fn default_session_timeout_secs() -> u64 {
    30
}

fn default_run_timeout_secs() -> u64 {
    600
}

fn default_vertex_region() -> String {
    "europe-west1".to_string()
}

fn default_vertex_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_token_limit() -> u64 {
    200_000
}

fn default_thinking_budget() -> u32 {
    15_000
}

fn default_vertex_timeout_secs() -> u64 {
    300
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for AdkConfig {
    fn default() -> Self {
        Self {
            base_url: default_adk_base_url(),
            session_max_retries: default_session_max_retries(),
            session_backoff_base_ms: default_session_backoff_base_ms(),
            session_timeout_secs: default_session_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            system_username: String::new(),
            system_session_id: String::new(),
        }
    }
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: default_vertex_region(),
            model_id: default_vertex_model(),
            token_count_model: default_vertex_model(),
            token_limit: default_token_limit(),
            thinking_budget: default_thinking_budget(),
            system_prompt: String::new(),
            endpoint: None,
            access_token: None,
            metadata_url: None,
            timeout_secs: default_vertex_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: None,
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dev_server() {
        let config = StaticConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.vertex.token_limit, 200_000);
        assert_eq!(config.vertex.thinking_budget, 15_000);
        assert_eq!(config.adk.session_max_retries, 5);
        assert_eq!(config.adk.run_timeout_secs, 600);
    }

    #[test]
    fn test_logging_defaults_follow_environment() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.effective_level(Environment::Development), "debug");
        assert_eq!(logging.effective_level(Environment::Production), "info");
        assert_eq!(
            logging.effective_format(Environment::Development),
            LogFormat::Text
        );
        assert_eq!(
            logging.effective_format(Environment::Production),
            LogFormat::Cloud
        );

        let explicit = LoggingConfig {
            level: Some("warn".into()),
            format: Some(LogFormat::Json),
            ..LoggingConfig::default()
        };
        assert_eq!(explicit.effective_level(Environment::Development), "warn");
        assert_eq!(
            explicit.effective_format(Environment::Development),
            LogFormat::Json
        );
    }

    #[test]
    fn test_vertex_endpoint() {
        let mut vertex = VertexConfig::default();
        assert_eq!(
            vertex.effective_endpoint(),
            "https://europe-west1-aiplatform.googleapis.com"
        );
        vertex.endpoint = Some("http://127.0.0.1:9999/".into());
        assert_eq!(vertex.effective_endpoint(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_validate_reports_missing_vertex_settings() {
        let config = StaticConfig::default();
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("vertex.project_id")));
        assert!(warnings.iter().any(|w| w.contains("vertex.system_prompt")));
        assert!(!warnings.iter().any(|w| w.contains("adk.base_url")));
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = StaticConfig::generate_sample_config().unwrap();
        assert!(sample.contains("[server]"));
        assert!(sample.contains("port = 8001"));
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample config parses");
        assert_eq!(parsed.server.port, 8001);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("newsdigest.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[vertex]
project_id = "demo-project"
region = "us-central1"
"#,
        )
        .unwrap();

        let config = StaticConfig::try_load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.vertex.project_id, "demo-project");
        assert_eq!(config.vertex.model_id, "gemini-2.5-flash");
        assert_eq!(config.database.database_url, "newsdigest.db");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("cloud".parse::<LogFormat>().unwrap(), LogFormat::Cloud);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
