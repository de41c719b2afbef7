use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 单次会话最多发起的批次数
pub const MAX_BATCHES: usize = 10;

/// 默认配置文件
const DEFAULT_CONFIG_FILE: &str = "beagle.toml";

/// 程序配置
///
/// 加载顺序：默认值 → 配置文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 搜索配置 ---
    /// 每次会话的最大批次数（不超过 MAX_BATCHES）
    pub max_batches: usize,
    /// 批次之间的等待时间（毫秒）
    pub batch_delay_ms: u64,
    /// 临时错误的最大重试次数
    pub max_retries: u32,
    /// 第一次重试前的等待时间（毫秒），之后每次翻倍
    pub retry_base_delay_ms: u64,
    // --- 历史记录 ---
    /// 数据目录
    pub data_dir: PathBuf,
    /// 保留的历史记录条数
    pub history_limit: usize,
    /// 查看历史记录所需的访问密钥
    pub admin_access_key: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-3-pro-preview".to_string(),
            request_timeout_secs: 180,
            max_batches: MAX_BATCHES,
            batch_delay_ms: 1500,
            max_retries: 3,
            retry_base_delay_ms: 2000,
            data_dir: PathBuf::from("beagle_data"),
            history_limit: 50,
            admin_access_key: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BEAGLE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = Self::from_file(Path::new(&path))?;
        Ok(base.with_env())
    }

    /// 读取 TOML 配置文件，文件不存在时返回默认配置
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::FileParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// 解析 TOML 文本，缺省的键使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖当前配置
    pub fn with_env(self) -> Self {
        let base = self;
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.request_timeout_secs),
            max_batches: std::env::var("MAX_BATCHES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_batches),
            batch_delay_ms: std::env::var("BATCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.batch_delay_ms),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_retries),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.retry_base_delay_ms),
            data_dir: std::env::var("BEAGLE_DATA_DIR").map(PathBuf::from).unwrap_or(base.data_dir),
            history_limit: std::env::var("HISTORY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(base.history_limit),
            admin_access_key: std::env::var("BEAGLE_ADMIN_KEY").ok().or(base.admin_access_key),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }

    /// 检查发起搜索所需的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.max_batches == 0 || self.max_batches > MAX_BATCHES {
            return Err(ConfigError::InvalidValue {
                name: "max_batches".to_string(),
                value: self.max_batches.to_string(),
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "history_limit".to_string(),
                value: self.history_limit.to_string(),
            });
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_batches, 10);
        assert_eq!(config.batch_delay(), Duration::from_millis(1500));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay(), Duration::from_secs(2));
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            llm_model_name = "gemini-2.5-flash"
            batch_delay_ms = 10
            admin_access_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm_model_name, "gemini-2.5-flash");
        assert_eq!(config.batch_delay_ms, 10);
        assert_eq!(config.admin_access_key.as_deref(), Some("secret"));
        assert_eq!(config.max_batches, MAX_BATCHES);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::from_file(Path::new("definitely/not/here/beagle.toml")).unwrap();
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        config.llm_api_key = "key".to_string();
        assert!(config.validate().is_ok());

        config.max_batches = 11;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }
}
