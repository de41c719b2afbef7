use thiserror::Error;

/// 外部搜索服务错误
///
/// 由 `CompanySearchService` 返回，编排层把它视为"本批次失败"
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 服务返回非 2xx 状态码
    #[error("服务返回错误状态 {status}: {message}")]
    Status { status: u16, message: String },
    /// 网络请求失败（连接、超时、读取响应体）
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    /// 响应内容不符合约定的 JSON 结构
    #[error("响应结构不合法: {0}")]
    Schema(String),
    /// 构建请求失败
    #[error("请求构建失败: {0}")]
    Request(String),
}

impl ProviderError {
    /// HTTP 状态码（仅 `Status` 变体有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 是否为可重试的临时错误：429 或任意 5xx
    pub fn is_transient(&self) -> bool {
        matches!(self.status_code(), Some(status) if status == 429 || (500..600).contains(&status))
    }
}

/// 搜索会话错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// 查询为空或只有空白
    #[error("查询内容不能为空")]
    EmptyQuery,
    /// 第一批就没有任何结果
    #[error("没有找到任何公司")]
    NoResults,
    /// 逃出单批次保护的意外错误
    #[error("搜索过程中发生意外错误: {0}")]
    Session(String),
    /// 管理员密钥错误
    #[error("访问密钥错误")]
    InvalidAccessKey,
    /// 没有配置管理员密钥
    #[error("未配置管理员访问密钥 (BEAGLE_ADMIN_KEY)")]
    AccessKeyNotConfigured,
}

impl SearchError {
    /// 展示给用户的提示文本
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::EmptyQuery => "Please enter a search query.",
            SearchError::NoResults => "No companies found.",
            SearchError::Session(_) => "An unexpected error occurred. Showing all found results.",
            SearchError::InvalidAccessKey => "Invalid Access Key.",
            SearchError::AccessKeyNotConfigured => "History access is not configured.",
        }
    }
}

/// 持久化存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("读写存储失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化历史记录失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 没有提供 API 密钥
    #[error("缺少 LLM API 密钥，请设置环境变量 LLM_API_KEY")]
    MissingApiKey,
    /// 配置值不合法
    #[error("配置项 {name} 的值 '{value}' 不合法")]
    InvalidValue { name: String, value: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 解析配置文件失败
    #[error("解析配置文件失败 ({path}): {source}")]
    FileParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl StoreError {
    /// 创建 IO 错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl ProviderError {
    /// 创建结构错误
    pub fn schema(message: impl Into<String>) -> Self {
        ProviderError::Schema(message.into())
    }
}

// ========== Result 类型别名 ==========

/// 外部服务调用结果类型
pub type ProviderResult<T> = Result<T, ProviderError>;

/// 存储操作结果类型
pub type StoreResult<T> = Result<T, StoreError>;
