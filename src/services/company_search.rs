//! 公司搜索服务 - 业务能力层
//!
//! 只负责"取一批公司"能力：构建提示词、约束输出结构、解析响应、临时错误重试。
//! 不关心批次循环、去重和历史记录。

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};
use crate::models::CompanyRecord;
use crate::services::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// 结构化输出的 Schema 名称
const SCHEMA_NAME: &str = "company_batch";

const SYSTEM_MESSAGE: &str = "You are a meticulous company research assistant. \
    You only answer with JSON that matches the requested schema.";

/// 外部搜索服务
///
/// 编排层只依赖这个 trait，测试时可以换成脚本化的实现
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 查询一批匹配 `query` 的公司，尽量避开 `exclude_names` 中已有的名称
    async fn fetch_batch(
        &self,
        query: &str,
        exclude_names: &[String],
    ) -> ProviderResult<Vec<CompanyRecord>>;
}

/// 基于 LLM 的公司搜索服务
pub struct CompanySearchService {
    client: LlmClient,
    retry: RetryPolicy,
}

impl CompanySearchService {
    /// 创建新的搜索服务
    pub fn new(config: &Config) -> ProviderResult<Self> {
        Ok(Self {
            client: LlmClient::new(config)?,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// 使用自定义重试策略
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl SearchProvider for CompanySearchService {
    async fn fetch_batch(
        &self,
        query: &str,
        exclude_names: &[String],
    ) -> ProviderResult<Vec<CompanyRecord>> {
        let prompt = build_prompt(query, exclude_names);
        let schema = response_schema();

        debug!(
            "请求新一批公司，模型: {}, 已排除 {} 个名称",
            self.client.model_name(),
            exclude_names.len()
        );

        let client = &self.client;
        let (prompt, schema) = (&prompt, &schema);
        let records = with_retry(&self.retry, "公司搜索", move || async move {
            let content = client
                .chat_json(prompt, SYSTEM_MESSAGE, SCHEMA_NAME, schema)
                .await?;
            parse_companies(content.as_deref())
        })
        .await?;

        info!("🔎 本次返回 {} 条公司记录", records.len());
        Ok(records)
    }
}

/// 构建搜索提示词
pub fn build_prompt(query: &str, exclude_names: &[String]) -> String {
    let avoidance = if exclude_names.is_empty() {
        String::new()
    } else {
        format!(
            "IMPORTANT: I have already found the following companies: {}. \
             Please find DIFFERENT and NEW companies related to the query. Do not repeat these.",
            exclude_names.join(", ")
        )
    };

    format!(
        r#"Perform an exhaustive search for companies.
Search query: "{}".

Task: Find a high-quality list of companies matching this query.
{}

Focus on finding accurate information. Verify the website and LinkedIn URLs are correct.
Aim for 15-20 new results if they exist.

For each company, provide:
- Company Name
- Website URL (must be valid)
- LinkedIn URL (must be valid)
- Country
- State (if available, else N/A)
- Industry

If details are missing, use "N/A".
Return a JSON object with a "companies" array."#,
        query, avoidance
    )
}

/// 响应必须满足的结构：`{"companies": [{六个字符串字段}]}`
pub fn response_schema() -> JsonValue {
    let field = json!({"type": "string"});
    json!({
        "type": "object",
        "properties": {
            "companies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": field,
                        "website": field,
                        "linkedin": field,
                        "country": field,
                        "state": field,
                        "industry": field,
                    },
                    "required": ["name", "website", "linkedin", "country", "state", "industry"],
                    "additionalProperties": false,
                },
            },
        },
        "required": ["companies"],
        "additionalProperties": false,
    })
}

#[derive(Deserialize)]
struct CompanyBatch {
    companies: Vec<CompanyRecord>,
}

/// 解析模型输出
///
/// 没有内容视为空批次；缺少 `companies` 或任一字段都是结构错误（不重试）
pub fn parse_companies(content: Option<&str>) -> ProviderResult<Vec<CompanyRecord>> {
    let Some(content) = content else {
        debug!("LLM 没有返回内容，按空批次处理");
        return Ok(Vec::new());
    };

    let json_text = strip_code_fence(content);
    let batch: CompanyBatch = serde_json::from_str(json_text)
        .map_err(|e| ProviderError::schema(format!("无法解析公司列表: {}", e)))?;

    let total = batch.companies.len();
    let records: Vec<CompanyRecord> = batch
        .companies
        .into_iter()
        .map(CompanyRecord::normalized)
        .filter(CompanyRecord::has_name)
        .collect();

    if records.len() < total {
        warn!("丢弃 {} 条没有公司名称的记录", total - records.len());
    }

    Ok(records)
}

/// 去掉 ```json ... ``` 包裹
fn strip_code_fence(content: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").ok());

    fence
        .as_ref()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content)
}
