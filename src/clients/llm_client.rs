/// LLM API 客户端
///
/// 封装一次 OpenAI 兼容的 chat completion 调用（带 JSON Schema 输出约束）。
/// 请求体用 `async-openai` 的类型构建，通过 reqwest 发送，
/// 这样才能拿到 HTTP 状态码交给重试策略判断。
use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

/// LLM 客户端
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            api_key: config.llm_api_key.clone(),
            api_base_url: config.llm_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.llm_model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 发送要求结构化输出的聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息
    /// - `schema_name`: JSON Schema 名称
    /// - `schema`: 响应必须满足的 JSON Schema
    ///
    /// # 返回
    /// 返回模型输出的文本；服务没有返回内容时为 `None`
    pub async fn chat_json(
        &self,
        user_message: &str,
        system_message: &str,
        schema_name: &str,
        schema: &JsonValue,
    ) -> ProviderResult<Option<String>> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let body = self.build_request(user_message, system_message, schema_name, schema)?;
        let url = format!("{}/chat/completions", self.api_base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);
            warn!("LLM API 返回错误状态 {}: {}", status.as_u16(), message);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| ProviderError::schema(format!("响应不是合法 JSON: {}", e)))?;

        debug!("LLM API 调用成功");

        Ok(extract_content(&payload))
    }

    /// 构建请求体
    fn build_request(
        &self,
        user_message: &str,
        system_message: &str,
        schema_name: &str,
        schema: &JsonValue,
    ) -> ProviderResult<JsonValue> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let mut body =
            serde_json::to_value(&request).map_err(|e| ProviderError::Request(e.to_string()))?;

        // 结构化输出约束
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema_name,
                "strict": true,
                "schema": schema,
            }
        });

        Ok(body)
    }
}

/// 提取第一个 choice 的文本内容
fn extract_content(payload: &JsonValue) -> Option<String> {
    payload
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// 从错误响应中提取可读信息
fn extract_error_message(body: &str) -> String {
    let parsed: Option<JsonValue> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        // OpenAI 风格是 {"error": {"message": ...}}，部分网关返回数组
        let error = match value {
            JsonValue::Array(items) => items.first()?.get("error")?,
            _ => value.get("error")?,
        };
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "<empty body>".to_string()
        } else {
            crate::utils::logging::truncate_text(body, 200)
        }
    })
}
