//! LLM 服务 - 业务能力层
//!
//! 只负责"按指令从页面文本中抽取字段"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};
use crate::infrastructure::FieldSchema;

const SYSTEM_MESSAGE: &str = "你是一个网页信息抽取助手。你只根据提供的页面文本回答，\
                              不编造内容，并且只返回一个 JSON 对象。";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 完成指令式字段抽取
/// - 校验返回值是否符合字段格式
/// - 不持有页面，不关心是哪篇论文
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(self.model_name.clone(), e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 按指令从页面文本中抽取一个字段
    ///
    /// # 参数
    /// - `instruction`: 自然语言指令
    /// - `schema`: 期望的字段格式
    /// - `page_text`: 页面可见文本
    ///
    /// # 返回
    /// 返回符合 `schema` 的 JSON 值
    pub async fn extract_field(
        &self,
        instruction: &str,
        schema: FieldSchema,
        page_text: &str,
    ) -> Result<JsonValue> {
        let user_message = build_extract_message(instruction, schema, page_text);
        let response = self
            .send_to_llm(&user_message, Some(SYSTEM_MESSAGE))
            .await?;
        Ok(parse_extract_response(&response, schema)?)
    }
}

/// 构建字段抽取的用户消息
fn build_extract_message(instruction: &str, schema: FieldSchema, page_text: &str) -> String {
    format!(
        r#"指令：{}

返回格式：{{"value": <{}>}}
如果页面中没有该信息，返回 {{"value": null}}。

页面文本：
"""
{}
""""#,
        instruction,
        schema.describe(),
        page_text
    )
}

/// 解析 LLM 响应并校验字段格式
///
/// 兼容 ```json 代码块包裹的响应
fn parse_extract_response(response: &str, schema: FieldSchema) -> Result<JsonValue, LlmError> {
    let body = strip_code_fence(response);

    let parsed: JsonValue =
        serde_json::from_str(body).map_err(|e| LlmError::JsonParseFailed {
            response: response.to_string(),
            source: Box::new(e),
        })?;

    let value = parsed.get("value").cloned().unwrap_or(JsonValue::Null);
    if schema.accepts(&value) {
        Ok(value)
    } else {
        Err(LlmError::SchemaMismatch {
            expected: schema.describe().to_string(),
            value: value.to_string(),
        })
    }
}

fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_extract_response_text() {
        let value = parse_extract_response(r#"{"value": "We study X."}"#, FieldSchema::Text).unwrap();
        assert_eq!(value, json!("We study X."));
    }

    #[test]
    fn test_parse_extract_response_code_fence() {
        let response = "```json\n{\"value\": [\"Ada Lovelace\", \"Alan Turing\"]}\n```";
        let value = parse_extract_response(response, FieldSchema::TextList).unwrap();
        assert_eq!(value, json!(["Ada Lovelace", "Alan Turing"]));
    }

    #[test]
    fn test_parse_extract_response_schema_mismatch() {
        let err = parse_extract_response(r#"{"value": ["a"]}"#, FieldSchema::Text).unwrap_err();
        assert!(matches!(err, LlmError::SchemaMismatch { .. }));

        let err = parse_extract_response(r#"{"value": null}"#, FieldSchema::TextList).unwrap_err();
        assert!(matches!(err, LlmError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_parse_extract_response_not_json() {
        let err = parse_extract_response("摘要如下：……", FieldSchema::Text).unwrap_err();
        assert!(matches!(err, LlmError::JsonParseFailed { .. }));
    }

    #[test]
    fn test_build_extract_message_contains_schema() {
        let message = build_extract_message("提取摘要", FieldSchema::Text, "page body");
        assert!(message.contains("提取摘要"));
        assert!(message.contains("string"));
        assert!(message.contains("page body"));
    }
}
