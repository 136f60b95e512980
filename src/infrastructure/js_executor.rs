//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::BrowserError;

/// 读取页面可见文本的脚本
const PAGE_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 Paper / Record
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| BrowserError::ScriptExecutionFailed {
                source: Box::new(e),
            })?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 读取当前页面的可见文本
    pub async fn page_text(&self) -> Result<String> {
        self.eval_as::<String>(PAGE_TEXT_JS).await
    }

    /// 读取 `document.readyState`
    pub async fn ready_state(&self) -> Result<String> {
        self.eval_as::<String>("document.readyState").await
    }
}
