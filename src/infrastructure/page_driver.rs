//! 页面自动化能力接口
//!
//! 核心流程只通过这个 trait 访问页面：导航、按选择器查找元素、读取文本和属性、
//! 指令式抽取以及失败时保存页面状态。

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// 元素查找范围
pub enum Scope<'a, E> {
    /// 整个页面
    Page,
    /// 只在某个元素的子树内查找
    Within(&'a E),
}

impl<E> Clone for Scope<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Scope<'_, E> {}

/// 指令式抽取的字段格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSchema {
    /// 单个字符串
    Text,
    /// 字符串列表
    TextList,
}

impl FieldSchema {
    pub fn describe(self) -> &'static str {
        match self {
            FieldSchema::Text => "string",
            FieldSchema::TextList => "array of strings",
        }
    }

    /// 判断值是否符合格式
    pub fn accepts(self, value: &JsonValue) -> bool {
        match self {
            FieldSchema::Text => value.is_string(),
            FieldSchema::TextList => value
                .as_array()
                .map(|items| items.iter().all(JsonValue::is_string))
                .unwrap_or(false),
        }
    }
}

/// 页面自动化能力
///
/// 实现方持有唯一的浏览会话；调用方严格串行调用，不做并发。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 元素句柄
    type Element: Send + Sync;

    /// 导航到 URL 并等待页面内容就绪
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 在范围内按选择器查找元素，没有命中时返回空列表
    async fn find_all(
        &self,
        scope: Scope<'_, Self::Element>,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// 读取元素可见文本
    async fn text(&self, element: &Self::Element) -> Result<Option<String>>;

    /// 读取元素属性
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// 按自然语言指令抽取字段，返回值符合 `schema`
    async fn extract(&self, instruction: &str, schema: FieldSchema) -> Result<JsonValue>;

    /// 保存当前页面状态用于排查，返回保存位置
    async fn capture_state(&self, label: &str) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_accepts() {
        assert!(FieldSchema::Text.accepts(&json!("abc")));
        assert!(!FieldSchema::Text.accepts(&json!(null)));
        assert!(FieldSchema::TextList.accepts(&json!(["a", "b"])));
        assert!(FieldSchema::TextList.accepts(&json!([])));
        assert!(!FieldSchema::TextList.accepts(&json!(["a", 1])));
    }
}
