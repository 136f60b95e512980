//! 内存页面，用于测试
//!
//! 每个 URL 对应一份 `MockDocument`。文档不解析真实 CSS，而是直接登记
//! "在某个范围内用某个选择器能查到哪些节点"。

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::infrastructure::page_driver::{FieldSchema, PageDriver, Scope};

/// 模拟元素句柄（文档内节点编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockElement(usize);

/// 模拟节点
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    text: Option<String>,
    attributes: HashMap<String, String>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new().text(text)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// 模拟页面文档
#[derive(Debug, Clone, Default)]
pub struct MockDocument {
    nodes: Vec<MockNode>,
    matches: HashMap<(Option<usize>, String), Vec<usize>>,
    failing_selectors: HashSet<String>,
    slow_selectors: HashMap<String, Duration>,
    extractions: HashMap<FieldSchema, JsonValue>,
}

impl MockDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个节点：在 `scope` 内用 `selector` 查找时会命中它
    pub fn add(
        &mut self,
        scope: Option<MockElement>,
        selector: &str,
        node: MockNode,
    ) -> MockElement {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.matches
            .entry((scope.map(|e| e.0), selector.to_string()))
            .or_default()
            .push(id);
        MockElement(id)
    }

    /// 让已有节点在另一个选择器下也能被查到
    pub fn alias(&mut self, scope: Option<MockElement>, selector: &str, element: MockElement) {
        self.matches
            .entry((scope.map(|e| e.0), selector.to_string()))
            .or_default()
            .push(element.0);
    }

    /// 查找该选择器时报错
    pub fn fail_selector(&mut self, selector: &str) {
        self.failing_selectors.insert(selector.to_string());
    }

    /// 查找该选择器时先等待 `delay`
    pub fn delay_selector(&mut self, selector: &str, delay: Duration) {
        self.slow_selectors.insert(selector.to_string(), delay);
    }

    /// 设置指令式抽取的返回值
    pub fn set_extraction(&mut self, schema: FieldSchema, value: JsonValue) {
        self.extractions.insert(schema, value);
    }
}

/// 模拟页面驱动
#[derive(Debug, Default)]
pub struct MockPage {
    documents: HashMap<String, MockDocument>,
    failing_urls: HashSet<String>,
    current: Mutex<Option<String>>,
    navigations: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    captures: Mutex<Vec<String>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记 URL 对应的文档
    pub fn with_document(mut self, url: impl Into<String>, document: MockDocument) -> Self {
        self.documents.insert(url.into(), document);
        self
    }

    /// 导航到该 URL 时失败
    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }

    /// 已导航过的 URL（按顺序）
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }

    /// 已执行过的选择器查询（按顺序）
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    /// 已保存的页面状态标签
    pub fn captures(&self) -> Vec<String> {
        lock(&self.captures).clone()
    }

    fn current_document(&self) -> Result<&MockDocument> {
        let current = lock(&self.current);
        let url = current.as_ref().ok_or_else(|| anyhow!("尚未导航到任何页面"))?;
        self.documents
            .get(url)
            .ok_or_else(|| anyhow!("页面没有登记文档: {}", url))
    }

    fn node(&self, element: &MockElement) -> Result<&MockNode> {
        self.current_document()?
            .nodes
            .get(element.0)
            .ok_or_else(|| anyhow!("节点不存在: {}", element.0))
    }
}

#[async_trait]
impl PageDriver for MockPage {
    type Element = MockElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        lock(&self.navigations).push(url.to_string());
        if self.failing_urls.contains(url) {
            bail!("导航到 {} 失败: net::ERR_CONNECTION_RESET", url);
        }
        *lock(&self.current) = Some(url.to_string());
        Ok(())
    }

    async fn find_all(
        &self,
        scope: Scope<'_, MockElement>,
        selector: &str,
    ) -> Result<Vec<MockElement>> {
        lock(&self.queries).push(selector.to_string());
        let document = self.current_document()?;
        if document.failing_selectors.contains(selector) {
            bail!("查找选择器 {} 超时", selector);
        }
        let scope_id = match scope {
            Scope::Page => None,
            Scope::Within(element) => Some(element.0),
        };
        let found: Vec<MockElement> = document
            .matches
            .get(&(scope_id, selector.to_string()))
            .map(|ids| ids.iter().copied().map(MockElement).collect())
            .unwrap_or_default();
        if let Some(delay) = document.slow_selectors.get(selector).copied() {
            tokio::time::sleep(delay).await;
        }
        Ok(found)
    }

    async fn text(&self, element: &MockElement) -> Result<Option<String>> {
        Ok(self.node(element)?.text.clone())
    }

    async fn attribute(&self, element: &MockElement, name: &str) -> Result<Option<String>> {
        Ok(self.node(element)?.attributes.get(name).cloned())
    }

    async fn extract(&self, instruction: &str, schema: FieldSchema) -> Result<JsonValue> {
        self.current_document()?
            .extractions
            .get(&schema)
            .cloned()
            .ok_or_else(|| anyhow!("指令式抽取失败: {}", instruction))
    }

    async fn capture_state(&self, label: &str) -> Result<Option<String>> {
        lock(&self.captures).push(label.to_string());
        Ok(Some(format!("mock://{}", label)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
