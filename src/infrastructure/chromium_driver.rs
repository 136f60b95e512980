//! 基于 chromiumoxide 的页面自动化实现

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, BrowserError};
use crate::infrastructure::page_driver::{FieldSchema, PageDriver, Scope};
use crate::infrastructure::JsExecutor;
use crate::services::LlmService;
use crate::utils::logging::truncate_text;

/// 发送给 LLM 的页面文本上限（字符数）
const PAGE_TEXT_LIMIT: usize = 12_000;

/// Chromium 页面驱动
///
/// 职责：
/// - 通过 JsExecutor 持有唯一的 Page
/// - 选择器查找直接使用 CDP 的 querySelectorAll
/// - 指令式抽取交给 LlmService
pub struct ChromiumDriver {
    executor: JsExecutor,
    llm_service: LlmService,
    page_load_timeout: Duration,
    screenshot_dir: PathBuf,
}

impl ChromiumDriver {
    pub fn new(executor: JsExecutor, config: &Config) -> Self {
        Self {
            executor,
            llm_service: LlmService::new(config),
            page_load_timeout: Duration::from_millis(config.page_load_timeout_ms),
            screenshot_dir: PathBuf::from(&config.screenshot_dir),
        }
    }

    /// 打开页面并等待内容就绪
    async fn load(&self, url: &str) -> Result<()> {
        let page = self.executor.page();
        page.goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        page.wait_for_navigation().await?;
        self.wait_until_ready().await
    }

    /// 等待 `document.readyState` 变为 complete
    async fn wait_until_ready(&self) -> Result<()> {
        loop {
            let state = self.executor.ready_state().await?;
            if state == "complete" {
                return Ok(());
            }
            debug!("页面状态: {}，继续等待", state);
            sleep(Duration::from_millis(200)).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        match timeout(self.page_load_timeout, self.load(url)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: self.page_load_timeout.as_millis() as u64,
            }
            .into()),
        }
    }

    async fn find_all(&self, scope: Scope<'_, Element>, selector: &str) -> Result<Vec<Element>> {
        let elements = match scope {
            Scope::Page => self.executor.page().find_elements(selector).await?,
            Scope::Within(element) => element.find_elements(selector).await?,
        };
        Ok(elements)
    }

    async fn text(&self, element: &Element) -> Result<Option<String>> {
        Ok(element.inner_text().await?)
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attribute(name).await?)
    }

    async fn extract(&self, instruction: &str, schema: FieldSchema) -> Result<JsonValue> {
        let page_text = self.executor.page_text().await?;
        let page_text = truncate_text(&page_text, PAGE_TEXT_LIMIT);
        debug!("指令式抽取: {} (页面文本 {} 字符)", instruction, page_text.chars().count());
        self.llm_service
            .extract_field(instruction, schema, &page_text)
            .await
    }

    async fn capture_state(&self, label: &str) -> Result<Option<String>> {
        tokio::fs::create_dir_all(&self.screenshot_dir)
            .await
            .with_context(|| format!("无法创建截图目录: {}", self.screenshot_dir.display()))?;

        let file_name = format!(
            "{}-{}.png",
            label,
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = self.screenshot_dir.join(file_name);

        self.executor
            .page()
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), &path)
            .await
            .map_err(|e| BrowserError::ScreenshotFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;

        info!("📸 已保存页面截图: {}", path.display());
        Ok(Some(path.display().to_string()))
    }
}
