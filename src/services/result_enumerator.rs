//! 检索结果枚举 - 业务能力层
//!
//! 在检索结果页上定位结果条目，为前 `max_results` 个条目生成论文引用

use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::infrastructure::{PageDriver, Scope};
use crate::models::paper::TITLE_NOT_FOUND;
use crate::models::{PaperReference, RunStatus, SearchCriteria};
use crate::selectors::{Resolution, SelectorResolver, Target, DETAIL_PATH_MARKER};
use crate::services::diagnostics::{capture_page, Category, DiagnosticEvent, DiagnosticsSink};
use crate::services::normalizer::clean_title;

/// 枚举结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationOutcome {
    /// 按页面顺序排列的引用
    pub references: Vec<PaperReference>,
    /// 结果页状态；找到结果条目时为 `Completed`
    pub status: RunStatus,
}

impl EnumerationOutcome {
    pub fn empty(status: RunStatus) -> Self {
        Self {
            references: Vec::new(),
            status,
        }
    }
}

/// 检索结果枚举器
pub struct ResultEnumerator {
    resolver: SelectorResolver,
    origin: Url,
}

impl ResultEnumerator {
    pub fn new(resolver: SelectorResolver, origin: Url) -> Self {
        Self { resolver, origin }
    }

    /// 枚举当前检索结果页
    ///
    /// 结果条目一个都找不到时不报错，保存页面状态后返回空列表
    pub async fn enumerate<D: PageDriver>(
        &self,
        driver: &D,
        criteria: &SearchCriteria,
        sink: &dyn DiagnosticsSink,
    ) -> EnumerationOutcome {
        sink.emit(
            DiagnosticEvent::new(
                Category::EnumerationStart,
                format!("🔍 开始枚举检索结果 (主题: {})", criteria.topic),
            )
            .with_payload(json!({
                "topic": criteria.topic,
                "year": criteria.year,
                "maxResults": criteria.max_results,
            })),
        );

        let items = match self
            .resolver
            .resolve(driver, Scope::Page, Target::ResultItem, sink)
            .await
        {
            Resolution::Matched { elements, .. } => elements,
            Resolution::NotFound => return self.classify_empty_page(driver, sink).await,
        };

        info!(
            "✓ 找到 {} 个结果条目，处理前 {} 个",
            items.len(),
            items.len().min(criteria.max_results)
        );

        let mut references = Vec::new();
        for (index, item) in items.iter().take(criteria.max_results).enumerate() {
            match self.reference_for(driver, item, index + 1, sink).await {
                Some(reference) => {
                    debug!("[条目 {}] {} -> {}", index + 1, reference.title, reference.detail_url);
                    references.push(reference);
                }
                None => warn!("[条目 {}] ⚠️ 没有详情页链接，已跳过", index + 1),
            }
        }

        // 条目都在但一个链接都读不到，按结果页无法识别处理
        if references.is_empty() {
            sink.emit(
                DiagnosticEvent::new(
                    Category::FieldFallback,
                    format!("⚠️ {} 个结果条目都没有可用的详情页链接", items.len()),
                )
                .with_payload(json!({ "items": items.len(), "field": "detailUrl" })),
            );
            capture_page(driver, "links-unreadable", "结果条目没有详情页链接", sink).await;
            return EnumerationOutcome::empty(RunStatus::ResultsUnreadable);
        }

        EnumerationOutcome {
            references,
            status: RunStatus::Completed,
        }
    }

    /// 区分"站点明确提示无结果"和"结果页无法识别"
    async fn classify_empty_page<D: PageDriver>(
        &self,
        driver: &D,
        sink: &dyn DiagnosticsSink,
    ) -> EnumerationOutcome {
        let notice = self
            .resolver
            .resolve(driver, Scope::Page, Target::NoResultsNotice, sink)
            .await;

        if notice.is_found() {
            warn!("⚠️ 检索没有返回结果");
            capture_page(driver, "no-results", "检索没有返回结果", sink).await;
            EnumerationOutcome::empty(RunStatus::NoResults)
        } else {
            warn!("⚠️ 未能识别检索结果列表");
            capture_page(driver, "results-unreadable", "未能识别检索结果列表", sink).await;
            EnumerationOutcome::empty(RunStatus::ResultsUnreadable)
        }
    }

    /// 在单个结果条目内生成引用，找不到链接时返回 `None`
    async fn reference_for<D: PageDriver>(
        &self,
        driver: &D,
        item: &D::Element,
        index: usize,
        sink: &dyn DiagnosticsSink,
    ) -> Option<PaperReference> {
        let title = self.title_for(driver, item, index, sink).await;
        let href = self.link_for(driver, item, index, sink).await?;

        match PaperReference::resolve(title, &href, &self.origin) {
            Ok(reference) => Some(reference),
            Err(e) => {
                sink.emit(
                    DiagnosticEvent::new(
                        Category::FieldFallback,
                        format!("[条目 {}] 链接无法解析: {} ({})", index, href, e),
                    )
                    .with_payload(json!({ "index": index, "href": href })),
                );
                None
            }
        }
    }

    async fn title_for<D: PageDriver>(
        &self,
        driver: &D,
        item: &D::Element,
        index: usize,
        sink: &dyn DiagnosticsSink,
    ) -> String {
        let resolution = self
            .resolver
            .resolve(driver, Scope::Within(item), Target::ResultTitle, sink)
            .await;

        let title = match resolution.first() {
            Some(element) => driver.text(element).await.ok().flatten(),
            None => None,
        }
        .map(|text| clean_title(&text))
        .filter(|title| !title.is_empty());

        title.unwrap_or_else(|| {
            sink.emit(
                DiagnosticEvent::new(
                    Category::FieldFallback,
                    format!("[条目 {}] 未找到标题，使用占位值", index),
                )
                .with_payload(json!({ "index": index, "field": "title" })),
            );
            TITLE_NOT_FOUND.to_string()
        })
    }

    async fn link_for<D: PageDriver>(
        &self,
        driver: &D,
        item: &D::Element,
        index: usize,
        sink: &dyn DiagnosticsSink,
    ) -> Option<String> {
        let resolution = self
            .resolver
            .resolve(driver, Scope::Within(item), Target::DetailLink, sink)
            .await;

        if let Some(element) = resolution.first() {
            if let Some(href) = non_empty_href(driver, element).await {
                return Some(href);
            }
        }

        // 兜底：扫描条目内所有链接
        sink.emit(
            DiagnosticEvent::new(
                Category::FieldFallback,
                format!("[条目 {}] 详情链接选择器未命中，扫描条目内所有链接", index),
            )
            .with_payload(json!({ "index": index, "field": "detailUrl" })),
        );

        let anchors = self
            .resolver
            .resolve(driver, Scope::Within(item), Target::Anchor, sink)
            .await
            .into_elements();

        for anchor in &anchors {
            if let Some(href) = non_empty_href(driver, anchor).await {
                if href.contains(DETAIL_PATH_MARKER) {
                    return Some(href);
                }
            }
        }
        None
    }
}

async fn non_empty_href<D: PageDriver>(driver: &D, element: &D::Element) -> Option<String> {
    driver
        .attribute(element, "href")
        .await
        .ok()
        .flatten()
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}
