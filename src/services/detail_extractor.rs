//! 详情页提取 - 业务能力层
//!
//! 打开单篇论文的详情页并逐个提取字段。每个字段的失败只影响该字段；
//! 只有页面本身无法打开时整条记录才降级。

use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::infrastructure::{FieldSchema, PageDriver, Scope};
use crate::models::paper::{
    ABSTRACT_NOT_FOUND, CITATIONS_UNSUPPORTED, DATE_NOT_FOUND, NOT_AVAILABLE,
};
use crate::models::{ExtractionOutcome, PaperRecord, PaperReference, RecordField};
use crate::selectors::{SelectorResolver, Target};
use crate::services::diagnostics::{Category, DiagnosticEvent, DiagnosticsSink};
use crate::services::normalizer::{
    clean_abstract, clean_authors, clean_submission_date, derive_identifier, split_authors,
};

const ABSTRACT_INSTRUCTION: &str =
    "Extract the full abstract of this paper as a single string, without the leading 'Abstract:' label.";

const AUTHORS_INSTRUCTION: &str =
    "Extract the list of author names of this paper, in the order they appear.";

/// 详情页提取器
pub struct DetailExtractor {
    resolver: SelectorResolver,
}

impl DetailExtractor {
    pub fn new(resolver: SelectorResolver) -> Self {
        Self { resolver }
    }

    /// 提取单篇论文，不返回错误
    pub async fn extract<D: PageDriver>(
        &self,
        driver: &D,
        reference: &PaperReference,
        sink: &dyn DiagnosticsSink,
    ) -> ExtractionOutcome {
        // 页面就绪之前不读取任何字段
        if let Err(e) = driver.navigate(&reference.detail_url).await {
            return ExtractionOutcome::PageFailed {
                record: PaperRecord::failed(reference.title.clone()),
                reason: e.to_string(),
            };
        }

        let mut record = PaperRecord::empty(reference.title.clone());
        let mut degraded = Vec::new();

        record.abstract_text = match self.abstract_text(driver, sink).await {
            Some(text) => text,
            None => {
                degraded.push(RecordField::Abstract);
                ABSTRACT_NOT_FOUND.to_string()
            }
        };

        record.authors = match self.authors(driver, sink).await {
            Some(authors) => authors,
            None => {
                degraded.push(RecordField::Authors);
                Vec::new()
            }
        };

        record.submission_date = match self.submission_date(driver, sink).await {
            Some(date) => date,
            None => {
                degraded.push(RecordField::SubmissionDate);
                DATE_NOT_FOUND.to_string()
            }
        };

        record.identifier = match derive_identifier(&reference.detail_url) {
            Some(identifier) => identifier,
            None => {
                emit_fallback(sink, RecordField::Identifier, "详情页地址没有路径段");
                degraded.push(RecordField::Identifier);
                NOT_AVAILABLE.to_string()
            }
        };

        record.doi = match self.doi(driver, sink).await {
            Some(doi) => doi,
            None => {
                degraded.push(RecordField::Doi);
                NOT_AVAILABLE.to_string()
            }
        };

        // 数据源不提供引用数
        record.citation_count = CITATIONS_UNSUPPORTED.to_string();

        ExtractionOutcome::Extracted { record, degraded }
    }

    /// 摘要：指令式抽取优先，选择器兜底
    async fn abstract_text<D: PageDriver>(
        &self,
        driver: &D,
        sink: &dyn DiagnosticsSink,
    ) -> Option<String> {
        match driver.extract(ABSTRACT_INSTRUCTION, FieldSchema::Text).await {
            Ok(JsonValue::String(text)) => {
                let text = clean_abstract(&text);
                if !text.is_empty() {
                    return Some(text);
                }
                emit_fallback(sink, RecordField::Abstract, "指令式抽取返回空摘要，改用选择器");
            }
            Ok(other) => emit_fallback(
                sink,
                RecordField::Abstract,
                &format!("指令式抽取返回非字符串 {}，改用选择器", other),
            ),
            Err(e) => emit_fallback(
                sink,
                RecordField::Abstract,
                &format!("指令式抽取失败: {}，改用选择器", e),
            ),
        }

        let text = self
            .selector_text(driver, Target::Abstract, sink)
            .await
            .map(|text| clean_abstract(&text))
            .filter(|text| !text.is_empty());
        if text.is_none() {
            emit_fallback(sink, RecordField::Abstract, "未找到摘要");
        }
        text
    }

    /// 作者：选择器优先，指令式抽取兜底
    async fn authors<D: PageDriver>(
        &self,
        driver: &D,
        sink: &dyn DiagnosticsSink,
    ) -> Option<Vec<String>> {
        if let Some(text) = self.selector_text(driver, Target::Authors, sink).await {
            let authors = split_authors(&text);
            if !authors.is_empty() {
                return Some(authors);
            }
        }

        emit_fallback(sink, RecordField::Authors, "作者选择器未命中，改用指令式抽取");

        let names = match driver
            .extract(AUTHORS_INSTRUCTION, FieldSchema::TextList)
            .await
            .and_then(|value| serde_json::from_value::<Vec<String>>(value).map_err(Into::into))
        {
            Ok(names) => clean_authors(names),
            Err(e) => {
                emit_fallback(sink, RecordField::Authors, &format!("指令式抽取失败: {}", e));
                return None;
            }
        };

        if names.is_empty() {
            emit_fallback(sink, RecordField::Authors, "指令式抽取没有返回作者");
            None
        } else {
            Some(names)
        }
    }

    async fn submission_date<D: PageDriver>(
        &self,
        driver: &D,
        sink: &dyn DiagnosticsSink,
    ) -> Option<String> {
        let date = self
            .selector_text(driver, Target::SubmissionDate, sink)
            .await
            .map(|text| clean_submission_date(&text))
            .filter(|date| !date.is_empty());
        if date.is_none() {
            emit_fallback(sink, RecordField::SubmissionDate, "未找到提交日期");
        }
        date
    }

    async fn doi<D: PageDriver>(&self, driver: &D, sink: &dyn DiagnosticsSink) -> Option<String> {
        let resolution = self
            .resolver
            .resolve(driver, Scope::Page, Target::DoiLink, sink)
            .await;

        let doi = match resolution.first() {
            Some(element) => driver.attribute(element, "href").await.ok().flatten(),
            None => None,
        }
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

        if doi.is_none() {
            debug!("详情页没有 DOI 链接");
            emit_fallback(sink, RecordField::Doi, "没有 DOI 链接");
        }
        doi
    }

    /// 解析目标并读取第一个命中元素的文本
    async fn selector_text<D: PageDriver>(
        &self,
        driver: &D,
        target: Target,
        sink: &dyn DiagnosticsSink,
    ) -> Option<String> {
        let resolution = self.resolver.resolve(driver, Scope::Page, target, sink).await;
        let element = resolution.first()?;
        match driver.text(element).await {
            Ok(text) => text,
            Err(e) => {
                emit_fallback_target(sink, target, &format!("读取文本失败: {}", e));
                None
            }
        }
    }
}

fn emit_fallback(sink: &dyn DiagnosticsSink, field: RecordField, message: &str) {
    sink.emit(
        DiagnosticEvent::new(Category::FieldFallback, format!("{}: {}", field, message))
            .with_payload(json!({ "field": field.name() })),
    );
}

fn emit_fallback_target(sink: &dyn DiagnosticsSink, target: Target, message: &str) {
    sink.emit(
        DiagnosticEvent::new(Category::FieldFallback, format!("{}: {}", target, message))
            .with_payload(json!({ "target": target.key() })),
    );
}
