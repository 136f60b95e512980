use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, AppResult};

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found";
pub const DATE_NOT_FOUND: &str = "Date not found";
pub const NOT_AVAILABLE: &str = "Not available";
pub const EXTRACTION_FAILED: &str = "Extraction Failed";
pub const CITATIONS_UNSUPPORTED: &str = "N/A";

/// 检索条件（不可变输入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub topic: String,
    pub year: Option<i32>,
    pub max_results: usize,
    pub max_abstract_length: usize,
}

impl SearchCriteria {
    /// 创建检索条件，`max_results` 必须 ≥ 1
    pub fn new(
        topic: impl Into<String>,
        year: Option<i32>,
        max_results: usize,
        max_abstract_length: usize,
    ) -> AppResult<Self> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(AppError::invalid_config("topic", "检索主题不能为空"));
        }
        if max_results < 1 {
            return Err(AppError::invalid_config("max_results", "必须大于等于 1"));
        }
        Ok(Self {
            topic,
            year,
            max_results,
            max_abstract_length,
        })
    }
}

/// 检索结果条目的轻量引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperReference {
    pub title: String,
    /// 详情页绝对地址
    pub detail_url: String,
}

impl PaperReference {
    /// 创建引用，相对链接按站点地址补全为绝对地址
    pub fn resolve(
        title: impl Into<String>,
        href: &str,
        origin: &Url,
    ) -> Result<Self, url::ParseError> {
        let detail_url = origin.join(href.trim())?;
        Ok(Self {
            title: title.into(),
            detail_url: detail_url.to_string(),
        })
    }
}

/// 最终输出的论文记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub submission_date: String,
    pub identifier: String,
    pub doi: String,
    pub citation_count: String,
}

impl PaperRecord {
    /// 提取开始时创建的空记录，字段随后逐个填充
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            submission_date: String::new(),
            identifier: String::new(),
            doi: NOT_AVAILABLE.to_string(),
            citation_count: CITATIONS_UNSUPPORTED.to_string(),
        }
    }

    /// 整页无法处理时的降级记录
    pub fn failed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            abstract_text: EXTRACTION_FAILED.to_string(),
            submission_date: EXTRACTION_FAILED.to_string(),
            identifier: EXTRACTION_FAILED.to_string(),
            doi: NOT_AVAILABLE.to_string(),
            citation_count: CITATIONS_UNSUPPORTED.to_string(),
        }
    }
}

/// 记录中的单个字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    Abstract,
    Authors,
    SubmissionDate,
    Identifier,
    Doi,
}

impl RecordField {
    pub fn name(self) -> &'static str {
        match self {
            RecordField::Abstract => "abstract",
            RecordField::Authors => "authors",
            RecordField::SubmissionDate => "submissionDate",
            RecordField::Identifier => "identifier",
            RecordField::Doi => "doi",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单篇论文的提取结果，两种情况都携带记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// 页面已处理，`degraded` 列出使用了占位值的字段
    Extracted {
        record: PaperRecord,
        degraded: Vec<RecordField>,
    },
    /// 页面本身无法处理，记录为整体降级
    PageFailed { record: PaperRecord, reason: String },
}

impl ExtractionOutcome {
    pub fn into_record(self) -> PaperRecord {
        match self {
            ExtractionOutcome::Extracted { record, .. } => record,
            ExtractionOutcome::PageFailed { record, .. } => record,
        }
    }

    pub fn is_page_failure(&self) -> bool {
        matches!(self, ExtractionOutcome::PageFailed { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted { degraded, .. } if !degraded.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_href() {
        let origin = Url::parse("https://arxiv.org").unwrap();
        let reference = PaperReference::resolve("T", "/abs/2401.00001", &origin).unwrap();
        assert_eq!(reference.detail_url, "https://arxiv.org/abs/2401.00001");
    }

    #[test]
    fn test_resolve_keeps_absolute_href() {
        let origin = Url::parse("https://arxiv.org").unwrap();
        let reference =
            PaperReference::resolve("T", " https://export.arxiv.org/abs/2401.00001v2 ", &origin)
                .unwrap();
        assert_eq!(reference.detail_url, "https://export.arxiv.org/abs/2401.00001v2");
    }

    #[test]
    fn test_failed_record_placeholders() {
        let record = PaperRecord::failed("Some title");
        assert_eq!(record.title, "Some title");
        assert!(record.authors.is_empty());
        assert_eq!(record.abstract_text, EXTRACTION_FAILED);
        assert_eq!(record.submission_date, EXTRACTION_FAILED);
        assert_eq!(record.identifier, EXTRACTION_FAILED);
        assert_eq!(record.doi, NOT_AVAILABLE);
        assert_eq!(record.citation_count, CITATIONS_UNSUPPORTED);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(PaperRecord::empty("T")).unwrap();
        assert!(json.get("submissionDate").is_some());
        assert!(json.get("citationCount").is_some());
        assert!(json.get("abstract").is_some());
    }

    #[test]
    fn test_criteria_invariants() {
        assert!(SearchCriteria::new("llm", None, 0, 100).is_err());
        assert!(SearchCriteria::new("  ", None, 1, 100).is_err());
        let criteria = SearchCriteria::new("llm", Some(2024), 1, 0).unwrap();
        assert_eq!(criteria.max_abstract_length, 0);
    }
}
