//! 单篇论文处理器 - 编排层
//!
//! 提取详情页 → 截断摘要 → 发出成功/失败事件。
//! 始终返回一条记录，不向上抛出错误。

use serde_json::json;
use tracing::info;

use crate::infrastructure::PageDriver;
use crate::models::{ExtractionOutcome, PaperReference, RecordField, SearchCriteria};
use crate::services::diagnostics::{Category, DiagnosticEvent, DiagnosticsSink};
use crate::services::normalizer::normalize;
use crate::services::DetailExtractor;

/// 处理单篇论文
///
/// # 参数
/// - `paper_index`: 论文序号（从 1 开始，仅用于日志）
/// - `total`: 本次运行的论文总数（仅用于日志）
pub async fn process_paper<D: PageDriver>(
    extractor: &DetailExtractor,
    driver: &D,
    reference: &PaperReference,
    criteria: &SearchCriteria,
    paper_index: usize,
    total: usize,
    sink: &dyn DiagnosticsSink,
) -> ExtractionOutcome {
    info!("\n[论文 {}] {}", paper_index, "─".repeat(30));
    info!("[论文 {}] 处理第 {}/{} 篇: {}", paper_index, paper_index, total, reference.title);

    let mut outcome = extractor.extract(driver, reference, sink).await;

    // 占位值保持原样，只截断真正提取到的摘要
    if let ExtractionOutcome::Extracted { record, degraded } = &mut outcome {
        if !degraded.contains(&RecordField::Abstract) {
            record.abstract_text = normalize(&record.abstract_text, criteria.max_abstract_length);
        }
    }

    match &outcome {
        ExtractionOutcome::Extracted { degraded, .. } => {
            let message = if degraded.is_empty() {
                format!("[论文 {}] ✓ 提取完成", paper_index)
            } else {
                let fields: Vec<&str> = degraded.iter().map(|f| f.name()).collect();
                format!("[论文 {}] ✓ 提取完成，占位字段: {}", paper_index, fields.join(", "))
            };
            sink.emit(
                DiagnosticEvent::new(Category::PaperSucceeded, message).with_payload(json!({
                    "index": paper_index,
                    "url": reference.detail_url,
                    "degraded": degraded,
                })),
            );
        }
        ExtractionOutcome::PageFailed { reason, .. } => {
            sink.emit(
                DiagnosticEvent::new(
                    Category::PaperFailed,
                    format!("[论文 {}] ❌ 详情页无法处理: {}", paper_index, reason),
                )
                .with_payload(json!({
                    "index": paper_index,
                    "url": reference.detail_url,
                    "reason": reason,
                })),
            );
        }
    }

    outcome
}
