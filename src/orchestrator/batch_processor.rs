//! 批量论文处理器 - 编排层
//!
//! ## 职责
//!
//! 把一次检索变成有序的论文记录集合：
//!
//! ```text
//! Init → Enumerating → ResultsEmpty → Done
//!                    ↘ PerPaperLoop → Done
//! ```
//!
//! - **Enumerating**：提交检索并枚举结果条目
//! - **ResultsEmpty**：没有引用，直接结束
//! - **PerPaperLoop**：按枚举顺序逐篇处理，单篇失败不影响后续
//! - **Done**：记录总耗时和成功/降级/失败数量
//!
//! 整个过程严格串行，只使用一个页面。

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Local;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::PageDriver;
use crate::models::{ExtractionOutcome, HarvestRun, PaperRecord, RunStatus, RunSummary, SearchCriteria};
use crate::orchestrator::paper_processor::process_paper;
use crate::selectors::SelectorResolver;
use crate::services::diagnostics::{capture_page, Category, DiagnosticEvent, DiagnosticsSink};
use crate::services::{DetailExtractor, EnumerationOutcome, ResultEnumerator, SearchService};
use crate::utils::logging::log_references_found;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HarvestState {
    Init,
    Enumerating,
    ResultsEmpty,
    PerPaperLoop,
    Done,
}

impl fmt::Display for HarvestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HarvestState::Init => "Init",
            HarvestState::Enumerating => "Enumerating",
            HarvestState::ResultsEmpty => "ResultsEmpty",
            HarvestState::PerPaperLoop => "PerPaperLoop",
            HarvestState::Done => "Done",
        };
        f.write_str(name)
    }
}

fn transition(from: HarvestState, to: HarvestState) -> HarvestState {
    debug!("状态: {} → {}", from, to);
    to
}

/// 逐篇处理时累积的统计
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    succeeded: usize,
    degraded: usize,
    failed: usize,
}

impl Tally {
    fn record(mut self, outcome: &ExtractionOutcome) -> Self {
        if outcome.is_page_failure() {
            self.failed += 1;
        } else if outcome.is_degraded() {
            self.degraded += 1;
        } else {
            self.succeeded += 1;
        }
        self
    }
}

/// 批量论文处理器
pub struct BatchOrchestrator {
    search: SearchService,
    enumerator: ResultEnumerator,
    extractor: DetailExtractor,
}

impl BatchOrchestrator {
    pub fn new(origin: Url, selector_timeout: Duration) -> Self {
        let resolver = SelectorResolver::new(selector_timeout);
        Self {
            search: SearchService::new(origin.clone()),
            enumerator: ResultEnumerator::new(resolver, origin),
            extractor: DetailExtractor::new(resolver),
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let origin = Url::parse(&config.site_origin)
            .map_err(|e| AppError::invalid_config("site_origin", e.to_string()))?;
        Ok(Self::new(
            origin,
            Duration::from_millis(config.selector_timeout_ms),
        ))
    }

    /// 执行一次完整运行，总是返回结果（可能为空或含降级记录）
    pub async fn run<D: PageDriver>(
        &self,
        driver: &D,
        criteria: &SearchCriteria,
        sink: &dyn DiagnosticsSink,
    ) -> HarvestRun {
        let started_at = Local::now();
        let timer = Instant::now();
        let state = HarvestState::Init;

        let state = transition(state, HarvestState::Enumerating);
        let enumeration = self.enumerate(driver, criteria, sink).await;

        let (papers, summary) = if enumeration.references.is_empty() {
            let state = transition(state, HarvestState::ResultsEmpty);
            transition(state, HarvestState::Done);
            (Vec::new(), RunSummary::new(enumeration.status, started_at))
        } else {
            let state = transition(state, HarvestState::PerPaperLoop);
            let total = enumeration.references.len();
            log_references_found(total, criteria.max_results);

            let (papers, tally) = stream::iter(enumeration.references.into_iter().enumerate())
                .fold(
                    (Vec::with_capacity(total), Tally::default()),
                    |(mut papers, tally): (Vec<PaperRecord>, Tally), (index, reference)| async move {
                        let outcome = process_paper(
                            &self.extractor,
                            driver,
                            &reference,
                            criteria,
                            index + 1,
                            total,
                            sink,
                        )
                        .await;
                        let tally = tally.record(&outcome);
                        papers.push(outcome.into_record());
                        (papers, tally)
                    },
                )
                .await;

            transition(state, HarvestState::Done);
            let mut summary = RunSummary::new(enumeration.status, started_at);
            summary.processed = papers.len();
            summary.succeeded = tally.succeeded;
            summary.degraded = tally.degraded;
            summary.failed = tally.failed;
            (papers, summary)
        };

        let mut summary = summary;
        summary.elapsed = timer.elapsed();

        sink.emit(
            DiagnosticEvent::new(Category::RunComplete, format!("📊 {}", summary))
                .with_payload(serde_json::to_value(&summary).unwrap_or_else(|_| json!({}))),
        );

        HarvestRun { papers, summary }
    }

    /// 提交检索并枚举结果；检索页打不开按"结果页无法识别"处理
    async fn enumerate<D: PageDriver>(
        &self,
        driver: &D,
        criteria: &SearchCriteria,
        sink: &dyn DiagnosticsSink,
    ) -> EnumerationOutcome {
        if let Err(e) = self.search.submit(driver, criteria).await {
            warn!("⚠️ 检索提交失败: {}", e);
            capture_page(driver, "search-failed", "检索提交失败", sink).await;
            return EnumerationOutcome::empty(RunStatus::ResultsUnreadable);
        }
        self.enumerator.enumerate(driver, criteria, sink).await
    }
}
