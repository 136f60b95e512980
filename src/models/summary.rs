use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::paper::PaperRecord;

/// 运行结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// 至少找到一篇论文并完成遍历
    Completed,
    /// 站点明确提示没有检索结果
    NoResults,
    /// 检索页无法识别（结果列表和空结果提示都未命中）
    ResultsUnreadable,
}

/// 一次运行的汇总信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub started_at: DateTime<Local>,
    pub processed: usize,
    /// 所有字段均正常提取
    pub succeeded: usize,
    /// 页面已处理但部分字段为占位值
    pub degraded: usize,
    /// 整页降级
    pub failed: usize,
    #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(status: RunStatus, started_at: DateTime<Local>) -> Self {
        Self {
            status,
            started_at,
            processed: 0,
            succeeded: 0,
            degraded: 0,
            failed: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            RunStatus::Completed => "完成",
            RunStatus::NoResults => "没有检索结果",
            RunStatus::ResultsUnreadable => "检索结果页无法识别",
        };
        write!(
            f,
            "{}: 处理 {} 篇, 完整 {}, 部分降级 {}, 失败 {}, 耗时 {:.1}s",
            status,
            self.processed,
            self.succeeded,
            self.degraded,
            self.failed,
            self.elapsed.as_secs_f64()
        )
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// 一次运行的全部产出
#[derive(Debug, Clone, Serialize)]
pub struct HarvestRun {
    pub papers: Vec<PaperRecord>,
    pub summary: RunSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_counts() {
        let mut summary = RunSummary::new(RunStatus::Completed, Local::now());
        summary.processed = 4;
        summary.succeeded = 2;
        summary.degraded = 1;
        summary.failed = 1;
        summary.elapsed = Duration::from_millis(2500);
        assert_eq!(
            summary.to_string(),
            "完成: 处理 4 篇, 完整 2, 部分降级 1, 失败 1, 耗时 2.5s"
        );
    }

    #[test]
    fn test_elapsed_serialized_as_millis() {
        let mut summary = RunSummary::new(RunStatus::NoResults, Local::now());
        summary.elapsed = Duration::from_millis(1234);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["elapsedMs"], 1234);
        assert_eq!(json["status"], "noResults");
    }
}
