//! 结果写入服务 - 业务能力层
//!
//! 只负责把一次运行的结果写成 JSON 文件

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{HarvestRun, PaperRecord, RunSummary, SearchCriteria};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputFile<'a> {
    generated_at: DateTime<Local>,
    criteria: &'a SearchCriteria,
    summary: &'a RunSummary,
    papers: &'a [PaperRecord],
}

/// 结果写入服务
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 写入结果，返回文件路径
    pub async fn write(&self, criteria: &SearchCriteria, run: &HarvestRun) -> AppResult<PathBuf> {
        let now = Local::now();
        let path = self
            .output_dir
            .join(format!("papers-{}.json", now.format("%Y%m%d-%H%M%S")));

        debug!("写入结果: {} 篇 -> {}", run.papers.len(), path.display());

        let body = render(criteria, run, now)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(display(&self.output_dir), e))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AppError::file_write_failed(display(&path), e))?;

        Ok(path)
    }
}

fn render(criteria: &SearchCriteria, run: &HarvestRun, now: DateTime<Local>) -> AppResult<String> {
    let file = OutputFile {
        generated_at: now,
        criteria,
        summary: &run.summary,
        papers: &run.papers,
    };
    serde_json::to_string_pretty(&file).map_err(|e| AppError::Other(e.to_string()))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunStatus, RunSummary};

    fn sample_run() -> HarvestRun {
        HarvestRun {
            papers: vec![PaperRecord::failed("A paper")],
            summary: RunSummary::new(RunStatus::Completed, Local::now()),
        }
    }

    #[test]
    fn test_render_layout() {
        let criteria = SearchCriteria::new("llm", Some(2024), 1, 300).unwrap();
        let body = render(&criteria, &sample_run(), Local::now()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["criteria"]["maxResults"], 1);
        assert_eq!(json["summary"]["status"], "completed");
        assert_eq!(json["papers"][0]["title"], "A paper");
        assert_eq!(json["papers"][0]["citationCount"], "N/A");
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let dir = std::env::temp_dir().join(format!("arxiv_harvest_test_{}", std::process::id()));
        let writer = ResultWriter::new(&dir);
        let criteria = SearchCriteria::new("llm", None, 1, 300).unwrap();

        let path = writer.write(&criteria, &sample_run()).await.unwrap();

        assert!(path.exists());
        assert!(path.starts_with(&dir));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
