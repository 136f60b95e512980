//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{RunStatus, RunSummary, SearchCriteria};

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。
/// 重复初始化时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arxiv_harvest={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    fs::write(log_file_path, log_header(chrono::Local::now()))?;
    Ok(())
}

fn log_header(now: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}\n论文采集日志 - {}\n{}\n\n",
        "=".repeat(60),
        now.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    )
}

/// 记录程序启动信息
pub fn log_startup(criteria: &SearchCriteria) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 论文采集模式");
    info!("🔎 检索主题: {}", criteria.topic);
    match criteria.year {
        Some(year) => info!("📅 年份: {}", year),
        None => info!("📅 年份: 不限"),
    }
    info!("📊 最多处理: {} 篇", criteria.max_results);
    info!("{}", "=".repeat(60));
}

/// 记录枚举到的论文数量
pub fn log_references_found(total: usize, max_results: usize) {
    info!("✓ 找到 {} 篇待处理的论文（上限 {}）", total, max_results);
    info!("💡 逐篇处理，单篇失败不影响后续\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 运行摘要
/// - `output_path`: 结果文件路径（写入失败时为空）
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &RunSummary, output_path: Option<&str>, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    match summary.status {
        RunStatus::Completed => {}
        RunStatus::NoResults => info!("ℹ️ 检索没有返回结果"),
        RunStatus::ResultsUnreadable => info!("⚠️ 未能识别检索结果页"),
    }
    info!("✅ 完整: {}/{}", summary.succeeded, summary.processed);
    info!("⚠️ 部分降级: {}", summary.degraded);
    info!("❌ 失败: {}", summary.failed);
    info!("⏱️ 耗时: {:.1}s", summary.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    if let Some(path) = output_path {
        info!("\n结果已保存至: {}", path);
    }
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("abc", 3), "abc");
        assert_eq!(truncate_text("量子计算", 2), "量子...");
    }

    #[test]
    fn test_log_header_contains_title() {
        let header = log_header(chrono::Local::now());
        assert!(header.starts_with(&"=".repeat(60)));
        assert!(header.contains("论文采集日志"));
    }
}
