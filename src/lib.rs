//! # arXiv Harvest
//!
//! 按主题检索 arXiv 并逐篇采集论文元数据的 Rust 应用程序
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面自动化能力（导航、查找、读取、抽取、截图）
//! - `ChromiumDriver` / `MockPage` - 真实浏览器与内存页面两种实现
//!
//! ### ② 选择器层（Selectors）
//! - `selectors/` - 语义目标到候选选择器的映射，以及按序回退的解析器
//!
//! ### ③ 业务能力层（Services）
//! - `SearchService` - 提交检索
//! - `ResultEnumerator` - 枚举结果条目
//! - `DetailExtractor` - 提取详情页字段
//! - `normalizer` - 文本规范化
//! - `diagnostics` - 诊断事件
//! - `ResultWriter` - 写结果文件
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 资源管理
//! - `orchestrator/batch_processor` - 一次运行的状态流转
//! - `orchestrator/paper_processor` - 单篇论文处理

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod selectors;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumDriver, JsExecutor, PageDriver};
pub use models::{HarvestRun, PaperRecord, PaperReference, RunStatus, RunSummary, SearchCriteria};
pub use orchestrator::{App, BatchOrchestrator};
