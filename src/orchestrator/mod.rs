//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理浏览器资源（Browser、JsExecutor、ChromiumDriver）
//! - 写出结果文件和最终统计
//!
//! ### `batch_processor` - 批量论文处理器
//! - 提交检索、枚举结果
//! - 按顺序逐篇处理，汇总运行摘要
//!
//! ### `paper_processor` - 单篇论文处理器
//! - 提取详情页、规范化摘要、发出事件
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser)
//!     ↓
//! batch_processor (处理 Vec<PaperReference>)
//!     ↓
//! paper_processor (处理单篇论文)
//!     ↓
//! services (能力层：search / enumerate / extract / normalize)
//!     ↓
//! selectors (候选选择器解析)
//!     ↓
//! infrastructure (PageDriver)
//! ```

pub mod app;
pub mod batch_processor;
pub mod paper_processor;

pub use app::App;
pub use batch_processor::BatchOrchestrator;
pub use paper_processor::process_paper;
