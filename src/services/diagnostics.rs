//! 诊断事件 - 业务能力层
//!
//! 核心流程只负责发出结构化事件，不关心事件如何展示或保存

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::infrastructure::PageDriver;

/// 事件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 开始枚举检索结果
    EnumerationStart,
    /// 单个候选选择器的尝试
    SelectorAttempt,
    /// 字段改用兜底路径或占位值
    FieldFallback,
    /// 单篇论文提取完成
    PaperSucceeded,
    /// 单篇论文整页降级
    PaperFailed,
    /// 保存了页面状态
    Capture,
    /// 运行结束
    RunComplete,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::EnumerationStart => "enumeration_start",
            Category::SelectorAttempt => "selector_attempt",
            Category::FieldFallback => "field_fallback",
            Category::PaperSucceeded => "paper_succeeded",
            Category::PaperFailed => "paper_failed",
            Category::Capture => "capture",
            Category::RunComplete => "run_complete",
        };
        f.write_str(name)
    }
}

/// 诊断事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    pub category: Category,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

impl DiagnosticEvent {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// 诊断事件接收方
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// 把事件写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        let payload = event
            .payload
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default();
        match event.category {
            Category::SelectorAttempt => {
                debug!(category = %event.category, payload = %payload, "{}", event.message)
            }
            Category::FieldFallback | Category::Capture => {
                warn!(category = %event.category, payload = %payload, "{}", event.message)
            }
            Category::PaperFailed => {
                error!(category = %event.category, payload = %payload, "{}", event.message)
            }
            Category::EnumerationStart | Category::PaperSucceeded | Category::RunComplete => {
                info!(category = %event.category, "{}", event.message)
            }
        }
    }
}

/// 把事件保存在内存中，便于测试断言
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, category: Category) -> usize {
        self.events()
            .iter()
            .filter(|e| e.category == category)
            .count()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// 保存当前页面状态并发出事件，保存失败只记日志
pub async fn capture_page<D: PageDriver>(
    driver: &D,
    label: &str,
    reason: &str,
    sink: &dyn DiagnosticsSink,
) -> Option<String> {
    match driver.capture_state(label).await {
        Ok(location) => {
            let mut event = DiagnosticEvent::new(
                Category::Capture,
                format!("{}，已保存页面状态: {}", reason, label),
            );
            if let Some(location) = &location {
                event = event.with_payload(serde_json::json!({ "location": location }));
            }
            sink.emit(event);
            location
        }
        Err(e) => {
            warn!("保存页面状态失败 ({}): {}", label, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(DiagnosticEvent::new(Category::EnumerationStart, "start"));
        sink.emit(
            DiagnosticEvent::new(Category::PaperFailed, "paper 2")
                .with_payload(json!({ "index": 2 })),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category, Category::EnumerationStart);
        assert_eq!(events[1].payload, Some(json!({ "index": 2 })));
        assert_eq!(sink.count(Category::PaperFailed), 1);
    }

    #[test]
    fn test_event_serialization_skips_empty_payload() {
        let json = serde_json::to_value(DiagnosticEvent::new(Category::Capture, "x")).unwrap();
        assert_eq!(json["category"], "capture");
        assert!(json.get("payload").is_none());
    }
}
