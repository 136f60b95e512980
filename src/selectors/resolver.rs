//! 选择器解析器
//!
//! 按顺序尝试候选选择器，第一个命中至少一个元素的候选胜出，之后的候选不再尝试。
//! 候选查找报错或超时按"没有命中"处理，继续尝试下一个。

use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use crate::infrastructure::{PageDriver, Scope};
use crate::selectors::Target;
use crate::services::diagnostics::{Category, DiagnosticEvent, DiagnosticsSink};

/// 解析结果
#[derive(Debug)]
pub enum Resolution<E> {
    /// 命中的候选及其元素（至少一个）
    Matched { selector: String, elements: Vec<E> },
    /// 所有候选都没有命中
    NotFound,
}

impl<E> Resolution<E> {
    /// 第一个命中的元素
    pub fn first(&self) -> Option<&E> {
        match self {
            Resolution::Matched { elements, .. } => elements.first(),
            Resolution::NotFound => None,
        }
    }

    pub fn into_elements(self) -> Vec<E> {
        match self {
            Resolution::Matched { elements, .. } => elements,
            Resolution::NotFound => Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }
}

/// 选择器解析器
#[derive(Debug, Clone, Copy)]
pub struct SelectorResolver {
    deadline: Duration,
}

impl SelectorResolver {
    /// `deadline` 为单个候选的查找时限
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// 解析语义目标
    pub async fn resolve<D: PageDriver>(
        &self,
        driver: &D,
        scope: Scope<'_, D::Element>,
        target: Target,
        sink: &dyn DiagnosticsSink,
    ) -> Resolution<D::Element> {
        self.resolve_candidates(driver, scope, target.key(), target.candidates(), sink)
            .await
    }

    /// 按顺序尝试一组候选选择器
    pub async fn resolve_candidates<D: PageDriver>(
        &self,
        driver: &D,
        scope: Scope<'_, D::Element>,
        label: &str,
        candidates: &[&str],
        sink: &dyn DiagnosticsSink,
    ) -> Resolution<D::Element> {
        for (rank, selector) in candidates.iter().enumerate() {
            let outcome = match timeout(self.deadline, driver.find_all(scope, selector)).await {
                Ok(Ok(elements)) if !elements.is_empty() => {
                    emit_attempt(sink, label, rank, selector, "matched", Some(elements.len()));
                    return Resolution::Matched {
                        selector: selector.to_string(),
                        elements,
                    };
                }
                Ok(Ok(_)) => "empty".to_string(),
                Ok(Err(e)) => format!("error: {}", e),
                Err(_) => format!("timeout after {}ms", self.deadline.as_millis()),
            };
            emit_attempt(sink, label, rank, selector, &outcome, None);
        }
        Resolution::NotFound
    }
}

fn emit_attempt(
    sink: &dyn DiagnosticsSink,
    label: &str,
    rank: usize,
    selector: &str,
    outcome: &str,
    count: Option<usize>,
) {
    sink.emit(
        DiagnosticEvent::new(
            Category::SelectorAttempt,
            format!("{} 候选 #{} `{}`: {}", label, rank + 1, selector, outcome),
        )
        .with_payload(json!({
            "target": label,
            "rank": rank,
            "selector": selector,
            "outcome": outcome,
            "count": count,
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MockDocument, MockNode, MockPage};
    use crate::services::diagnostics::RecordingSink;

    const URL: &str = "https://arxiv.org/search";

    fn resolver() -> SelectorResolver {
        SelectorResolver::new(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_first_matching_candidate_wins() {
        let mut doc = MockDocument::new();
        doc.add(None, "b", MockNode::with_text("from b"));
        doc.add(None, "c", MockNode::with_text("from c"));
        let page = MockPage::new().with_document(URL, doc);
        page.navigate(URL).await.unwrap();
        let sink = RecordingSink::new();

        let resolution = resolver()
            .resolve_candidates(&page, Scope::Page, "t", &["a", "b", "c"], &sink)
            .await;

        match &resolution {
            Resolution::Matched { selector, elements } => {
                assert_eq!(selector, "b");
                assert_eq!(elements.len(), 1);
            }
            Resolution::NotFound => panic!("应该命中 b"),
        }
        // 命中后不再尝试 c
        assert_eq!(page.queries(), vec!["a", "b"]);
        assert_eq!(sink.count(Category::SelectorAttempt), 2);
    }

    #[tokio::test]
    async fn test_erroring_candidate_counts_as_miss() {
        let mut doc = MockDocument::new();
        doc.fail_selector("a");
        doc.add(None, "b", MockNode::with_text("ok"));
        let page = MockPage::new().with_document(URL, doc);
        page.navigate(URL).await.unwrap();
        let sink = RecordingSink::new();

        let resolution = resolver()
            .resolve_candidates(&page, Scope::Page, "t", &["a", "b"], &sink)
            .await;

        assert!(resolution.is_found());
        let first = sink.events().into_iter().next().unwrap();
        assert!(first.message.contains("error"));
    }

    #[tokio::test]
    async fn test_slow_candidate_counts_as_miss() {
        let mut doc = MockDocument::new();
        doc.add(None, "a", MockNode::with_text("too late"));
        doc.delay_selector("a", Duration::from_millis(500));
        doc.add(None, "b", MockNode::with_text("in time"));
        let page = MockPage::new().with_document(URL, doc);
        page.navigate(URL).await.unwrap();
        let sink = RecordingSink::new();

        let resolution = SelectorResolver::new(Duration::from_millis(50))
            .resolve_candidates(&page, Scope::Page, "t", &["a", "b"], &sink)
            .await;

        match &resolution {
            Resolution::Matched { selector, .. } => assert_eq!(selector, "b"),
            Resolution::NotFound => panic!("应该命中 b"),
        }
        assert_eq!(page.queries(), vec!["a", "b"]);
        let first = sink.events().into_iter().next().unwrap();
        assert!(first.message.contains("timeout after 50ms"));
    }

    #[tokio::test]
    async fn test_all_candidates_miss() {
        let page = MockPage::new().with_document(URL, MockDocument::new());
        page.navigate(URL).await.unwrap();
        let sink = RecordingSink::new();

        let resolution = resolver()
            .resolve_candidates(&page, Scope::Page, "t", &["a", "b"], &sink)
            .await;

        assert!(!resolution.is_found());
        assert!(resolution.first().is_none());
        assert_eq!(page.queries(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_lookup_is_scoped() {
        let mut doc = MockDocument::new();
        let first = doc.add(None, "li", MockNode::new());
        let second = doc.add(None, "li", MockNode::new());
        doc.add(Some(second), ".title", MockNode::with_text("second"));
        let page = MockPage::new().with_document(URL, doc);
        page.navigate(URL).await.unwrap();
        let sink = RecordingSink::new();

        let in_first = resolver()
            .resolve_candidates(&page, Scope::Within(&first), "t", &[".title"], &sink)
            .await;
        let in_second = resolver()
            .resolve_candidates(&page, Scope::Within(&second), "t", &[".title"], &sink)
            .await;

        assert!(!in_first.is_found());
        let element = in_second.first().unwrap();
        assert_eq!(page.text(element).await.unwrap().as_deref(), Some("second"));
    }
}
