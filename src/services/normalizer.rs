//! 字段规范化 - 业务能力层
//!
//! 文本清理（去标签前缀、去空白）和按字符数截断，全部是纯函数

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// 截断后追加的省略标记
pub const ELLIPSIS: &str = "...";

/// 未带版本号的标识符前缀
pub const IDENTIFIER_SCHEME: &str = "arXiv:";

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v\d+$").expect("版本号正则"));

static SUBMITTED_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)submitted on\s+([^()\[\]]+)").expect("提交日期正则"));

/// 截断摘要
///
/// 字符数超过 `max_len` 时硬截断到 `max_len` 个字符并追加 `...`，不考虑词边界；
/// 否则原样返回。对自身输出使用同一上限再次调用结果不变。
pub fn normalize(raw: &str, max_len: usize) -> String {
    if raw.chars().count() > max_len {
        raw.chars().take(max_len).collect::<String>() + ELLIPSIS
    } else {
        raw.to_string()
    }
}

/// 去掉开头的标签（不区分大小写）和首尾空白
pub fn strip_label(text: &str, label: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => trimmed[label.len()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// 合并连续空白为单个空格
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 清理标题：去 `Title:` 前缀、合并空白
pub fn clean_title(text: &str) -> String {
    collapse_whitespace(&strip_label(text, "Title:"))
}

/// 清理摘要：去 `Abstract:` 前缀、合并空白
pub fn clean_abstract(text: &str) -> String {
    collapse_whitespace(&strip_label(text, "Abstract:"))
}

/// 拆分作者文本：去 `Authors:` 前缀，按逗号拆分，去空白，丢弃空项
pub fn split_authors(text: &str) -> Vec<String> {
    strip_label(text, "Authors:")
        .split(',')
        .map(collapse_whitespace)
        .filter(|name| !name.is_empty())
        .collect()
}

/// 清理作者列表（指令式抽取的结果）
pub fn clean_authors(names: Vec<String>) -> Vec<String> {
    names
        .iter()
        .map(|name| collapse_whitespace(name))
        .filter(|name| !name.is_empty())
        .collect()
}

/// 清理提交日期：优先取 `Submitted on ...` 中的日期
pub fn clean_submission_date(text: &str) -> String {
    if let Some(date) = SUBMITTED_ON
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|date| !date.is_empty())
    {
        return date.to_string();
    }
    collapse_whitespace(text.trim().trim_start_matches('[').trim_end_matches(']'))
}

/// 由详情页 URL 的最后一段路径推导标识符
///
/// 带版本号（如 `2401.00001v2`）时原样使用，否则加上 `arXiv:` 前缀。
/// URL 没有路径段时返回 `None`。
pub fn derive_identifier(detail_url: &str) -> Option<String> {
    let segment = match Url::parse(detail_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => detail_url
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string),
    }?;

    if VERSION_SUFFIX.is_match(&segment) {
        Some(segment)
    } else {
        Some(format!("{}{}", IDENTIFIER_SCHEME, segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_short_text_unchanged() {
        assert_eq!(normalize("short", 10), "short");
        assert_eq!(normalize("exact", 5), "exact");
        assert_eq!(normalize("", 0), "");
    }

    #[test]
    fn test_normalize_truncates_to_bound_plus_ellipsis() {
        let raw = "a".repeat(450);
        let out = normalize(&raw, 300);
        assert_eq!(out.chars().count(), 303);
        assert!(out.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_normalize_is_not_word_aware() {
        assert_eq!(normalize("hello world", 7), "hello w...");
    }

    #[test]
    fn test_normalize_idempotent_on_own_output() {
        let once = normalize(&"x".repeat(50), 20);
        assert_eq!(normalize(&once, 20), once);
    }

    #[test]
    fn test_normalize_counts_chars_not_bytes() {
        let out = normalize("量子计算与机器学习", 4);
        assert_eq!(out, "量子计算...");
    }

    #[test]
    fn test_normalize_zero_bound() {
        assert_eq!(normalize("abc", 0), "...");
    }

    #[test]
    fn test_strip_label_case_insensitive() {
        assert_eq!(strip_label("  TITLE:  Attention  ", "Title:"), "Attention");
        assert_eq!(strip_label("title:x", "Title:"), "x");
        assert_eq!(strip_label("Entitled: x", "Title:"), "Entitled: x");
        assert_eq!(strip_label("短", "Title:"), "短");
    }

    #[test]
    fn test_clean_abstract() {
        assert_eq!(
            clean_abstract("Abstract:  We   study\n  transformers."),
            "We study transformers."
        );
    }

    #[test]
    fn test_split_authors() {
        assert_eq!(
            split_authors("Authors: Ada Lovelace,  Alan Turing , ,Grace\nHopper,"),
            vec!["Ada Lovelace", "Alan Turing", "Grace Hopper"]
        );
        assert!(split_authors(" , ").is_empty());
    }

    #[test]
    fn test_clean_submission_date() {
        assert_eq!(
            clean_submission_date("[Submitted on 12 Jan 2024 (v1), last revised 3 Feb 2024 (this version, v2)]"),
            "12 Jan 2024"
        );
        assert_eq!(clean_submission_date(" [2024-01-12] "), "2024-01-12");
    }

    #[test]
    fn test_derive_identifier() {
        assert_eq!(
            derive_identifier("https://arxiv.org/abs/2401.00001v2").as_deref(),
            Some("2401.00001v2")
        );
        assert_eq!(
            derive_identifier("https://arxiv.org/abs/2401.00001").as_deref(),
            Some("arXiv:2401.00001")
        );
        assert_eq!(
            derive_identifier("https://arxiv.org/abs/2401.00001/").as_deref(),
            Some("arXiv:2401.00001")
        );
        assert_eq!(derive_identifier("https://arxiv.org/"), None);
    }
}
