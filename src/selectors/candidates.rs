//! 选择器候选表
//!
//! 每个语义目标对应一组按可靠程度递减排列的候选选择器。
//! 这是静态配置，运行时不修改。

use std::fmt;

use phf::phf_map;

const RESULT_ITEM: &[&str] = &[
    "li.arxiv-result",
    "ol.breathe-horizontal > li",
    "[class*='arxiv-result']",
];

const RESULT_TITLE: &[&str] = &["p.title", ".title", "[class*='title']"];

const DETAIL_LINK: &[&str] = &[
    "p.list-title a[href*='/abs/']",
    ".list-title a",
    "a[href*='arxiv.org/abs/']",
];

const NO_RESULTS_NOTICE: &[&str] = &["p.is-size-4.has-text-warning", "[class*='no-results']"];

const ABSTRACT: &[&str] = &["blockquote.abstract", "#abs .abstract", "[class*='abstract']"];

const AUTHORS: &[&str] = &["div.authors", ".authors", "[class*='author']"];

const SUBMISSION_DATE: &[&str] = &["div.dateline", ".dateline", ".submission-history"];

const DOI_LINK: &[&str] = &["td.doi a", "a[href*='doi.org']", "a[data-doi]"];

const ANCHOR: &[&str] = &["a"];

static CANDIDATES: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "result_item" => RESULT_ITEM,
    "result_title" => RESULT_TITLE,
    "detail_link" => DETAIL_LINK,
    "no_results_notice" => NO_RESULTS_NOTICE,
    "abstract" => ABSTRACT,
    "authors" => AUTHORS,
    "submission_date" => SUBMISSION_DATE,
    "doi_link" => DOI_LINK,
    "anchor" => ANCHOR,
};

/// 详情页链接中的路径标记
pub const DETAIL_PATH_MARKER: &str = "/abs/";

/// 需要定位的语义目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// 检索结果条目
    ResultItem,
    /// 条目内标题
    ResultTitle,
    /// 条目内详情页链接
    DetailLink,
    /// 站点的"没有结果"提示
    NoResultsNotice,
    /// 详情页摘要
    Abstract,
    /// 详情页作者
    Authors,
    /// 详情页提交日期
    SubmissionDate,
    /// 详情页 DOI 链接
    DoiLink,
    /// 任意链接（兜底扫描用）
    Anchor,
}

impl Target {
    pub const ALL: [Target; 9] = [
        Target::ResultItem,
        Target::ResultTitle,
        Target::DetailLink,
        Target::NoResultsNotice,
        Target::Abstract,
        Target::Authors,
        Target::SubmissionDate,
        Target::DoiLink,
        Target::Anchor,
    ];

    /// 候选表中的键
    pub fn key(self) -> &'static str {
        match self {
            Target::ResultItem => "result_item",
            Target::ResultTitle => "result_title",
            Target::DetailLink => "detail_link",
            Target::NoResultsNotice => "no_results_notice",
            Target::Abstract => "abstract",
            Target::Authors => "authors",
            Target::SubmissionDate => "submission_date",
            Target::DoiLink => "doi_link",
            Target::Anchor => "anchor",
        }
    }

    /// 按优先级排列的候选选择器
    pub fn candidates(self) -> &'static [&'static str] {
        CANDIDATES.get(self.key()).copied().unwrap_or(&[])
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_target_has_candidates() {
        for target in Target::ALL {
            assert!(!target.candidates().is_empty(), "{} 没有候选", target);
            assert!(CANDIDATES.contains_key(target.key()));
        }
    }

    #[test]
    fn test_most_specific_candidate_first() {
        assert_eq!(Target::ResultItem.candidates()[0], "li.arxiv-result");
        assert_eq!(Target::Abstract.candidates()[0], "blockquote.abstract");
    }

    #[test]
    fn test_keys_are_distinct() {
        let mut keys: Vec<&str> = Target::ALL.iter().map(|t| t.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Target::ALL.len());
        assert_eq!(CANDIDATES.len(), Target::ALL.len());
    }
}
