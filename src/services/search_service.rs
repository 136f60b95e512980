//! 检索提交服务 - 业务能力层
//!
//! 根据检索条件构造高级检索地址并打开结果页

use anyhow::Result;
use tracing::info;
use url::Url;

use crate::infrastructure::PageDriver;
use crate::models::SearchCriteria;

/// 站点支持的每页结果数
const PAGE_SIZES: [usize; 4] = [25, 50, 100, 200];

/// 检索提交服务
pub struct SearchService {
    origin: Url,
}

impl SearchService {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// 构造高级检索地址
    ///
    /// 主题检索全部字段，显示摘要，按公布日期倒序；
    /// 每页条数取能覆盖 `max_results` 的最小档位
    pub fn search_url(&self, criteria: &SearchCriteria) -> Result<Url> {
        let mut url = self.origin.join("/search/advanced")?;
        let size = PAGE_SIZES
            .iter()
            .copied()
            .find(|&size| size >= criteria.max_results)
            .unwrap_or(PAGE_SIZES[PAGE_SIZES.len() - 1]);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("advanced", "")
                .append_pair("terms-0-operator", "AND")
                .append_pair("terms-0-term", criteria.topic.trim())
                .append_pair("terms-0-field", "all")
                .append_pair("classification-physics_archives", "all")
                .append_pair("classification-include_cross_list", "include");

            match criteria.year {
                Some(year) => query
                    .append_pair("date-filter_by", "specific_year")
                    .append_pair("date-year", &year.to_string()),
                None => query
                    .append_pair("date-filter_by", "all_dates")
                    .append_pair("date-year", ""),
            };

            query
                .append_pair("date-from_date", "")
                .append_pair("date-to_date", "")
                .append_pair("date-date_type", "submitted_date")
                .append_pair("abstracts", "show")
                .append_pair("size", &size.to_string())
                .append_pair("order", "-announced_date_first");
        }

        Ok(url)
    }

    /// 打开检索结果页
    pub async fn submit<D: PageDriver>(&self, driver: &D, criteria: &SearchCriteria) -> Result<Url> {
        let url = self.search_url(criteria)?;
        info!("🔎 提交检索: {}", url);
        driver.navigate(url.as_str()).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SearchService {
        SearchService::new(Url::parse("https://arxiv.org").unwrap())
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_search_url_with_year() {
        let criteria = SearchCriteria::new("quantum error correction", Some(2023), 10, 300).unwrap();
        let url = service().search_url(&criteria).unwrap();

        assert_eq!(url.path(), "/search/advanced");
        assert_eq!(param(&url, "terms-0-term").as_deref(), Some("quantum error correction"));
        assert_eq!(param(&url, "date-filter_by").as_deref(), Some("specific_year"));
        assert_eq!(param(&url, "date-year").as_deref(), Some("2023"));
        assert_eq!(param(&url, "size").as_deref(), Some("25"));
    }

    #[test]
    fn test_search_url_without_year() {
        let criteria = SearchCriteria::new("llm", None, 60, 300).unwrap();
        let url = service().search_url(&criteria).unwrap();

        assert_eq!(param(&url, "date-filter_by").as_deref(), Some("all_dates"));
        assert_eq!(param(&url, "size").as_deref(), Some("100"));
    }

    #[test]
    fn test_page_size_caps_at_largest() {
        let criteria = SearchCriteria::new("llm", None, 500, 300).unwrap();
        let url = service().search_url(&criteria).unwrap();
        assert_eq!(param(&url, "size").as_deref(), Some("200"));
    }
}
