use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::models::SearchCriteria;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 检索条件 ---
    /// 检索主题
    pub topic: String,
    /// 发表年份过滤（为空则不限）
    pub year: Option<i32>,
    /// 最多处理的论文数量
    pub max_results: usize,
    /// 摘要最大长度（字符数）
    pub max_abstract_length: usize,
    // --- 浏览器配置 ---
    /// 浏览器调试端口，为空时启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 检索站点地址
    pub site_origin: String,
    /// 选择器查找超时（毫秒）
    pub selector_timeout_ms: u64,
    /// 页面加载超时（毫秒）
    pub page_load_timeout_ms: u64,
    // --- 输出配置 ---
    /// 结果输出目录
    pub output_dir: String,
    /// 失败截图目录
    pub screenshot_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic: "large language models".to_string(),
            year: None,
            max_results: 5,
            max_abstract_length: 300,
            browser_debug_port: None,
            chrome_executable: None,
            site_origin: "https://arxiv.org".to_string(),
            selector_timeout_ms: 5_000,
            page_load_timeout_ms: 30_000,
            output_dir: "output".to_string(),
            screenshot_dir: "screenshots".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（若存在）→ 环境变量覆盖
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::from_toml_file(path)?
        } else {
            Self::default()
        };
        config.apply_env()
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::File(FileError::ReadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().apply_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(self) -> AppResult<Self> {
        Ok(Self {
            topic: std::env::var("HARVEST_TOPIC").unwrap_or(self.topic),
            year: match std::env::var("HARVEST_YEAR") {
                Ok(v) => Some(parse_var("HARVEST_YEAR", &v, "i32")?),
                Err(_) => self.year,
            },
            max_results: env_or("HARVEST_MAX_RESULTS", self.max_results, "usize")?,
            max_abstract_length: env_or(
                "HARVEST_MAX_ABSTRACT_LENGTH",
                self.max_abstract_length,
                "usize",
            )?,
            browser_debug_port: match std::env::var("BROWSER_DEBUG_PORT") {
                Ok(v) => Some(parse_var("BROWSER_DEBUG_PORT", &v, "u16")?),
                Err(_) => self.browser_debug_port,
            },
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            site_origin: std::env::var("HARVEST_SITE_ORIGIN").unwrap_or(self.site_origin),
            selector_timeout_ms: env_or("SELECTOR_TIMEOUT_MS", self.selector_timeout_ms, "u64")?,
            page_load_timeout_ms: env_or(
                "PAGE_LOAD_TIMEOUT_MS",
                self.page_load_timeout_ms,
                "u64",
            )?,
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            screenshot_dir: std::env::var("SCREENSHOT_DIR").unwrap_or(self.screenshot_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging, "bool")?,
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
        })
    }

    /// 构建检索条件（校验不变量）
    pub fn search_criteria(&self) -> AppResult<SearchCriteria> {
        SearchCriteria::new(
            self.topic.clone(),
            self.year,
            self.max_results,
            self.max_abstract_length,
        )
    }
}

fn env_or<T: std::str::FromStr>(var_name: &str, current: T, expected_type: &str) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(v) => parse_var(var_name, &v, expected_type),
        Err(_) => Ok(current),
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            topic = "graph neural networks"
            year = 2023
            max_results = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.topic, "graph neural networks");
        assert_eq!(config.year, Some(2023));
        assert_eq!(config.max_results, 3);
        assert_eq!(config.max_abstract_length, 300);
        assert_eq!(config.site_origin, "https://arxiv.org");
    }

    #[test]
    fn test_parse_var_reports_type() {
        let err = parse_var::<u16>("BROWSER_DEBUG_PORT", "abc", "u16").unwrap_err();
        assert!(err.to_string().contains("BROWSER_DEBUG_PORT"));
        assert!(err.to_string().contains("u16"));
    }

    #[test]
    fn test_search_criteria_rejects_zero_results() {
        let config = Config {
            max_results: 0,
            ..Config::default()
        };
        assert!(config.search_criteria().is_err());
    }
}
