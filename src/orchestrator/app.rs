//! 应用入口 - 编排层
//!
//! 负责资源生命周期：初始化日志、连接或启动浏览器、创建页面驱动，
//! 然后把一次运行委托给 `BatchOrchestrator`，最后写出结果。

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{error, info};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ChromiumDriver, JsExecutor};
use crate::models::HarvestRun;
use crate::orchestrator::BatchOrchestrator;
use crate::services::{ResultWriter, TracingSink};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: ChromiumDriver,
    orchestrator: BatchOrchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        let criteria = config.search_criteria()?;
        log_startup(&criteria);

        let orchestrator = BatchOrchestrator::from_config(&config)?;

        // 有调试端口时连接已打开的浏览器，否则启动无头浏览器
        let (browser, page) = match config.browser_debug_port {
            Some(port) => browser::connect_to_browser_and_page(port).await?,
            None => browser::launch_headless_browser(config.chrome_executable.as_deref()).await?,
        };

        // JsExecutor 是唯一的 page owner
        let executor = JsExecutor::new(page);
        let driver = ChromiumDriver::new(executor, &config);

        Ok(Self {
            config,
            _browser: browser,
            driver,
            orchestrator,
        })
    }

    /// 运行一次采集并写出结果
    pub async fn run(&self) -> Result<HarvestRun> {
        let criteria = self.config.search_criteria()?;

        let run = self
            .orchestrator
            .run(&self.driver, &criteria, &TracingSink)
            .await;

        let writer = ResultWriter::new(&self.config.output_dir);
        let output_path = match writer.write(&criteria, &run).await {
            Ok(path) => {
                info!("💾 已写入 {} 篇论文", run.papers.len());
                Some(path.display().to_string())
            }
            Err(e) => {
                error!("❌ 写入结果失败: {}", e);
                None
            }
        };

        print_final_stats(
            &run.summary,
            output_path.as_deref(),
            &self.config.output_log_file,
        );

        Ok(run)
    }
}
