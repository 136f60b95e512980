use anyhow::Result;
use arxiv_harvest::utils::logging;
use arxiv_harvest::{App, Config};

/// 默认配置文件
const CONFIG_FILE: &str = "harvest.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（文件可选，环境变量覆盖）
    let config = Config::load(CONFIG_FILE)?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
