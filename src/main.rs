use anyhow::Result;
use beagle_search::cli::Cli;
use beagle_search::utils::logging;
use beagle_search::{App, Config};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config)?.run(cli.command).await
}
