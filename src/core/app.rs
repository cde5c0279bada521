//! 应用程序核心逻辑
//!
//! 包含主函数、命令执行和应用程序生命周期管理

use crate::cli::args::Args;
use crate::cli::commands::command_for;
use crate::config::Config;
use crate::logging::{LogConfig, LoggingSystem};
use anyhow::{Context, Result};
use tracing::{debug, error};

/// 应用程序主函数
pub async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse_args();

    // 合并默认值、配置文件、命令行和环境变量
    let config = args.load_config().await.context("加载配置失败")?;

    // 初始化日志系统
    LoggingSystem::setup_logging(&LogConfig::from_config(&config))
        .context("初始化日志系统失败")?;

    // 执行命令
    if let Err(e) = execute_command(&args, config).await {
        error!("命令执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 执行CLI命令
///
/// # 参数
/// * `args` - 命令行参数
/// * `config` - 生效的配置
pub async fn execute_command(args: &Args, config: Config) -> Result<()> {
    let command = args.command();
    debug!("执行命令: {:?}", command);

    command_for(&command)
        .execute(args, config)
        .await
        .map_err(anyhow::Error::from)
}
