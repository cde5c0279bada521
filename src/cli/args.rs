//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口，所有覆盖项都可通过环境变量设置

use crate::config::{parse_target_list, Config, TomlConfigLoader};
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Health Guardian - 多目标健康检测与故障切换查询服务
#[derive(Parser, Debug, Clone)]
#[command(
    name = "health-guardian",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "GUARDIAN_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 逗号分隔的目标URL列表，位置即优先级
    #[arg(
        short,
        long,
        value_name = "URLS",
        help = "逗号分隔的目标URL列表（第一个优先级最高）",
        env = "HEALTH_CHECK_URLS"
    )]
    pub urls: Option<String>,

    /// 检测间隔（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "检测间隔（秒）",
        env = "HEALTH_CHECK_INTERVAL_SECONDS"
    )]
    pub interval: Option<u64>,

    /// 单次探测超时（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "单次探测超时（秒）",
        env = "HEALTH_CHECK_TIMEOUT_SECONDS"
    )]
    pub timeout: Option<u64>,

    /// 首选目标切换时通知的webhook URL
    #[arg(long, value_name = "URL", help = "切换通知webhook URL", env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Web服务器绑定地址
    #[arg(
        long,
        value_name = "ADDR",
        help = "Web服务器绑定地址",
        env = "GUARDIAN_BIND_ADDRESS"
    )]
    pub bind_address: Option<String>,

    /// Web服务器端口
    #[arg(
        short,
        long,
        value_name = "PORT",
        help = "Web服务器端口",
        env = "GUARDIAN_PORT"
    )]
    pub port: Option<u16>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "GUARDIAN_LOG_LEVEL"
    )]
    pub log_level: Option<LogLevel>,

    /// 输出JSON格式日志
    #[arg(long, help = "输出JSON格式日志", env = "GUARDIAN_JSON_LOGS")]
    pub json_logs: bool,

    /// 子命令，缺省为 start
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// 启动健康检测与查询服务
    Start,

    /// 对所有目标执行一次性健康检测
    Check {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "table", help = "输出格式")]
        format: OutputFormat,
    },

    /// 验证配置
    Validate {
        /// 是否显示详细信息
        #[arg(short, long, help = "显示详细信息")]
        verbose: bool,
    },

    /// 测试webhook通知
    TestNotification,

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
    /// 表格格式
    Table,
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 要执行的子命令
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }

    /// 将命令行和环境变量的覆盖项应用到配置
    ///
    /// # 参数
    /// * `config` - 从默认值或配置文件得到的配置
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(urls) = &self.urls {
            config.targets = parse_target_list(urls);
        }
        if let Some(interval) = self.interval {
            config.check_interval_seconds = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_seconds = timeout;
        }
        if let Some(webhook_url) = &self.webhook_url {
            config.webhook_url = Some(webhook_url.clone());
        }
        if let Some(bind_address) = &self.bind_address {
            config.web.bind_address = bind_address.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if let Some(level) = self.log_level {
            config.log_level = level.to_string();
        }
        if self.json_logs {
            config.json_logs = true;
        }
    }

    /// 加载生效的配置：默认值、配置文件、命令行和环境变量依次覆盖
    ///
    /// 返回的配置尚未验证。
    pub async fn load_config(&self) -> Result<Config> {
        let loader = TomlConfigLoader::new(true);
        let mut config = loader.load_or_default(self.config.as_deref()).await?;
        self.apply_overrides(&mut config);
        Ok(config)
    }
}
