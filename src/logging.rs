//! 日志系统模块
//!
//! 提供结构化日志配置和初始化功能

use crate::config::Config;
use std::sync::OnceLock;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 进程内唯一一次初始化的结果
static LOGGING_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// 日志输出设置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 未设置 `RUST_LOG` 时的默认级别
    pub level: LevelFilter,
    /// 输出JSON行而非人类可读格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: parse_level(&config.log_level),
            json_format: config.json_logs,
        }
    }
}

/// 无法识别的级别按 info 处理
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// 全局日志初始化入口
pub struct LoggingSystem;

impl LoggingSystem {
    /// 安装全局 subscriber 和 `log` 桥接
    ///
    /// 只有第一次调用生效，之后的调用返回第一次的结果。
    ///
    /// # 参数
    /// * `config` - 日志设置
    pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
        LOGGING_INIT
            .get_or_init(|| Self::install(config).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| anyhow::anyhow!("日志系统初始化失败: {}", e))?;
        Ok(())
    }

    pub fn is_initialized() -> bool {
        matches!(LOGGING_INIT.get(), Some(Ok(())))
    }

    fn install(config: &LogConfig) -> anyhow::Result<()> {
        // reqwest、hyper 等依赖通过 log 输出
        tracing_log::LogTracer::init()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;

        // RUST_LOG 优先于配置的级别
        let filter = EnvFilter::builder()
            .with_default_directive(config.level.into())
            .from_env_lossy();

        let output = if config.json_format {
            fmt::layer()
                .json()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_current_span(false)
                .boxed()
        } else {
            fmt::layer()
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_target(true)
                .boxed()
        };

        // log 桥接已在上面安装，这里只设置 subscriber
        tracing::subscriber::set_global_default(registry().with(filter).with(output))
            .map_err(|e| anyhow::anyhow!("tracing subscriber初始化失败: {}", e))?;

        tracing::debug!("日志级别 {}，JSON输出 {}", config.level, config.json_format);
        Ok(())
    }
}
