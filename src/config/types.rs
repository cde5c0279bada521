//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::health::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 按优先级从高到低排列的目标URL
    #[serde(default)]
    pub targets: Vec<String>,
    /// 检测间隔（秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 首选目标切换时通知的webhook URL
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// webhook请求超时时间（秒）
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_seconds: u64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 是否输出JSON格式日志
    #[serde(default)]
    pub json_logs: bool,
    /// Web 服务器配置
    #[serde(default)]
    pub web: WebConfig,
}

/// Web服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: default_web_bind_address(),
            port: default_web_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            check_interval_seconds: default_check_interval(),
            request_timeout_seconds: default_timeout(),
            webhook_url: None,
            webhook_timeout_seconds: default_webhook_timeout(),
            log_level: default_log_level(),
            json_logs: false,
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// 检测间隔
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// 单次探测超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// webhook请求超时
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_seconds)
    }

    /// 调度器配置
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.check_interval(),
            timeout: self.request_timeout(),
        }
    }

    /// 未配置或配置为空字符串时视为不发送通知
    pub fn webhook(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Web服务器监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.web.bind_address, self.web.port)
    }
}

// 默认值函数
fn default_check_interval() -> u64 {
    5
}
fn default_timeout() -> u64 {
    2
}
fn default_webhook_timeout() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_web_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_web_port() -> u16 {
    5000
}

/// 解析逗号分隔的URL列表
///
/// 每一项去掉首尾空白，位置即优先级。空项保留，由验证阶段拒绝，
/// 这样 `a,,b` 不会悄悄改变 `b` 的优先级。
///
/// # 参数
/// * `raw` - 逗号分隔的URL字符串
///
/// # 返回
/// * `Vec<String>` - URL列表，输入为空白时为空列表
pub fn parse_target_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|url| url.trim().to_string()).collect()
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.targets.is_empty() {
        return Err("至少需要配置一个目标URL".to_string());
    }

    for (index, url) in config.targets.iter().enumerate() {
        let priority = index + 1;
        if url.trim().is_empty() {
            return Err(format!("优先级 {} 的目标URL为空", priority));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("优先级 {} 的目标URL格式无效: {}", priority, url));
        }
    }

    if config.check_interval_seconds == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    if config.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.webhook_timeout_seconds == 0 {
        return Err("webhook超时时间不能为0".to_string());
    }

    if let Some(url) = config.webhook() {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("webhook URL格式无效: {}", url));
        }
    }

    // 验证日志级别
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    if config.web.port == 0 {
        return Err(format!(
            "无效的Web服务器端口: {}，端口不能为0",
            config.web.port
        ));
    }

    if config.web.bind_address.is_empty() {
        return Err("Web服务器绑定地址不能为空".to_string());
    }

    Ok(())
}

/// 收集不影响启动的配置警告
///
/// # 参数
/// * `config` - 已通过验证的配置
///
/// # 返回
/// * `Vec<String>` - 警告信息
pub fn config_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.request_timeout_seconds >= config.check_interval_seconds {
        warnings.push(format!(
            "请求超时时间({}秒)不小于检测间隔({}秒)，同一目标的探测会顺延执行",
            config.request_timeout_seconds, config.check_interval_seconds
        ));
    }

    for (index, url) in config.targets.iter().enumerate() {
        if config.targets[..index].contains(url) {
            warnings.push(format!(
                "目标URL重复配置: {}（优先级 {}）",
                url,
                index + 1
            ));
        }
    }

    warnings
}
