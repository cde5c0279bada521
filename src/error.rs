//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health Guardian 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum GuardianError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),

    /// HTTP客户端构建错误
    #[error("HTTP客户端错误: {0}")]
    Http(#[from] reqwest::Error),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
///
/// 任何一种配置错误都是致命的，调度器不会启动。
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 目标列表为空
    #[error("未配置任何监控目标")]
    EmptyTargets,

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 单次探测的失败分类
///
/// 失败只会写入对应目标的健康记录并记录日志，
/// 不会传播到选择器或查询接口。
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// 探测超过超时时间
    #[error("Request timeout")]
    Timeout,

    /// 连接、DNS解析或响应格式错误
    #[error("{0}")]
    ConnectionFailure(String),

    /// 收到响应，但状态码不在 [200, 299] 范围内
    #[error("HTTP {0}")]
    BadStatus(u16),
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 发送失败
    #[error("通知发送失败: {0}")]
    SendError(String),

    /// 配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, GuardianError>;
