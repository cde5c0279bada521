//! Health Guardian - 多目标健康检测与故障切换查询服务
//!
//! 按优先级监控一组等价的HTTP目标：
//! - 每个目标独立周期探测，互不阻塞
//! - 查询接口返回当前优先级最高的健康目标
//! - 首选目标切换时发送webhook通知
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod health;
pub mod logging;
pub mod notification;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use error::{GuardianError, ProbeFailure, Result};
pub use health::{select, HealthStateStore, Target, TargetRegistry};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
