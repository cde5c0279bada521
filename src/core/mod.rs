//! 核心模块
//!
//! 包含应用程序的核心逻辑和生命周期管理

pub mod app;
pub mod service;
pub mod shutdown;

// 重新导出主要类型
pub use app::execute_command;
pub use service::{RunningService, ServiceLauncher};
pub use shutdown::wait_for_shutdown_signal;
