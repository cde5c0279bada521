//! 通知模块
//!
//! 在首选目标发生切换时发送webhook通知

pub mod sender;
pub mod webhook;

// 重新导出主要类型
pub use sender::{FailoverEvent, NoOpSender, NotificationSender};
pub use webhook::WebhookSender;
