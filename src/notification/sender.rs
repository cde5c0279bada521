//! 通知发送器模块
//!
//! 定义通知发送的trait、事件结构和空实现

use crate::error::Result;
use crate::health::target::Target;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 首选目标切换事件的类型名
pub const HEALTHY_URL_CHANGED: &str = "healthy_url_changed";

/// 首选目标切换事件，即webhook的请求体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailoverEvent {
    /// 事件ID，便于接收方去重
    pub event_id: Uuid,
    /// 事件时间
    pub timestamp: DateTime<Utc>,
    /// 事件类型
    pub event_type: String,
    /// 切换前的首选URL
    pub previous_healthy_url: Option<String>,
    /// 切换后的首选URL，全部不可用时为空
    pub current_healthy_url: Option<String>,
    /// 切换后首选URL的优先级
    pub current_healthy_url_priority: Option<u32>,
    /// 可读的描述
    pub message: String,
}

impl FailoverEvent {
    /// 根据切换前后的首选目标构建事件
    ///
    /// # 参数
    /// * `previous` - 切换前的首选目标
    /// * `current` - 切换后的首选目标
    pub fn new(previous: Option<&Target>, current: Option<&Target>) -> Self {
        let previous_url = previous.map(|t| t.url.clone());
        let previous_label = previous_url.as_deref().unwrap_or("None");

        let message = match current {
            Some(target) => format!(
                "Healthy URL changed from '{}' to '{}' (Priority: {}).",
                previous_label, target.url, target.priority
            ),
            None => format!(
                "All monitored URLs are now unhealthy. Previous healthy URL was '{}'.",
                previous_label
            ),
        };

        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: HEALTHY_URL_CHANGED.to_string(),
            previous_healthy_url: previous_url,
            current_healthy_url: current.map(|t| t.url.clone()),
            current_healthy_url_priority: current.map(|t| t.priority),
            message,
        }
    }

    /// 是否表示全部目标不可用
    pub fn is_total_outage(&self) -> bool {
        self.current_healthy_url.is_none()
    }
}

/// 通知发送器trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送首选目标切换通知
    ///
    /// # 参数
    /// * `event` - 切换事件
    ///
    /// # 返回
    /// * `Result<()>` - 发送结果
    async fn send_failover_event(&self, event: &FailoverEvent) -> Result<()>;

    /// 测试连接
    ///
    /// # 返回
    /// * `Result<()>` - 测试结果
    async fn test_connection(&self) -> Result<()>;
}

/// 空的通知发送器实现（未配置webhook时使用）
pub struct NoOpSender;

#[async_trait]
impl NotificationSender for NoOpSender {
    async fn send_failover_event(&self, _event: &FailoverEvent) -> Result<()> {
        // 不执行任何操作
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        // 总是返回成功
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::target::TargetId;

    fn target(index: usize, url: &str) -> Target {
        Target {
            id: TargetId(index),
            url: url.to_string(),
            priority: index as u32 + 1,
        }
    }

    #[test]
    fn test_event_for_new_primary() {
        let a = target(0, "http://a.example");
        let b = target(1, "http://b.example");
        let event = FailoverEvent::new(Some(&a), Some(&b));

        assert_eq!(event.event_type, "healthy_url_changed");
        assert_eq!(event.previous_healthy_url.as_deref(), Some("http://a.example"));
        assert_eq!(event.current_healthy_url.as_deref(), Some("http://b.example"));
        assert_eq!(event.current_healthy_url_priority, Some(2));
        assert_eq!(
            event.message,
            "Healthy URL changed from 'http://a.example' to 'http://b.example' (Priority: 2)."
        );
        assert!(!event.is_total_outage());
    }

    #[test]
    fn test_event_for_first_primary() {
        let a = target(0, "http://a.example");
        let event = FailoverEvent::new(None, Some(&a));

        assert!(event.previous_healthy_url.is_none());
        assert!(event.message.starts_with("Healthy URL changed from 'None'"));
    }

    #[test]
    fn test_event_for_total_outage() {
        let b = target(1, "http://b.example");
        let event = FailoverEvent::new(Some(&b), None);

        assert!(event.is_total_outage());
        assert!(event.current_healthy_url_priority.is_none());
        assert_eq!(
            event.message,
            "All monitored URLs are now unhealthy. Previous healthy URL was 'http://b.example'."
        );
    }

    #[test]
    fn test_event_serialization_fields() {
        let a = target(0, "http://a.example");
        let json = serde_json::to_value(FailoverEvent::new(None, Some(&a))).unwrap();

        for field in [
            "event_id",
            "timestamp",
            "event_type",
            "previous_healthy_url",
            "current_healthy_url",
            "current_healthy_url_priority",
            "message",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert!(json["previous_healthy_url"].is_null());
    }

    #[tokio::test]
    async fn test_noop_sender() {
        let sender = NoOpSender;
        let event = FailoverEvent::new(None, None);
        assert!(sender.send_failover_event(&event).await.is_ok());
        assert!(sender.test_connection().await.is_ok());
    }
}
