//! Webhook通知发送器模块
//!
//! 将首选目标切换事件以JSON形式POST到配置的webhook地址

use crate::error::{NotificationError, Result};
use crate::notification::sender::{FailoverEvent, NotificationSender};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// Webhook通知发送器
pub struct WebhookSender {
    /// HTTP客户端
    client: Client,
    /// webhook URL
    webhook_url: String,
}

impl WebhookSender {
    /// 创建新的webhook发送器
    ///
    /// # 参数
    /// * `webhook_url` - webhook URL
    /// * `timeout` - 单次发送的超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 发送器实例
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let webhook_url = webhook_url.into();
        if !webhook_url.starts_with("http://") && !webhook_url.starts_with("https://") {
            return Err(NotificationError::ConfigError(format!(
                "无效的webhook URL: {webhook_url}"
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// webhook URL
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// 发送JSON请求体到webhook
    async fn post_json(&self, body: &FailoverEvent) -> Result<()> {
        debug!("发送webhook通知到: {}", self.webhook_url);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(body)
            .send()
            .await
            .map_err(|e| NotificationError::SendError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(
                "webhook通知发送成功: {}，状态码: {}",
                self.webhook_url,
                status.as_u16()
            );
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!("webhook通知发送失败: {} - {}", status, text);
            Err(NotificationError::SendError(format!("webhook返回状态码 {status}")).into())
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send_failover_event(&self, event: &FailoverEvent) -> Result<()> {
        info!("发送首选目标切换通知: {}", event.message);
        self.post_json(event).await
    }

    async fn test_connection(&self) -> Result<()> {
        let mut event = FailoverEvent::new(None, None);
        event.message = "这是一条测试消息，用于验证webhook连接是否正常。".to_string();
        self.post_json(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::target::{Target, TargetId};
    use mockito::Matcher;

    fn target(index: usize, url: &str) -> Target {
        Target {
            id: TargetId(index),
            url: url.to_string(),
            priority: index as u32 + 1,
        }
    }

    #[test]
    fn test_invalid_webhook_url() {
        let result = WebhookSender::new("ftp://example.com/hook", Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_failover_event_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "event_type": "healthy_url_changed",
                "previous_healthy_url": "http://a.example",
                "current_healthy_url": "http://b.example",
                "current_healthy_url_priority": 2
            })))
            .with_status(200)
            .create_async()
            .await;

        let sender =
            WebhookSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        let a = target(0, "http://a.example");
        let b = target(1, "http://b.example");
        let event = FailoverEvent::new(Some(&a), Some(&b));

        sender.send_failover_event(&event).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let sender =
            WebhookSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        let result = sender.send_failover_event(&FailoverEvent::new(None, None)).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_connection_check() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(204)
            .create_async()
            .await;

        let sender =
            WebhookSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        assert!(sender.test_connection().await.is_ok());
        mock.assert_async().await;
    }
}
