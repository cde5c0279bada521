//! 首选目标切换监视
//!
//! 订阅调度器的健康状态变化，重新选择首选目标，
//! 首选目标改变时记录日志并发送通知。

use crate::health::scheduler::HealthTransition;
use crate::health::selector::select;
use crate::health::store::HealthStateStore;
use crate::health::target::Target;
use crate::notification::{FailoverEvent, NotificationSender};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 首选目标切换监视器
pub struct FailoverWatcher {
    /// 健康状态存储
    store: Arc<HealthStateStore>,
    /// 通知发送器
    notifier: Arc<dyn NotificationSender>,
    /// 最近一次观察到的首选目标
    current: Mutex<Option<Target>>,
}

impl FailoverWatcher {
    pub fn new(store: Arc<HealthStateStore>, notifier: Arc<dyn NotificationSender>) -> Self {
        Self {
            store,
            notifier,
            current: Mutex::new(None),
        }
    }

    /// 最近一次观察到的首选目标
    pub fn current(&self) -> Option<Target> {
        self.current.lock().clone()
    }

    /// 重新选择首选目标，与上次结果比较
    ///
    /// # 返回
    /// * `Option<FailoverEvent>` - 首选目标改变时返回切换事件
    pub fn evaluate(&self) -> Option<FailoverEvent> {
        let selected = select(&self.store.snapshot(), self.store.registry());

        let mut current = self.current.lock();
        if *current == selected {
            return None;
        }

        let event = FailoverEvent::new(current.as_ref(), selected.as_ref());
        match &selected {
            Some(_) => info!("首选目标切换: {}", event.message),
            None => warn!("所有目标均不可用: {}", event.message),
        }
        *current = selected;
        Some(event)
    }

    /// 启动监视任务
    ///
    /// 通道关闭时任务结束；接收落后时直接按当前存储重新选择。
    ///
    /// # 参数
    /// * `transitions` - 调度器的健康状态变化订阅
    ///
    /// # 返回
    /// * `JoinHandle<()>` - 任务句柄
    pub fn spawn(
        self: Arc<Self>,
        mut transitions: broadcast::Receiver<HealthTransition>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match transitions.recv().await {
                    Ok(transition) => {
                        debug!(
                            "收到健康状态变化: {} -> {}",
                            transition.target,
                            if transition.healthy { "健康" } else { "不健康" }
                        );
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("健康状态变化接收落后，跳过 {} 条", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("健康状态变化通道已关闭，停止监视");
                        break;
                    }
                }

                if let Some(event) = self.evaluate() {
                    if let Err(e) = self.notifier.send_failover_event(&event).await {
                        error!("发送切换通知失败: {}", e);
                    }
                }
            }
        })
    }
}
