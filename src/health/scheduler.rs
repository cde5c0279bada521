//! 轮询调度器模块
//!
//! 为每个目标启动一个独立的周期性探测任务，并把结果写入健康状态存储

use crate::error::ProbeFailure;
use crate::health::prober::Prober;
use crate::health::record::ProbeOutcome;
use crate::health::store::HealthStateStore;
use crate::health::target::Target;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 健康状态变化事件的通道容量
const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// 调度器侧截止时间比探测超时多出的余量，探测器自身的超时分类优先
const DEADLINE_MARGIN: Duration = Duration::from_millis(100);

/// 调度参数，对所有目标相同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// 两次探测之间的间隔
    pub interval: Duration,
    /// 单次探测的超时上限
    pub timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
        }
    }
}

/// 目标健康状态发生翻转时发布的事件
#[derive(Debug, Clone)]
pub struct HealthTransition {
    /// 发生变化的目标
    pub target: Target,
    /// 变化后的状态
    pub healthy: bool,
    /// 变为不健康时的失败原因
    pub failure: Option<ProbeFailure>,
    /// 探测完成时间
    pub checked_at: DateTime<Utc>,
}

/// 调度器状态
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    /// 运行中的任务数量
    pub running_tasks: usize,
    /// 目标总数
    pub total_targets: usize,
    /// 调度器是否运行中
    pub is_running: bool,
}

/// 任务调度器trait，定义调度接口
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// 为每个目标启动探测任务
    async fn start(&self) -> Result<()>;

    /// 停止所有探测任务
    async fn stop(&self) -> Result<()>;

    /// 获取调度器状态
    async fn get_status(&self) -> SchedulerStatus;
}

/// 任务调度器实现
pub struct TaskScheduler {
    /// 探测器
    prober: Arc<dyn Prober>,
    /// 健康状态存储
    store: Arc<HealthStateStore>,
    /// 调度参数
    config: SchedulerConfig,
    /// 运行中的任务
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// 调度器状态
    status: Arc<RwLock<SchedulerStatus>>,
    /// 健康状态变化广播
    transitions: broadcast::Sender<HealthTransition>,
}

impl TaskScheduler {
    /// 创建新的任务调度器
    ///
    /// # 参数
    /// * `prober` - 探测器
    /// * `store` - 健康状态存储，目标列表取自其注册表
    /// * `config` - 调度参数
    pub fn new(
        prober: Arc<dyn Prober>,
        store: Arc<HealthStateStore>,
        config: SchedulerConfig,
    ) -> Self {
        if config.timeout >= config.interval {
            warn!(
                "探测超时({:?})不小于探测间隔({:?})，同一目标的探测将顺延执行",
                config.timeout, config.interval
            );
        }

        let status = SchedulerStatus {
            running_tasks: 0,
            total_targets: store.len(),
            is_running: false,
        };
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Self {
            prober,
            store,
            config,
            tasks: Mutex::new(Vec::new()),
            status: Arc::new(RwLock::new(status)),
            transitions,
        }
    }

    /// 订阅健康状态变化事件
    pub fn subscribe(&self) -> broadcast::Receiver<HealthTransition> {
        self.transitions.subscribe()
    }

    /// 执行一次探测
    ///
    /// 探测器没有在超时加余量之内返回时直接记为超时。
    async fn probe_with_deadline(
        prober: &dyn Prober,
        target: &Target,
        timeout_duration: Duration,
    ) -> ProbeOutcome {
        let deadline = timeout_duration + DEADLINE_MARGIN;
        match timeout(deadline, prober.probe(target, timeout_duration)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::unhealthy(ProbeFailure::Timeout, deadline),
        }
    }

    /// 执行一个探测周期：探测、写入存储、记录日志、发布状态变化
    async fn run_cycle(
        prober: &dyn Prober,
        store: &HealthStateStore,
        transitions: &broadcast::Sender<HealthTransition>,
        target: &Target,
        timeout_duration: Duration,
    ) {
        debug!("开始探测目标: {}", target);

        let probe = Self::probe_with_deadline(prober, target, timeout_duration).await;
        let checked_at = Utc::now();

        let Some(previous) = store.update(target.id, &probe, checked_at) else {
            warn!("目标 {} 不在健康状态存储中，忽略探测结果", target);
            return;
        };

        match probe.outcome.failure() {
            None => debug!(
                "探测成功: {} (P{}): HTTP {} {}ms",
                target.url,
                target.priority,
                probe.status_code.unwrap_or_default(),
                probe.response_time_ms()
            ),
            Some(failure) => warn!(
                "探测失败: {} (P{}): {}",
                target.url, target.priority, failure
            ),
        }

        if previous.is_healthy != probe.is_healthy() {
            info!(
                "目标 {} 状态变化: {} -> {}",
                target,
                if previous.is_healthy { "健康" } else { "不健康" },
                if probe.is_healthy() { "健康" } else { "不健康" }
            );

            // 没有订阅者时发送失败，可以忽略
            let _ = transitions.send(HealthTransition {
                target: target.clone(),
                healthy: probe.is_healthy(),
                failure: probe.outcome.failure().cloned(),
                checked_at,
            });
        }
    }

    /// 启动单个目标的探测任务
    ///
    /// 任务内探测是顺序执行的，同一目标任何时刻最多只有一个探测在进行。
    fn spawn_target_task(&self, target: Target) -> JoinHandle<()> {
        let prober = Arc::clone(&self.prober);
        let store = Arc::clone(&self.store);
        let transitions = self.transitions.clone();
        let config = self.config;

        tokio::spawn(async move {
            let mut ticker = interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("启动目标探测任务: {}", target);

            loop {
                ticker.tick().await;
                Self::run_cycle(
                    prober.as_ref(),
                    &store,
                    &transitions,
                    &target,
                    config.timeout,
                )
                .await;
            }
        })
    }

    /// 更新调度器状态
    async fn update_status(&self, running_tasks: usize, is_running: bool) {
        let mut status = self.status.write().await;
        status.running_tasks = running_tasks;
        status.is_running = is_running;
    }
}

#[async_trait]
impl Scheduler for TaskScheduler {
    async fn start(&self) -> Result<()> {
        let running = {
            let mut tasks = self.tasks.lock();
            if !tasks.is_empty() {
                warn!("任务调度器已在运行，忽略重复启动");
                return Ok(());
            }

            info!("启动任务调度器，目标数量: {}", self.store.len());
            for target in self.store.registry().iter() {
                tasks.push(self.spawn_target_task(target.clone()));
            }
            tasks.len()
        };

        self.update_status(running, true).await;
        info!("任务调度器启动完成");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        info!("停止任务调度器");

        let stopped: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in &stopped {
            task.abort();
        }
        debug!("已停止 {} 个探测任务", stopped.len());

        self.update_status(0, false).await;
        info!("任务调度器已停止");
        Ok(())
    }

    async fn get_status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        // 确保调度器销毁时所有任务都被终止
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
