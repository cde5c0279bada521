//! 服务管理模块
//!
//! 负责服务的启动、组件初始化和生命周期管理

use crate::config::{config_warnings, validate_config, Config};
use crate::core::shutdown::wait_for_shutdown_signal;
use crate::error::{ConfigError, Result};
use crate::health::failover::FailoverWatcher;
use crate::health::prober::HttpProber;
use crate::health::scheduler::{Scheduler, TaskScheduler};
use crate::health::store::HealthStateStore;
use crate::health::target::TargetRegistry;
use crate::notification::{NoOpSender, NotificationSender, WebhookSender};
use crate::web::{AppState, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 等待Web服务器退出的最长时间
const WEB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// 服务启动器
pub struct ServiceLauncher {
    config: Config,
}

impl ServiceLauncher {
    /// 创建服务启动器
    ///
    /// # 参数
    /// * `config` - 已合并所有来源的配置
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 启动服务并运行到收到关闭信号
    pub async fn run(self) -> Result<()> {
        let running = self.start().await?;
        wait_for_shutdown_signal().await?;
        running.shutdown().await
    }

    /// 初始化并启动所有组件
    ///
    /// 配置无效时在启动任何探测任务之前返回错误。
    ///
    /// # 返回
    /// * `Result<RunningService>` - 运行中的服务句柄
    pub async fn start(self) -> Result<RunningService> {
        let config = self.config;

        // 1. 验证配置
        validate_config(&config).map_err(ConfigError::ValidationError)?;
        for warning in config_warnings(&config) {
            warn!("配置警告: {}", warning);
        }

        let registry = Arc::new(TargetRegistry::new(config.targets.iter().cloned())?);
        Self::log_startup(&config, &registry);

        // 2. 初始化核心组件
        let store = Arc::new(HealthStateStore::new(Arc::clone(&registry)));
        let prober = Arc::new(HttpProber::new()?);
        let scheduler = Arc::new(TaskScheduler::new(
            prober,
            Arc::clone(&store),
            config.scheduler_config(),
        ));

        // 3. 切换监视，在调度器启动前订阅以免错过首次状态变化
        let notifier: Arc<dyn NotificationSender> = match config.webhook() {
            Some(url) => Arc::new(WebhookSender::new(url, config.webhook_timeout())?),
            None => Arc::new(NoOpSender),
        };
        let watcher = Arc::new(FailoverWatcher::new(Arc::clone(&store), notifier));
        let watcher_handle = Arc::clone(&watcher).spawn(scheduler.subscribe());

        // 4. 先绑定端口，绑定失败时不启动探测
        let web_server = WebServer::new(&config.web, AppState::new(Arc::clone(&store)));
        let listener = match web_server.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                watcher_handle.abort();
                return Err(e);
            }
        };
        let local_addr = listener.local_addr()?;

        // 5. 启动调度器
        scheduler.start().await?;

        // 6. 启动Web服务器
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let web_handle = tokio::spawn(web_server.serve(listener, shutdown_rx));

        info!("健康检测服务已启动，查询地址: http://{}/healthy-endpoint", local_addr);

        Ok(RunningService {
            local_addr,
            store,
            scheduler,
            watcher,
            watcher_handle,
            web_handle,
            shutdown_tx,
        })
    }

    fn log_startup(config: &Config, registry: &TargetRegistry) {
        info!("{} v{} 启动", crate::APP_NAME, crate::VERSION);
        info!(
            "检测间隔: {}秒，请求超时: {}秒",
            config.check_interval_seconds, config.request_timeout_seconds
        );
        match config.webhook() {
            Some(url) => info!("切换通知webhook: {}", url),
            None => info!("未配置切换通知webhook"),
        }
        info!("监控目标（按优先级）:");
        for target in registry.iter() {
            info!("  {}", target);
        }
    }
}

/// 运行中的服务
pub struct RunningService {
    local_addr: SocketAddr,
    store: Arc<HealthStateStore>,
    scheduler: Arc<TaskScheduler>,
    watcher: Arc<FailoverWatcher>,
    watcher_handle: JoinHandle<()>,
    web_handle: JoinHandle<Result<()>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RunningService {
    /// Web服务器实际监听的地址
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 健康状态存储
    pub fn store(&self) -> &Arc<HealthStateStore> {
        &self.store
    }

    /// 切换监视器
    pub fn watcher(&self) -> &Arc<FailoverWatcher> {
        &self.watcher
    }

    /// 停止所有组件
    pub async fn shutdown(self) -> Result<()> {
        info!("正在停止服务...");

        self.scheduler.stop().await?;
        self.watcher_handle.abort();

        // 没有接收者时发送失败，说明Web服务器已退出
        let _ = self.shutdown_tx.send(());
        match tokio::time::timeout(WEB_SHUTDOWN_TIMEOUT, self.web_handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!("Web服务器运行失败: {}", e),
            Ok(Err(e)) => error!("Web服务器任务异常退出: {}", e),
            Err(_) => warn!("等待Web服务器关闭超时"),
        }

        info!("服务已停止");
        Ok(())
    }
}
