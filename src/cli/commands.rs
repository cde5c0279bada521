//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{config_warnings, validate_config, Config};
use crate::core::ServiceLauncher;
use crate::error::{ConfigError, GuardianError, Result};
use crate::health::prober::{HttpProber, Prober};
use crate::health::selector::select;
use crate::health::store::{HealthStateStore, Snapshot};
use crate::health::target::{Target, TargetRegistry};
use crate::notification::{NotificationSender, WebhookSender};
use crate::web::TargetStatus;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    ///
    /// # 参数
    /// * `args` - 命令行参数
    /// * `config` - 已合并覆盖项但尚未验证的配置
    async fn execute(&self, args: &Args, config: Config) -> Result<()>;
}

/// 验证配置并返回目标注册表
fn validated_registry(config: &Config) -> Result<TargetRegistry> {
    validate_config(config).map_err(ConfigError::ValidationError)?;
    Ok(TargetRegistry::new(config.targets.iter().cloned())?)
}

/// 启动命令
pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self, _args: &Args, config: Config) -> Result<()> {
        ServiceLauncher::new(config).run().await
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args, _config: Config) -> Result<()> {
        if let Commands::Version { format } = args.command() {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                _ => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args, config: Config) -> Result<()> {
        let verbose = matches!(args.command(), Commands::Validate { verbose: true });
        let registry = validated_registry(&config)?;

        if verbose {
            println!("配置验证通过！");
            println!("  检测间隔: {}秒", config.check_interval_seconds);
            println!("  请求超时: {}秒", config.request_timeout_seconds);
            println!("  日志级别: {}", config.log_level);
            println!("  监听地址: {}", config.listen_address());
            println!("  webhook: {}", config.webhook().unwrap_or("未配置"));
            println!("目标列表:");
            for target in registry.iter() {
                println!("  {}", target);
            }
        } else {
            println!("✓ 配置验证通过");
            println!("✓ 找到 {} 个目标", registry.len());
        }

        for warning in config_warnings(&config) {
            println!("⚠ {}", warning);
        }

        Ok(())
    }
}

/// 一次性检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args, config: Config) -> Result<()> {
        let format = match args.command() {
            Commands::Check { format } => format,
            _ => OutputFormat::Table,
        };

        let registry = Arc::new(validated_registry(&config)?);
        let store = HealthStateStore::new(Arc::clone(&registry));
        let prober = HttpProber::new()?;

        // 所有目标并发探测一次
        let timeout = config.request_timeout();
        let outcomes = join_all(registry.iter().map(|target| prober.probe(target, timeout))).await;
        let checked_at = Utc::now();
        for (target, outcome) in registry.iter().zip(outcomes.iter()) {
            store.update(target.id, outcome, checked_at);
        }

        let snapshot = store.snapshot();
        let selected = select(&snapshot, &registry);

        match format {
            OutputFormat::Json => self.print_json_results(&snapshot, selected.as_ref())?,
            OutputFormat::Table => self.print_table_results(&snapshot, selected.as_ref()),
            OutputFormat::Text => self.print_text_results(&snapshot, selected.as_ref()),
        }

        match selected {
            Some(_) => Ok(()),
            None => Err(GuardianError::Other(anyhow::anyhow!("所有目标均不可用"))),
        }
    }
}

impl CheckCommand {
    fn print_json_results(&self, snapshot: &Snapshot, selected: Option<&Target>) -> Result<()> {
        let targets: Vec<TargetStatus> = snapshot
            .iter()
            .map(|(target, record)| TargetStatus::new(target, record))
            .collect();
        let output = serde_json::json!({
            "targets": targets,
            "healthy_url": selected.map(|t| t.url.clone()),
            "priority": selected.map(|t| t.priority),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// 打印文本格式结果
    fn print_text_results(&self, snapshot: &Snapshot, selected: Option<&Target>) {
        for (target, record) in snapshot {
            let status_icon = if record.is_healthy { "✓" } else { "✗" };
            println!(
                "{} {} - {}ms",
                status_icon,
                target,
                record.response_time_ms.unwrap_or_default()
            );
            if let Some(error) = &record.last_error {
                println!("  错误: {error}");
            }
        }
        Self::print_selection(selected);
    }

    /// 打印表格格式结果
    fn print_table_results(&self, snapshot: &Snapshot, selected: Option<&Target>) {
        println!(
            "{:<6} {:<40} {:<6} {:<8} {:<10} {:<30}",
            "优先级", "URL", "状态", "状态码", "响应时间", "错误信息"
        );
        println!("{}", "-".repeat(100));

        for (target, record) in snapshot {
            let status = if record.is_healthy { "正常" } else { "异常" };
            let status_code = record
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let error_msg = record
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();

            println!(
                "{:<6} {:<40} {:<6} {:<8} {:<10} {:<30}",
                target.priority,
                target.url,
                status,
                status_code,
                format!("{}ms", record.response_time_ms.unwrap_or_default()),
                error_msg
            );
        }
        Self::print_selection(selected);
    }

    fn print_selection(selected: Option<&Target>) {
        match selected {
            Some(target) => println!("\n首选目标: {}", target),
            None => println!("\n所有目标均不可用"),
        }
    }
}

/// 测试通知命令
pub struct TestNotificationCommand;

#[async_trait]
impl Command for TestNotificationCommand {
    async fn execute(&self, _args: &Args, config: Config) -> Result<()> {
        let Some(webhook_url) = config.webhook() else {
            return Err(ConfigError::ValidationError("未配置webhook URL".to_string()).into());
        };

        let sender = WebhookSender::new(webhook_url, config.webhook_timeout())?;
        println!("发送测试通知到: {}", sender.webhook_url());
        sender.test_connection().await?;
        println!("✓ 测试通知发送成功");
        Ok(())
    }
}

/// 根据子命令创建命令处理器
pub fn command_for(command: &Commands) -> Box<dyn Command> {
    match command {
        Commands::Start => Box::new(StartCommand),
        Commands::Check { .. } => Box::new(CheckCommand),
        Commands::Validate { .. } => Box::new(ValidateCommand),
        Commands::TestNotification => Box::new(TestNotificationCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    }
}
