//! 信号处理模块
//!
//! Unix 上监听 SIGINT 和 SIGTERM，其他平台监听 Ctrl+C

use crate::error::Result;
use tracing::info;

#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook_tokio::Signals;

/// 等待关闭信号
///
/// 收到第一个关闭信号后返回。
pub async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        wait_for_unix_signal().await
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("接收到 Ctrl+C，开始优雅关闭...");
        Ok(())
    }
}

/// Unix/Linux系统信号处理
#[cfg(unix)]
async fn wait_for_unix_signal() -> Result<()> {
    use futures::stream::StreamExt;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();

    if let Some(signal) = signals.next().await {
        match signal {
            SIGINT => info!("接收到 SIGINT 信号，开始优雅关闭..."),
            SIGTERM => info!("接收到 SIGTERM 信号，开始优雅关闭..."),
            other => info!("接收到信号 {}，开始优雅关闭...", other),
        }
    }

    handle.close();
    Ok(())
}
