//! Health Guardian 主程序入口
//!
//! 多目标健康检测与故障切换查询服务

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    health_guardian::core::app::main().await
}
