//! 健康检测模块
//!
//! 提供目标注册、HTTP探测、健康状态存储、周期调度和首选目标选择功能

pub mod failover;
pub mod prober;
pub mod record;
pub mod scheduler;
pub mod selector;
pub mod store;
pub mod target;

// 重新导出主要类型
pub use failover::FailoverWatcher;
pub use prober::{HttpProber, Prober};
pub use record::{HealthRecord, Outcome, ProbeOutcome};
pub use scheduler::{HealthTransition, Scheduler, SchedulerConfig, TaskScheduler};
pub use selector::select;
pub use store::{HealthStateStore, Snapshot};
pub use target::{Target, TargetId, TargetRegistry};
