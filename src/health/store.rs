//! 健康状态存储
//!
//! 保存每个目标的最新健康记录，是选择器读取、调度任务写入的唯一数据源。
//!
//! 每条记录有独立的读写锁，写入时整体替换记录，因此：
//! - 不同目标的写入互不竞争
//! - 读者不会看到半更新的记录
//! - 不存在跨所有目标的全局锁

use crate::health::record::{HealthRecord, ProbeOutcome};
use crate::health::target::{Target, TargetId, TargetRegistry};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// 一次选择决策所用的时间点视图，按优先级升序排列
pub type Snapshot = Vec<(Target, HealthRecord)>;

/// 健康状态存储
#[derive(Debug)]
pub struct HealthStateStore {
    /// 目标注册表
    registry: Arc<TargetRegistry>,
    /// 与注册表一一对应的健康记录，下标即 `TargetId`
    records: Vec<RwLock<HealthRecord>>,
}

impl HealthStateStore {
    /// 为注册表中的每个目标创建一条初始（不健康）记录
    pub fn new(registry: Arc<TargetRegistry>) -> Self {
        let records = registry
            .iter()
            .map(|target| RwLock::new(HealthRecord::unknown(target.id)))
            .collect();

        Self { registry, records }
    }

    /// 目标注册表
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// 用最新探测结果替换目标的健康记录
    ///
    /// 只应由负责该目标的调度任务调用。
    ///
    /// # 参数
    /// * `target` - 目标标识
    /// * `probe` - 探测结果
    /// * `checked_at` - 探测完成时间
    ///
    /// # 返回
    /// * `Option<HealthRecord>` - 被替换的旧记录，目标不存在时为 `None`
    pub fn update(
        &self,
        target: TargetId,
        probe: &ProbeOutcome,
        checked_at: DateTime<Utc>,
    ) -> Option<HealthRecord> {
        let slot = self.records.get(target.0)?;
        let record = HealthRecord::from_probe(target, probe, checked_at);

        let mut guard = slot.write();
        Some(std::mem::replace(&mut *guard, record))
    }

    /// 读取单个目标的健康记录
    pub fn record(&self, target: TargetId) -> Option<HealthRecord> {
        self.records.get(target.0).map(|slot| slot.read().clone())
    }

    /// 获取所有目标的时间点视图
    ///
    /// 每条记录在各自的锁下读取，单条记录内部一致；
    /// 不同目标的记录不保证来自同一时刻。
    pub fn snapshot(&self) -> Snapshot {
        self.registry
            .iter()
            .zip(self.records.iter())
            .map(|(target, slot)| (target.clone(), slot.read().clone()))
            .collect()
    }

    /// 当前健康的目标数量
    pub fn healthy_count(&self) -> usize {
        self.records.iter().filter(|slot| slot.read().is_healthy).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
