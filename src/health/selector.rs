//! 目标选择器
//!
//! 按优先级升序扫描，返回第一个健康的目标

use crate::health::store::Snapshot;
use crate::health::target::{Target, TargetRegistry};

/// 选择当前优先级最高的健康目标
///
/// 以注册表的顺序为准，而不是快照的顺序；优先级在构造时即互不相同，
/// 因此结果是确定的。不缓存结果，每次查询都重新计算。
///
/// # 参数
/// * `snapshot` - 健康状态存储的时间点视图
/// * `registry` - 目标注册表
///
/// # 返回
/// * `Option<Target>` - 最高优先级的健康目标，全部不健康时为 `None`
pub fn select(snapshot: &Snapshot, registry: &TargetRegistry) -> Option<Target> {
    registry
        .iter()
        .find(|target| {
            snapshot
                .get(target.id.0)
                .filter(|(entry, _)| entry.id == target.id)
                .or_else(|| snapshot.iter().find(|(entry, _)| entry.id == target.id))
                .is_some_and(|(_, record)| record.is_healthy)
        })
        .cloned()
}
