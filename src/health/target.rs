//! 监控目标注册表
//!
//! 启动时从配置构建一次，此后在进程生命周期内不可变

use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;

/// 目标标识，即目标在注册表中的下标（从0开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 单个监控目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// 目标标识
    pub id: TargetId,
    /// 探测地址
    pub url: String,
    /// 优先级，数值越小优先级越高，从1开始
    pub priority: u32,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}: {}", self.priority, self.url)
    }
}

/// 按优先级排序的目标列表
///
/// 优先级由配置中的位置决定（第一个为1），因此互不相同且全序。
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// 从有序的URL列表构建注册表
    ///
    /// # 参数
    /// * `urls` - 按优先级从高到低排列的URL
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 列表为空时返回 `ConfigError::EmptyTargets`
    pub fn new<I, S>(urls: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<Target> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| Target {
                id: TargetId(index),
                url: url.into(),
                priority: index as u32 + 1,
            })
            .collect();

        if targets.is_empty() {
            return Err(ConfigError::EmptyTargets);
        }

        Ok(Self { targets })
    }

    /// 按优先级升序遍历目标
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// 按标识查找目标
    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// 所有目标的切片视图
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}
