//! 健康记录与探测结果数据结构
//!
//! 定义探测结果类型和每个目标的最新健康记录

use crate::error::ProbeFailure;
use crate::health::target::TargetId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// 单次探测的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 在超时时间内收到 2xx 响应
    Healthy,
    /// 其余所有情况
    Unhealthy(ProbeFailure),
}

impl Outcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Outcome::Healthy)
    }

    /// 失败原因（健康时为空）
    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            Outcome::Healthy => None,
            Outcome::Unhealthy(failure) => Some(failure),
        }
    }
}

/// 一次探测的完整结果
///
/// 除结论外还携带响应时间和状态码，供详细状态接口和日志使用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// 探测结论
    pub outcome: Outcome,
    /// 从发出请求到得出结论的耗时
    pub response_time: Duration,
    /// HTTP状态码（如果收到了响应）
    pub status_code: Option<u16>,
}

impl ProbeOutcome {
    /// 创建健康结果
    pub fn healthy(status_code: u16, response_time: Duration) -> Self {
        Self {
            outcome: Outcome::Healthy,
            response_time,
            status_code: Some(status_code),
        }
    }

    /// 创建不健康结果
    pub fn unhealthy(failure: ProbeFailure, response_time: Duration) -> Self {
        let status_code = match failure {
            ProbeFailure::BadStatus(code) => Some(code),
            _ => None,
        };

        Self {
            outcome: Outcome::Unhealthy(failure),
            response_time,
            status_code,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.outcome.is_healthy()
    }

    /// 响应时间（毫秒）
    pub fn response_time_ms(&self) -> u64 {
        self.response_time.as_millis() as u64
    }
}

/// 目标的最新已知健康状态
///
/// 只由负责该目标的调度任务整体替换，读者永远看不到半更新的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecord {
    /// 所属目标
    pub target: TargetId,
    /// 最近一次探测是否健康
    pub is_healthy: bool,
    /// 最近一次探测完成的时间（无论成功失败）
    pub last_checked_at: Option<DateTime<Utc>>,
    /// 最近一次失败的分类
    pub last_error: Option<ProbeFailure>,
    /// 最近一次探测的响应时间（毫秒）
    pub response_time_ms: Option<u64>,
    /// 最近一次探测的状态码
    pub status_code: Option<u16>,
}

impl HealthRecord {
    /// 首次探测完成前的初始记录
    ///
    /// 未确认的目标按不健康处理。
    pub fn unknown(target: TargetId) -> Self {
        Self {
            target,
            is_healthy: false,
            last_checked_at: None,
            last_error: None,
            response_time_ms: None,
            status_code: None,
        }
    }

    /// 根据探测结果构建新记录
    pub fn from_probe(target: TargetId, probe: &ProbeOutcome, checked_at: DateTime<Utc>) -> Self {
        Self {
            target,
            is_healthy: probe.is_healthy(),
            last_checked_at: Some(checked_at),
            last_error: probe.outcome.failure().cloned(),
            response_time_ms: Some(probe.response_time_ms()),
            status_code: probe.status_code,
        }
    }

    /// 是否已完成过至少一次探测
    pub fn is_checked(&self) -> bool {
        self.last_checked_at.is_some()
    }
}
