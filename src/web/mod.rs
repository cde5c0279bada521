//! Web查询接口模块
//!
//! 提供首选目标查询、目标详情和自身存活检查的HTTP接口

use crate::error::ProbeFailure;
use crate::health::record::HealthRecord;
use crate::health::store::HealthStateStore;
use crate::health::target::{Target, TargetRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod handlers;
pub mod server;

pub use server::{create_router, WebServer};

/// 全部目标不可用时的状态标识
pub const ALL_ENDPOINTS_DOWN: &str = "all_endpoints_down";

/// Web服务器共享状态
#[derive(Debug, Clone)]
pub struct AppState {
    /// 健康状态存储
    pub store: Arc<HealthStateStore>,
    /// 目标注册表
    pub registry: Arc<TargetRegistry>,
    /// 启动时间
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<HealthStateStore>) -> Self {
        Self {
            registry: Arc::clone(store.registry()),
            store,
            start_time: Utc::now(),
        }
    }
}

/// 存在健康目标时的响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthyEndpointResponse {
    /// 首选目标URL
    pub healthy_url: String,
    /// 首选目标优先级
    pub priority: u32,
}

impl From<&Target> for HealthyEndpointResponse {
    fn from(target: &Target) -> Self {
        Self {
            healthy_url: target.url.clone(),
            priority: target.priority,
        }
    }
}

/// 全部目标不可用时的响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllDownResponse {
    pub status: String,
    pub message: String,
}

impl Default for AllDownResponse {
    fn default() -> Self {
        Self {
            status: ALL_ENDPOINTS_DOWN.to_string(),
            message: "No healthy endpoints available.".to_string(),
        }
    }
}

/// 单个目标的详细状态
#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
    pub url: String,
    pub priority: u32,
    pub healthy: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_error: Option<ProbeFailure>,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
}

impl TargetStatus {
    pub fn new(target: &Target, record: &HealthRecord) -> Self {
        Self {
            url: target.url.clone(),
            priority: target.priority,
            healthy: record.is_healthy,
            last_checked_at: record.last_checked_at,
            last_error: record.last_error.clone(),
            response_time_ms: record.response_time_ms,
            status_code: record.status_code,
        }
    }
}

/// 目标详情响应
#[derive(Debug, Clone, Serialize)]
pub struct TargetsResponse {
    /// 按优先级升序排列的目标状态
    pub targets: Vec<TargetStatus>,
    /// 当前首选目标
    pub selected: Option<HealthyEndpointResponse>,
    pub total_targets: usize,
    pub healthy_targets: usize,
    pub last_updated: DateTime<Utc>,
}

/// 自身存活检查响应
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 版本信息
    pub version: String,
    /// 运行时间
    pub uptime_seconds: u64,
}
