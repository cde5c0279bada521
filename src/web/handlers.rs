//! Web 路由处理函数
//!
//! 每次请求都基于存储的当前快照重新选择，不发起任何网络请求

use super::{
    AllDownResponse, AppState, HealthResponse, HealthyEndpointResponse, TargetStatus,
    TargetsResponse,
};
use crate::health::selector::select;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use tracing::debug;

/// 首选目标查询处理函数（`/healthy-endpoint` 与 `/status`）
pub async fn healthy_endpoint(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();

    match select(&snapshot, &state.registry) {
        Some(target) => {
            debug!("返回首选目标: {}", target);
            (StatusCode::OK, Json(HealthyEndpointResponse::from(&target))).into_response()
        }
        None => {
            debug!("没有可用的健康目标");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(AllDownResponse::default()),
            )
                .into_response()
        }
    }
}

/// 目标详情处理函数
pub async fn api_targets(State(state): State<AppState>) -> Json<TargetsResponse> {
    let snapshot = state.store.snapshot();
    let selected = select(&snapshot, &state.registry);

    let targets: Vec<TargetStatus> = snapshot
        .iter()
        .map(|(target, record)| TargetStatus::new(target, record))
        .collect();
    let healthy_targets = targets.iter().filter(|t| t.healthy).count();

    Json(TargetsResponse {
        total_targets: targets.len(),
        healthy_targets,
        targets,
        selected: selected.as_ref().map(HealthyEndpointResponse::from),
        last_updated: Utc::now(),
    })
}

/// 自身存活检查处理函数
pub async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now() - state.start_time;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
    })
}
