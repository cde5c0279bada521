//! HTTP探测器实现
//!
//! 对单个目标发起一次带超时的HTTP请求并对结果进行分类

use crate::error::{ProbeFailure, Result};
use crate::health::record::ProbeOutcome;
use crate::health::target::Target;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// 探测器trait，定义单次探测接口
///
/// 实现不得在内部重试，也不得修改任何共享状态。
#[async_trait]
pub trait Prober: Send + Sync {
    /// 对目标执行一次探测
    ///
    /// # 参数
    /// * `target` - 监控目标
    /// * `timeout_duration` - 探测的硬性超时上限
    ///
    /// # 返回
    /// * `ProbeOutcome` - 探测结果，任何失败都会被归类为不健康
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> ProbeOutcome;
}

/// 基于 reqwest 的HTTP探测器
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    ///
    /// 超时不在客户端上设置，而是由每次探测的调用方传入。
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self { client })
    }

    /// 判断状态码是否代表健康
    fn is_success_status(status_code: u16) -> bool {
        (200..=299).contains(&status_code)
    }

    /// 收到了响应但无法按HTTP解析
    ///
    /// hyper 的解析错误经 reqwest 包装后表现为请求错误，只能从错误链中识别。
    fn is_malformed_response(error: &reqwest::Error) -> bool {
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            let text = cause.to_string().to_ascii_lowercase();
            if text.contains("invalid http") || text.contains("message head") {
                return true;
            }
            source = cause.source();
        }
        false
    }

    /// 将reqwest错误归类为探测失败
    fn classify_request_error(error: &reqwest::Error) -> ProbeFailure {
        if error.is_timeout() {
            ProbeFailure::Timeout
        } else if Self::is_malformed_response(error) {
            ProbeFailure::ConnectionFailure("Malformed response".to_string())
        } else if error.is_connect() {
            let error_str = format!("{error:?}");
            if error_str.contains("dns") || error_str.contains("DNS") {
                ProbeFailure::ConnectionFailure("DNS resolution failed".to_string())
            } else {
                ProbeFailure::ConnectionFailure("Connection refused".to_string())
            }
        } else if error.is_request() {
            ProbeFailure::ConnectionFailure("Invalid request".to_string())
        } else if error.is_decode() || error.is_body() {
            ProbeFailure::ConnectionFailure("Malformed response".to_string())
        } else if let Some(status) = error.status() {
            ProbeFailure::BadStatus(status.as_u16())
        } else {
            // 其他类型的错误保留原始描述
            let error_str = error.to_string();
            if error_str.contains("certificate")
                || error_str.contains("tls")
                || error_str.contains("ssl")
            {
                ProbeFailure::ConnectionFailure("SSL/TLS certificate error".to_string())
            } else {
                ProbeFailure::ConnectionFailure(format!("Request failed: {error_str}"))
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> ProbeOutcome {
        let start_time = Instant::now();

        // 执行请求（带超时）
        let response_result = timeout(timeout_duration, self.client.get(&target.url).send()).await;

        let response_time = start_time.elapsed();

        match response_result {
            Ok(Ok(response)) => {
                let status_code = response.status().as_u16();
                if Self::is_success_status(status_code) {
                    ProbeOutcome::healthy(status_code, response_time)
                } else {
                    ProbeOutcome::unhealthy(ProbeFailure::BadStatus(status_code), response_time)
                }
            }
            Ok(Err(e)) => {
                ProbeOutcome::unhealthy(Self::classify_request_error(&e), response_time)
            }
            Err(_) => ProbeOutcome::unhealthy(ProbeFailure::Timeout, response_time),
        }
    }
}
