//! 端到端测试
//!
//! 启动完整服务（调度器、切换监视、Web服务器），通过HTTP接口验证故障切换行为

use health_guardian::config::{Config, WebConfig};
use health_guardian::core::{RunningService, ServiceLauncher};
use health_guardian::health::TargetId;
use health_guardian::web::{AllDownResponse, HealthyEndpointResponse};
use mockito::Matcher;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// 获取一个当前空闲的本地端口
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn test_config(targets: Vec<String>) -> Config {
    Config {
        targets,
        check_interval_seconds: 1,
        request_timeout_seconds: 1,
        web: WebConfig {
            bind_address: "127.0.0.1".to_string(),
            port: free_port(),
        },
        ..Config::default()
    }
}

async fn start(config: Config) -> RunningService {
    ServiceLauncher::new(config).start().await.unwrap()
}

/// 查询首选目标，返回状态码和响应体
async fn query(service: &RunningService, path: &str) -> (u16, serde_json::Value) {
    let response = reqwest::get(format!("http://{}{}", service.local_addr(), path))
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

/// 轮询直到首选目标等于期望值，返回等待时间
async fn wait_for_healthy_url(
    service: &RunningService,
    expected: Option<&str>,
    limit: Duration,
) -> Duration {
    let started = Instant::now();
    loop {
        let (status, body) = query(service, "/healthy-endpoint").await;
        let current = if status == 200 {
            body["healthy_url"].as_str().map(str::to_string)
        } else {
            None
        };
        if current.as_deref() == expected {
            return started.elapsed();
        }
        assert!(
            started.elapsed() < limit,
            "等待 {expected:?} 超时，当前 {status} {body}"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// 接受连接但从不响应的目标
async fn hung_target() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}/health"), handle)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_both_healthy_reports_primary() {
    let mut server = mockito::Server::new_async().await;
    let _a = server.mock("GET", "/a").with_status(200).create_async().await;
    let _b = server.mock("GET", "/b").with_status(200).create_async().await;
    let a = format!("{}/a", server.url());
    let b = format!("{}/b", server.url());

    let service = start(test_config(vec![a.clone(), b])).await;
    wait_for_healthy_url(&service, Some(&a), Duration::from_secs(3)).await;

    let (status, body) = query(&service, "/status").await;
    assert_eq!(status, 200);
    let answer: HealthyEndpointResponse = serde_json::from_value(body).unwrap();
    assert_eq!(
        answer,
        HealthyEndpointResponse {
            healthy_url: a,
            priority: 1,
        }
    );

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unhealthy_primary_reports_secondary() {
    let mut server = mockito::Server::new_async().await;
    let _a = server.mock("GET", "/a").with_status(500).create_async().await;
    let _b = server.mock("GET", "/b").with_status(200).create_async().await;
    let b = format!("{}/b", server.url());

    let service = start(test_config(vec![format!("{}/a", server.url()), b.clone()])).await;
    wait_for_healthy_url(&service, Some(&b), Duration::from_secs(3)).await;

    let (_, body) = query(&service, "/healthy-endpoint").await;
    assert_eq!(body["priority"], 2);

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_all_unhealthy_reports_503() {
    let mut server = mockito::Server::new_async().await;
    let _a = server.mock("GET", "/a").with_status(503).create_async().await;
    let _b = server.mock("GET", "/b").with_status(404).create_async().await;

    let service = start(test_config(vec![
        format!("{}/a", server.url()),
        format!("{}/b", server.url()),
    ]))
    .await;

    // 等待两个目标都完成首次探测
    let started = Instant::now();
    while !service
        .store()
        .snapshot()
        .iter()
        .all(|(_, record)| record.is_checked())
    {
        assert!(started.elapsed() < Duration::from_secs(3));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let (status, body) = query(&service, "/healthy-endpoint").await;
    assert_eq!(status, 503);
    let answer: AllDownResponse = serde_json::from_value(body).unwrap();
    assert_eq!(answer, AllDownResponse::default());

    // 详情接口保留失败原因
    let (status, details) = query(&service, "/api/v1/targets").await;
    assert_eq!(status, 200);
    assert_eq!(details["targets"][0]["last_error"]["kind"], "bad_status");
    assert_eq!(details["targets"][1]["status_code"], 404);
    assert!(details["selected"].is_null());

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failover_within_interval_plus_timeout() {
    let mut server = mockito::Server::new_async().await;
    let a_mock = server.mock("GET", "/a").with_status(200).create_async().await;
    let _b = server.mock("GET", "/b").with_status(200).create_async().await;
    let a = format!("{}/a", server.url());
    let b = format!("{}/b", server.url());

    let config = test_config(vec![a.clone(), b.clone()]);
    let bound = Duration::from_secs(config.check_interval_seconds + config.request_timeout_seconds);
    let service = start(config).await;
    wait_for_healthy_url(&service, Some(&a), Duration::from_secs(3)).await;

    // 删除mock后 /a 返回 501
    a_mock.remove_async().await;
    let waited = wait_for_healthy_url(&service, Some(&b), bound + Duration::from_secs(1)).await;
    assert!(waited <= bound + Duration::from_millis(500), "切换耗时 {waited:?}");

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hung_target_is_bounded_by_timeout() {
    let (hung_url, hung_handle) = hung_target().await;
    let mut server = mockito::Server::new_async().await;
    let _b = server.mock("GET", "/b").with_status(200).create_async().await;
    let b = format!("{}/b", server.url());

    let started = Instant::now();
    let service = start(test_config(vec![hung_url, b.clone()])).await;

    // 挂起的目标不影响其他目标
    let waited = wait_for_healthy_url(&service, Some(&b), Duration::from_secs(1)).await;
    assert!(waited < Duration::from_secs(1));

    // 首次探测在超时后被记为不健康
    loop {
        if let Some(record) = service.store().record(TargetId(0)) {
            if record.is_checked() {
                assert!(!record.is_healthy);
                break;
            }
        }
        assert!(
            started.elapsed() < Duration::from_millis(1800),
            "挂起目标的探测未在超时内结束"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let (_, details) = query(&service, "/api/v1/targets").await;
    assert_eq!(details["targets"][0]["last_error"]["kind"], "timeout");

    service.shutdown().await.unwrap();
    hung_handle.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_webhook_notified_on_primary_change() {
    let mut server = mockito::Server::new_async().await;
    let _a = server.mock("GET", "/a").with_status(200).create_async().await;
    let a = format!("{}/a", server.url());
    let hook = server
        .mock("POST", "/hook")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "event_type": "healthy_url_changed",
            "previous_healthy_url": null,
            "current_healthy_url": a,
            "current_healthy_url_priority": 1
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let mut config = test_config(vec![a.clone()]);
    config.webhook_url = Some(format!("{}/hook", server.url()));
    let service = start(config).await;
    wait_for_healthy_url(&service, Some(&a), Duration::from_secs(3)).await;

    let started = Instant::now();
    while !hook.matched_async().await {
        assert!(started.elapsed() < Duration::from_secs(3), "未收到webhook通知");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(service.watcher().current().map(|t| t.url), Some(a));

    // 再运行几个周期，首选目标不变时不重复通知
    tokio::time::sleep(Duration::from_millis(1500)).await;
    hook.assert_async().await;

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_configuration_is_fatal() {
    let result = ServiceLauncher::new(test_config(Vec::new())).start().await;
    assert!(result.is_err());

    let result = ServiceLauncher::new(test_config(vec!["not-a-url".to_string()]))
        .start()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let _a = server.mock("GET", "/a").with_status(200).create_async().await;

    let service = start(test_config(vec![format!("{}/a", server.url())])).await;
    let (status, body) = query(&service, "/api/v1/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], health_guardian::VERSION);

    service.shutdown().await.unwrap();
}
