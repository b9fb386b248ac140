//! End-to-end chaos injection through a running proxy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chaos_proxy::admin::{setup_admin_router, AdminState};
use chaos_proxy::chaos::ChaosErrorBody;
use chaos_proxy::config::{ChaosConfig, ChaosTarget, FrequencyStrategy};
use chaos_proxy::ChaosEngine;

mod common;

/// Chaos on, every eligible request triggers, no faults toggled yet.
fn always() -> ChaosConfig {
    let mut config = ChaosConfig::default();
    config.enabled = true;
    config.frequency.strategy = FrequencyStrategy::Percentage;
    config.frequency.percentage = 100;
    config
}

#[tokio::test]
async fn injected_404_short_circuits_upstream() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.error_404 = true;
    let proxy = common::start_proxy(upstream.addr, chaos).await;

    let res = common::client()
        .get(proxy.url("/api/orders"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 404);
    assert!(res.headers().contains_key("x-request-id"));
    let body: ChaosErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "Not Found");
    assert_eq!(body.message, "Chaos Engineering: 404 injected");
    assert_eq!(body.path, "/api/orders");
    assert!(body.timestamp.ends_with('Z'));
    assert_eq!(upstream.hits(), 0);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn excluded_paths_pass_through() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.error_500 = true;
    let proxy = common::start_proxy(upstream.addr, chaos).await;
    let client = common::client();

    // Local health route, never chaos.
    let res = client.get(proxy.url("/health/live")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Healthy");

    // Excluded static asset, forwarded untouched.
    let res = client.get(proxy.url("/css/site.css")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "upstream");
    assert_eq!(upstream.hits(), 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn every_third_request_fails() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.error_503 = true;
    chaos.frequency.strategy = FrequencyStrategy::EveryNRequests;
    chaos.frequency.every_n_requests = 3;
    let proxy = common::start_proxy(upstream.addr, chaos).await;
    let client = common::client();

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let res = client.get(proxy.url("/api/items")).send().await.unwrap();
        statuses.push(res.status().as_u16());
    }

    assert_eq!(statuses, vec![200, 200, 503, 200, 200, 503]);
    assert_eq!(upstream.hits(), 4);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn target_filters_by_context() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.error_500 = true;
    chaos.target = ChaosTarget::WebApi;
    let proxy = common::start_proxy(upstream.addr, chaos).await;
    let client = common::client();

    let res = client.get(proxy.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(proxy.url("/API/products")).send().await.unwrap();
    assert_eq!(res.status(), 500);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn slow_response_delays_after_forwarding() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.slow_response = true;
    chaos.fixed.slow_response_ms = 300;
    let proxy = common::start_proxy(upstream.addr, chaos).await;

    let start = Instant::now();
    let res = common::client().get(proxy.url("/api/slow")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "upstream");
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(upstream.hits(), 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn high_latency_delays_before_forwarding() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.faults.high_latency = true;
    chaos.fixed.latency_ms = 250;
    let proxy = common::start_proxy(upstream.addr, chaos).await;

    let start = Instant::now();
    let res = common::client().get(proxy.url("/page")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(start.elapsed() >= Duration::from_millis(250));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn disabled_chaos_is_passthrough() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.enabled = false;
    chaos.faults.error_500 = true;
    let proxy = common::start_proxy(upstream.addr, chaos).await;
    let client = common::client();

    for _ in 0..5 {
        let res = client.get(proxy.url("/api/x")).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }
    assert_eq!(upstream.hits(), 5);
    assert_eq!(proxy.engine.decider().state().request_count(), 0);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let proxy = common::start_proxy(dead, ChaosConfig::default()).await;
    let res = common::client().get(proxy.url("/api/x")).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn reloaded_config_takes_effect() {
    let upstream = common::start_mock_upstream("upstream").await;
    let proxy = common::start_proxy(upstream.addr, ChaosConfig::default()).await;
    let client = common::client();

    let res = client.get(proxy.url("/api/x")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let mut reloaded = always();
    reloaded.faults.error_429 = true;
    proxy.updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(proxy.url("/api/x")).send().await.unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(res.headers()["retry-after"], "60");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn reloaded_values_are_clamped() {
    let upstream = common::start_mock_upstream("upstream").await;
    let proxy = common::start_proxy(upstream.addr, ChaosConfig::default()).await;

    let mut reloaded = always();
    reloaded.faults.high_memory = true;
    reloaded.fixed.memory_size_mb = 4_000_000_000;
    reloaded.fixed.slow_response_ms = u32::MAX;
    reloaded.frequency.every_n_seconds = 0;
    proxy.updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let live = proxy.engine.config();
    assert!(live.faults.high_memory);
    assert_eq!(live.fixed.memory_size_mb, 2_000);
    assert_eq!(live.fixed.slow_response_ms, 60_000);
    assert_eq!(live.frequency.every_n_seconds, 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn admin_updates_reach_the_proxy() {
    let upstream = common::start_mock_upstream("upstream").await;
    let proxy = common::start_proxy(upstream.addr, ChaosConfig::default()).await;

    let admin_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let router = setup_admin_router(AdminState::new(Arc::clone(&proxy.engine), "secret"));
    tokio::spawn(async move {
        let _ = axum::serve(admin_listener, router).await;
    });

    let client = common::client();
    let admin = format!("http://{admin_addr}/admin/chaos");

    let res = client.get(&admin).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let mut chaos = always();
    chaos.faults.stack_overflow = true;
    let res = client
        .put(&admin)
        .bearer_auth("secret")
        .json(&chaos)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(&admin).bearer_auth("secret").send().await.unwrap();
    let live: ChaosConfig = res.json().await.unwrap();
    assert_eq!(live, chaos);

    let res = client.get(proxy.url("/api/deep")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body: ChaosErrorBody = res.json().await.unwrap();
    assert_eq!(body.simulated.as_deref(), Some("stack_overflow"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn engine_shared_across_requests_counts_every_eligible_call() {
    let upstream = common::start_mock_upstream("upstream").await;
    let mut chaos = always();
    chaos.frequency.strategy = FrequencyStrategy::EveryNRequests;
    chaos.frequency.every_n_requests = 1000;
    chaos.faults.error_500 = true;
    let proxy = common::start_proxy(upstream.addr, chaos).await;
    let client = common::client();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let client = client.clone();
        let url = proxy.url("/api/concurrent");
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.map(|r| r.status().as_u16())
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 200);
    }

    let engine: &Arc<ChaosEngine> = &proxy.engine;
    assert_eq!(engine.decider().state().request_count(), 20);

    proxy.shutdown.trigger();
}
