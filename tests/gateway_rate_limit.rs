//! Tiered rate limiting through the full router.

use std::time::Duration;

use agent_gateway::security::SecurityEventKind;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};

mod common;
use common::{config, get, get_with_key, header, json_body, TestApp, TEST_KEY};

#[tokio::test(start_paused = true)]
async fn api_tier_rejects_the_51st_request() {
    let app = TestApp::new(config());

    for i in 1..=50 {
        let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
        assert_eq!(res.status(), StatusCode::OK, "request {i}");
        assert_eq!(header(&res, "ratelimit-limit"), Some("50"));
        let remaining = (50 - i).to_string();
        assert_eq!(header(&res, "ratelimit-remaining"), Some(remaining.as_str()));
    }

    let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&res, "ratelimit-remaining"), Some("0"));
    assert_eq!(header(&res, "retry-after"), Some("900"));
    assert_eq!(
        json_body(res).await["error"],
        "Too many requests, please try again later."
    );

    let events = app.events.events();
    let rejected: Vec<_> = events
        .iter()
        .filter(|e| e.kind == SecurityEventKind::RateLimitExceeded)
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].details["tier"], "api");
    assert_eq!(rejected[0].details["limit"], 50);
    assert_eq!(rejected[0].details["window_secs"], 900);
    assert_eq!(rejected[0].details["endpoint"], "/api/agents");
    assert_eq!(rejected[0].request.ip, "10.0.0.1");

    // the rejected request never reached authentication
    assert_eq!(app.events.count(SecurityEventKind::AuthSuccess), 50);
}

#[tokio::test(start_paused = true)]
async fn general_tier_applies_on_top_of_api_tier() {
    let mut cfg = config();
    cfg.rate_limit.general.max_requests = 5;
    cfg.rate_limit.api.max_requests = 1_000;
    let app = TestApp::new(cfg);

    for _ in 0..5 {
        let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&res, "ratelimit-limit"), Some("5"));

    let rejected = app
        .events
        .events()
        .into_iter()
        .find(|e| e.kind == SecurityEventKind::RateLimitExceeded)
        .unwrap();
    assert_eq!(rejected.details["tier"], "general");
}

#[tokio::test(start_paused = true)]
async fn unknown_routes_spend_general_quota() {
    let mut cfg = config();
    cfg.rate_limit.general.max_requests = 2;
    let app = TestApp::new(cfg);

    assert_eq!(app.send(get("/nope")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.send(get("/nope")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.send(get("/nope")).await.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn counter_resets_after_the_window() {
    let mut cfg = config();
    cfg.rate_limit.api.max_requests = 3;
    let app = TestApp::new(cfg);

    for _ in 0..3 {
        assert_eq!(
            app.send(get_with_key("/api/agents", TEST_KEY)).await.status(),
            StatusCode::OK
        );
    }
    assert_eq!(
        app.send(get_with_key("/api/agents", TEST_KEY)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::advance(Duration::from_secs(15 * 60)).await;

    let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(&res, "ratelimit-remaining"), Some("2"));
}

#[tokio::test(start_paused = true)]
async fn health_is_admitted_after_exhaustion() {
    let mut cfg = config();
    cfg.rate_limit.general.max_requests = 2;
    let app = TestApp::new(cfg);

    for _ in 0..3 {
        app.send(get_with_key("/api/agents", TEST_KEY)).await;
    }
    assert_eq!(
        app.send(get_with_key("/api/agents", TEST_KEY)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    for _ in 0..10 {
        let res = app.send(get("/health")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(header(&res, "ratelimit-limit").is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn disabled_tier_sets_no_headers() {
    let mut cfg = config();
    cfg.rate_limit.general.max_requests = 0;
    cfg.rate_limit.api.max_requests = 0;
    let app = TestApp::new(cfg);

    for _ in 0..200 {
        let res = app.send(get_with_key("/api/agents", TEST_KEY)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(header(&res, "ratelimit-limit").is_none());
    }
}

fn forwarded(path: &str, xff: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-api-key", TEST_KEY)
        .header("x-forwarded-for", xff)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn forged_forwarding_entries_do_not_mint_new_counters() {
    let mut cfg = config();
    cfg.proxy.trusted_hops = 1;
    cfg.rate_limit.api.max_requests = 2;
    let app = TestApp::new(cfg);

    // the trusted proxy appends the real client, 203.0.113.9, on the right
    assert_eq!(
        app.send(forwarded("/api/agents", "1.1.1.1, 203.0.113.9")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.send(forwarded("/api/agents", "2.2.2.2, 203.0.113.9")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.send(forwarded("/api/agents", "3.3.3.3, 203.0.113.9:5555")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // a different real client has its own quota
    assert_eq!(
        app.send(forwarded("/api/agents", "198.51.100.4")).await.status(),
        StatusCode::OK
    );

    let rejected = app
        .events
        .events()
        .into_iter()
        .find(|e| e.kind == SecurityEventKind::RateLimitExceeded)
        .unwrap();
    assert_eq!(rejected.request.ip, "203.0.113.9");
}

#[tokio::test(start_paused = true)]
async fn without_trusted_hops_forwarding_headers_are_ignored() {
    let mut cfg = config();
    cfg.rate_limit.api.max_requests = 2;
    let app = TestApp::new(cfg);

    app.send(forwarded("/api/agents", "1.1.1.1")).await;
    app.send(forwarded("/api/agents", "2.2.2.2")).await;
    let res = app.send(forwarded("/api/agents", "3.3.3.3")).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.state.api_limiter.tracked_keys(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn parallel_requests_at_the_boundary_admit_exactly_the_ceiling() {
    let app = TestApp::new(config());

    let tasks: Vec<_> = (0..120)
        .map(|_| {
            let router = app.router.clone();
            tokio::spawn(async move {
                use tower::ServiceExt;
                router
                    .oneshot(get_with_key("/api/agents", TEST_KEY))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut ok = 0;
    let mut limited = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(ok, 50);
    assert_eq!(limited, 70);
    assert_eq!(app.events.count(SecurityEventKind::RateLimitExceeded), 70);
}
