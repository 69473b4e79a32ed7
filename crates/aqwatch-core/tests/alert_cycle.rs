//! End-to-end alert cycles against mocked feed and delivery endpoints.
//!
//! The feed and the delivery sink run as separate mock servers so each
//! side can fail independently, the way they do in production.

use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aqwatch::alerting::{
    AlertDispatcher, AlertPipeline, DeliveryChannel, DispatchError, FetchOutcome,
};
use aqwatch::models::{AlertState, Category};
use aqwatch::source::AirQualitySource;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);
const MESSAGE_MAX_LEN: usize = 160;

fn feed_body(aqi: f64) -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "data": {
            "aqi": aqi,
            "iaqi": { "pm25": { "v": aqi } },
            "time": { "iso": "2026-08-06T08:00:00+00:00" }
        }
    })
}

fn pipeline_against(feed: &MockServer, sink: &MockServer) -> AlertPipeline {
    let source = AirQualitySource::new(feed.uri(), "testville", "test-token", FETCH_TIMEOUT);
    let dispatcher = AlertDispatcher::new(
        DeliveryChannel::Webhook {
            url: format!("{}/notify", sink.uri()),
        },
        DISPATCH_TIMEOUT,
    );

    AlertPipeline::new(
        source,
        dispatcher,
        AlertState::new("testville"),
        "+15551230000",
        MESSAGE_MAX_LEN,
    )
}

async fn mount_feed(feed: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/feed/testville/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(feed)
        .await;
}

async fn mount_sink_ok(sink: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .mount(sink)
        .await;
}

#[tokio::test]
async fn first_cycle_dispatches_an_alert() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    // the token rides in the query string, exactly once per cycle
    Mock::given(method("GET"))
        .and(path("/feed/testville/"))
        .and(query_param("token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(155.0)))
        .expect(1)
        .mount(&feed)
        .await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let record = pipeline.run_cycle().await;

    assert_eq!(record.fetch_outcome, FetchOutcome::Ok);
    assert_eq!(record.category, Some(Category::Unhealthy));
    assert!(record.alerted);
    assert_eq!(
        pipeline.state().last_alerted_category,
        Some(Category::Unhealthy)
    );
    assert!(pipeline.state().last_alerted_at.is_some());
}

#[tokio::test]
async fn sustained_category_is_debounced() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    mount_feed(&feed, feed_body(155.0)).await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);

    let first = pipeline.run_cycle().await;
    assert!(first.alerted);

    let second = pipeline.run_cycle().await;
    assert_eq!(second.fetch_outcome, FetchOutcome::Ok);
    assert_eq!(second.category, Some(Category::Unhealthy));
    assert!(!second.alerted, "same category must not re-alert");
    assert_eq!(second.dispatch_outcome, None, "no dispatch was attempted");
}

#[tokio::test]
async fn category_transition_alerts_again_including_back_to_good() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed/testville/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body(155.0)))
        .up_to_n_times(1)
        .mount(&feed)
        .await;
    mount_feed(&feed, feed_body(20.0)).await;

    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);

    let first = pipeline.run_cycle().await;
    assert_eq!(first.category, Some(Category::Unhealthy));
    assert!(first.alerted);

    // conditions cleared: one closure notice goes out
    let second = pipeline.run_cycle().await;
    assert_eq!(second.category, Some(Category::Good));
    assert!(second.alerted);
    assert_eq!(pipeline.state().last_alerted_category, Some(Category::Good));
}

#[tokio::test]
async fn dispatch_failure_leaves_state_untouched_then_retries() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    mount_feed(&feed, feed_body(155.0)).await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let state_before = pipeline.state().clone();

    let record = pipeline.run_cycle().await;

    assert_eq!(record.fetch_outcome, FetchOutcome::Ok);
    assert_eq!(record.category, Some(Category::Unhealthy));
    assert!(!record.alerted);
    let outcome = record.dispatch_outcome.expect("a dispatch was attempted");
    assert!(!outcome.success);
    assert!(matches!(
        outcome.error,
        Some(DispatchError::ChannelRejected(_))
    ));
    assert_eq!(
        pipeline.state(),
        &state_before,
        "failed dispatch must not mutate alert state"
    );

    // channel recovers: the same alert goes out on the next trigger
    sink.reset().await;
    mount_sink_ok(&sink).await;

    let retried = pipeline.run_cycle().await;
    assert!(retried.alerted, "undelivered alert is retried next cycle");
    assert_eq!(
        pipeline.state().last_alerted_category,
        Some(Category::Unhealthy)
    );
}

#[tokio::test]
async fn missing_pollutant_field_means_no_alert_and_no_mutation() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    mount_feed(
        &feed,
        serde_json::json!({
            "status": "ok",
            "data": { "aqi": 42, "iaqi": { "o3": { "v": 8.0 } } }
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let record = pipeline.run_cycle().await;

    assert_eq!(record.fetch_outcome, FetchOutcome::MalformedResponse);
    assert_eq!(record.category, None);
    assert!(!record.alerted);
    assert_eq!(record.dispatch_outcome, None);
    assert_eq!(pipeline.state().last_alerted_category, None);
}

#[tokio::test]
async fn feed_error_status_means_no_alert() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    mount_feed(
        &feed,
        serde_json::json!({ "status": "error", "data": "Unknown station" }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let record = pipeline.run_cycle().await;

    assert_eq!(record.fetch_outcome, FetchOutcome::MalformedResponse);
    assert!(!record.alerted);
}

#[tokio::test]
async fn feed_server_error_is_a_network_outcome() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed/testville/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&feed)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let record = pipeline.run_cycle().await;

    assert_eq!(record.fetch_outcome, FetchOutcome::Network);
    assert_eq!(record.category, None);
    assert!(!record.alerted);
    assert_eq!(pipeline.state().last_alerted_category, None);
}

#[tokio::test]
async fn slow_feed_is_a_timeout_outcome() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed/testville/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(feed_body(155.0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&feed)
        .await;

    let source = AirQualitySource::new(
        feed.uri(),
        "testville",
        "test-token",
        Duration::from_millis(200),
    );
    let dispatcher = AlertDispatcher::new(
        DeliveryChannel::Webhook {
            url: format!("{}/notify", sink.uri()),
        },
        DISPATCH_TIMEOUT,
    );
    let mut pipeline = AlertPipeline::new(
        source,
        dispatcher,
        AlertState::new("testville"),
        "+15551230000",
        MESSAGE_MAX_LEN,
    );

    let record = pipeline.run_cycle().await;
    assert_eq!(record.fetch_outcome, FetchOutcome::Timeout);
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_failure() {
    let feed = MockServer::start().await;
    let sink = MockServer::start().await;

    mount_feed(&feed, feed_body(210.0)).await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&sink)
        .await;

    let mut pipeline = pipeline_against(&feed, &sink);
    let record = pipeline.run_cycle().await;

    assert_eq!(record.category, Some(Category::VeryUnhealthy));
    assert!(!record.alerted);
    let outcome = record.dispatch_outcome.expect("a dispatch was attempted");
    assert_eq!(outcome.error, Some(DispatchError::AuthFailure(401)));
    assert_eq!(pipeline.state().last_alerted_category, None);
}
