// End-to-end poll cycle tests for `StationCoordinator` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voltly_core::{StationConfig, StationCoordinator};

const UID: &str = "abc123def456abc1";

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> StationConfig {
    StationConfig {
        api_base: server.uri().parse().expect("mock server uri"),
        poi_uid: UID.to_owned(),
        ..StationConfig::default()
    }
}

fn station_detail_body() -> Value {
    json!({
        "data": {
            "basic_info": { "uid": UID, "name": "Test Station", "addr": "1 Main St" },
            "charge_connector_stat": { "dc_left": 3, "ac_left": 2 },
            "tp_list": [
                {
                    "tp_id": "T1",
                    "current_charge_fee": {
                        "Time": "00:00-23:59",
                        "MarketElecPrice": 1.2,
                        "MarketServicePrice": 0.3,
                    },
                },
            ],
        }
    })
}

fn connector_detail_body(status: i64) -> Value {
    json!({
        "data": {
            "fast": [
                {
                    "connector_id": "ABCDEF123456",
                    "connector_name": "A-1",
                    "status": status,
                    "power": "120kW",
                },
            ],
            "slow": [],
        }
    })
}

async fn mount_station_detail(server: &MockServer, body: &Value) {
    Mock::given(method("GET"))
        .and(path("/charge_station/get_charge_detail"))
        .and(query_param("uid", UID))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Single cycle ────────────────────────────────────────────────────

#[tokio::test]
async fn first_cycle_decodes_aggregates_tier_and_connector() {
    let server = MockServer::start().await;
    mount_station_detail(&server, &station_detail_body()).await;

    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .and(query_param("station_id", "T1"))
        .and(query_param("tp_code", "88"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");
    let values = coordinator.refresh().await;

    assert_eq!(values.get("total_left"), Some(&json!(5)));
    assert_eq!(values.get("tp_0_price"), Some(&json!(1.5)));
    assert_eq!(values.get("tp_0_time_period"), Some(&json!("00:00-23:59")));
    assert_eq!(values.get("connector_123456"), Some(&json!("idle")));
    assert_eq!(values.get("connector_123456_power"), Some(&json!("120kW")));
    assert_eq!(values.get("uid"), Some(&json!(UID)));
    assert!(coordinator.last_refresh().is_some());
}

// ── Two cycles: stable attrs, no duplicate converters ───────────────

#[tokio::test]
async fn second_cycle_updates_status_without_duplicating_converters() {
    let server = MockServer::start().await;
    mount_station_detail(&server, &station_detail_body()).await;

    // First cycle sees the connector idle; every later cycle, occupied.
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(2)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");

    let first = coordinator.refresh().await;
    assert_eq!(first.get("connector_123456"), Some(&json!("idle")));

    let sub_before = coordinator.subscribe("connector_123456").await;

    let second = coordinator.refresh().await;
    assert_eq!(second.get("connector_123456"), Some(&json!("occupied")));

    // Same attr set, same mapping size: nothing was duplicated or renamed.
    let sub_after = coordinator.subscribe("connector_123456").await;
    assert_eq!(sub_before.attrs(), sub_after.attrs());
    assert_eq!(first.len(), second.len());
}

// ── Notification gating ─────────────────────────────────────────────

#[tokio::test]
async fn only_subscribers_of_changed_attrs_are_notified() {
    let server = MockServer::start().await;
    mount_station_detail(&server, &station_detail_body()).await;

    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(0)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.refresh().await;

    let mut connector_sub = coordinator.subscribe("connector_123456").await;
    let mut availability_sub = coordinator.subscribe("total_left").await;

    // Second cycle changes only the connector status (idle -> fault).
    coordinator.refresh().await;

    let update = connector_sub.try_next().expect("connector update");
    assert_eq!(update.get("connector_123456"), Some(&json!("fault")));
    // The full mapping is delivered, not a diff.
    assert_eq!(update.get("total_left"), Some(&json!(5)));

    assert!(availability_sub.try_next().is_none());
}

// ── Degraded fetches ────────────────────────────────────────────────

#[tokio::test]
async fn failed_station_detail_keeps_stale_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/charge_station/get_charge_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station_detail_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_charge_detail"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.refresh().await;
    let degraded = coordinator.refresh().await;

    // Keys absent from the failed cycle keep their last-known values.
    assert_eq!(degraded.get("uid"), Some(&json!(UID)));
    assert_eq!(degraded.get("addr"), Some(&json!("1 Main St")));
    assert_eq!(degraded.get("tp_0_price"), Some(&json!(1.5)));
    assert_eq!(degraded.get("connector_123456"), Some(&json!("idle")));
    // The availability aggregate is recomputed from the (empty) response.
    assert_eq!(degraded.get("total_left"), Some(&json!(0)));
}

#[tokio::test]
async fn connector_membership_never_shrinks() {
    let server = MockServer::start().await;
    mount_station_detail(&server, &station_detail_body()).await;

    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Later cycles: the connector disappears from the feed.
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "fast": [], "slow": [] } })),
        )
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");
    coordinator.refresh().await;
    let values = coordinator.refresh().await;

    // Disappearance does not delete the connector from the tree.
    assert_eq!(values.get("connector_123456"), Some(&json!("idle")));
    let snapshot = coordinator.snapshot().await;
    assert!(snapshot["connectors"].get("ABCDEF123456").is_some());
}

#[tokio::test]
async fn failed_tier_fetch_does_not_abort_the_cycle() {
    let server = MockServer::start().await;

    let two_tier_detail = json!({
        "data": {
            "charge_connector_stat": { "dc_left": 1, "ac_left": 0 },
            "tp_list": [
                { "tp_id": "T1" },
                { "tp_id": "T2" },
            ],
        }
    });
    mount_station_detail(&server, &two_tier_detail).await;

    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .and(query_param("station_id", "T1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .and(query_param("station_id", "T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(2)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");
    let values = coordinator.refresh().await;

    // T2's connector landed despite T1's failure.
    assert_eq!(values.get("connector_123456"), Some(&json!("occupied")));
    assert_eq!(values.get("total_left"), Some(&json!(1)));
}

// ── Cycle serialization ─────────────────────────────────────────────

#[tokio::test]
async fn tick_skips_while_a_cycle_is_in_flight() {
    let server = MockServer::start().await;

    // Exactly one station-detail request may arrive: the slow refresh.
    Mock::given(method("GET"))
        .and(path("/charge_station/get_charge_detail"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(station_detail_body())
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charge_station/get_connector_detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connector_detail_body(1)))
        .mount(&server)
        .await;

    let coordinator = StationCoordinator::new(config_for(&server)).expect("coordinator");

    let background = coordinator.clone();
    let refresh = tokio::spawn(async move { background.refresh().await });

    // Give the refresh time to take the pipeline lock, then tick.
    tokio::time::sleep(Duration::from_millis(100)).await;
    coordinator.tick().await;

    let values = refresh.await.expect("refresh task");
    assert_eq!(values.get("total_left"), Some(&json!(5)));
    server.verify().await;
}
