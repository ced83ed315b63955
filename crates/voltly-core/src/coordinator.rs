// ── Station poll coordinator ──
//
// One coordinator per configured station. Owns the long-lived state tree
// and converter registry exclusively; everything mutable sits behind a
// single pipeline mutex, which is also what serializes manual refreshes
// against the periodic timer. A tick that finds the previous cycle still
// running skips instead of overlapping.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future;
use serde_json::{Map, Number, Value};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use voltly_api::{ChargeClient, TransportConfig};

use crate::config::StationConfig;
use crate::convert::FlatValues;
use crate::error::CoreError;
use crate::registry::ConverterRegistry;
use crate::station::{Connector, PricingTier};
use crate::subscribe::{StateSubscriber, Subscription};

// ── Coordinator ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Fetches the station and connector detail
/// documents, merges them into the per-station state tree, grows the
/// converter registry for newly observed tiers/connectors, decodes the
/// flat value mapping, and notifies subscribers whose fields changed.
#[derive(Clone)]
pub struct StationCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: StationConfig,
    client: ChargeClient,
    pipeline: Mutex<Pipeline>,
    subscribers: Mutex<Vec<Arc<dyn StateSubscriber>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Everything a poll cycle mutates, owned together so one lock covers it.
struct Pipeline {
    /// Merged per-station document, accumulated across cycles.
    tree: Value,
    registry: ConverterRegistry,
    last_values: Arc<FlatValues>,
}

impl Pipeline {
    fn tree_mut(&mut self) -> &mut Map<String, Value> {
        match &mut self.tree {
            Value::Object(map) => map,
            _ => unreachable!("state tree is always an object"),
        }
    }
}

/// Connector-detail request parameters derived from one pricing tier.
struct TierRequest {
    index: usize,
    id: String,
    tp_code: i64,
    total_price: f64,
}

impl StationCoordinator {
    /// Create a coordinator for one station. Does NOT start polling --
    /// call [`start()`](Self::start), or drive cycles yourself via
    /// [`refresh()`](Self::refresh) / [`tick()`](Self::tick).
    pub fn new(config: StationConfig) -> Result<Self, CoreError> {
        if config.poi_uid.is_empty() {
            return Err(CoreError::Config {
                message: "station poi_uid must not be empty".into(),
            });
        }

        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let client = ChargeClient::new(config.api_base.clone(), &transport)?;
        let (last_refresh, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                pipeline: Mutex::new(Pipeline {
                    tree: Value::Object(Map::new()),
                    registry: ConverterRegistry::with_station_defaults(),
                    last_values: Arc::new(FlatValues::new()),
                }),
                subscribers: Mutex::new(Vec::new()),
                last_refresh,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        })
    }

    /// The station configuration.
    pub fn config(&self) -> &StationConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run an initial refresh, then spawn the periodic poll task.
    /// Idempotent: a second call refreshes but does not spawn twice.
    pub async fn start(&self) -> Arc<FlatValues> {
        let values = self.refresh().await;

        let mut task = self.inner.task.lock().await;
        if task.is_none() {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            let interval = self.inner.config.poll_interval;
            *task = Some(tokio::spawn(poll_task(coordinator, interval, cancel)));
            info!(uid = %self.inner.config.poi_uid, "station polling started");
        }
        values
    }

    /// Cancel the poll task and wait for it to finish.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        debug!("station polling stopped");
    }

    // ── Cycle entry points ───────────────────────────────────────────

    /// On-demand refresh. Serializes with the periodic timer: if a cycle
    /// is in flight this waits for it, then runs its own.
    pub async fn refresh(&self) -> Arc<FlatValues> {
        let mut pipeline = self.inner.pipeline.lock().await;
        self.run_cycle(&mut pipeline).await
    }

    /// Scheduler entry point. A cycle still running when the next is due
    /// is skipped, not overlapped.
    pub async fn tick(&self) {
        let Ok(mut pipeline) = self.inner.pipeline.try_lock() else {
            debug!("previous cycle still in flight; skipping tick");
            return;
        };
        self.run_cycle(&mut pipeline).await;
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to changes of `attr` and its dependent fields.
    ///
    /// The subscription set is computed from the current registry
    /// snapshot; converters registered later are not picked up.
    pub async fn subscribe(&self, attr: &str) -> Subscription {
        let attrs = self.inner.pipeline.lock().await.registry.subscribe_attrs(attr);
        let (subscription, subscriber) = Subscription::new(attrs);
        self.inner.subscribers.lock().await.push(subscriber);
        subscription
    }

    /// Register a custom subscriber implementation.
    pub async fn add_subscriber(&self, subscriber: Arc<dyn StateSubscriber>) {
        self.inner.subscribers.lock().await.push(subscriber);
    }

    /// The most recent decoded mapping (empty before the first cycle).
    pub async fn values(&self) -> Arc<FlatValues> {
        Arc::clone(&self.inner.pipeline.lock().await.last_values)
    }

    /// A copy of the merged state tree.
    pub async fn snapshot(&self) -> Value {
        self.inner.pipeline.lock().await.tree.clone()
    }

    /// When the last cycle completed, or `None` if never.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh.borrow()
    }

    /// Watch channel for cycle completions.
    pub fn last_refresh_changes(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.last_refresh.subscribe()
    }

    // ── The poll cycle ───────────────────────────────────────────────

    async fn run_cycle(&self, pipeline: &mut Pipeline) -> Arc<FlatValues> {
        let uid = &self.inner.config.poi_uid;

        // 1. Station detail. Failure degrades to an empty document so the
        //    cycle continues with last-known values for everything else.
        let mut data = match self.inner.client.station_detail(uid).await {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "station detail fetch failed");
                Map::new()
            }
        };

        // 2-3. Computed aggregates, and the tier list for fan-out.
        let tiers = apply_aggregates(&mut data);
        for tier in &tiers {
            pipeline.registry.ensure_tier(tier.index);
        }

        // 5a. Shallow top-level merge: present keys overwrite, absent
        //     keys keep their previous value.
        for (key, value) in data {
            pipeline.tree_mut().insert(key, value);
        }

        // 4. Connector detail per tier, concurrently; the join is the
        //    barrier before connector registration and decode.
        let fetches = tiers
            .iter()
            .map(|tier| self.inner.client.connector_detail(uid, &tier.id, tier.tp_code));
        let results = future::join_all(fetches).await;

        let mut seen: Vec<(String, Option<String>, Value)> = Vec::new();
        for (tier, result) in tiers.iter().zip(results) {
            let detail = match result {
                Ok(detail) => detail,
                Err(err) => {
                    // One failed tier does not stop the others.
                    warn!(tier = %tier.id, error = %err, "connector detail fetch failed");
                    continue;
                }
            };
            for list_key in ["fast", "slow"] {
                let Some(Value::Array(list)) = detail.get(list_key) else {
                    continue;
                };
                for value in list {
                    let Some(conn) = Connector::new(value) else { continue };
                    let Some(cid) = conn.id() else { continue };
                    seen.push((cid.to_owned(), conn.name().map(str::to_owned), value.clone()));
                }
            }
        }

        // 5b. The connectors map grows monotonically in membership; a
        //     known ID has its object replaced wholesale so its fields
        //     always reflect a single fetch snapshot.
        {
            let connectors = pipeline
                .tree_mut()
                .entry("connectors")
                .or_insert(Value::Object(Map::new()));
            if let Value::Object(map) = connectors {
                for (cid, _, value) in &seen {
                    map.insert(cid.clone(), value.clone());
                }
            }
        }
        for (cid, name, _) in &seen {
            pipeline.registry.ensure_connector(cid, name.as_deref());
        }

        // 6-7. Decode the full registry, then notify subscribers whose
        //      fields changed since the previous pass.
        let values = Arc::new(pipeline.registry.decode_all(&pipeline.tree));
        let changed: Vec<&str> = values
            .iter()
            .filter(|&(attr, value)| pipeline.last_values.get(attr.as_str()) != Some(value))
            .map(|(attr, _)| attr.as_str())
            .collect();

        if !changed.is_empty() {
            self.notify(&changed, &values).await;
        }

        debug!(
            attrs = values.len(),
            changed = changed.len(),
            connectors = seen.len(),
            "poll cycle complete"
        );
        pipeline.last_values = Arc::clone(&values);
        let _ = self.inner.last_refresh.send(Some(Utc::now()));
        values
    }

    async fn notify(&self, changed: &[&str], values: &Arc<FlatValues>) {
        let mut subscribers = self.inner.subscribers.lock().await;
        subscribers.retain(|sub| !sub.is_closed());
        for sub in subscribers.iter() {
            let woken = sub
                .subscribed_attrs()
                .iter()
                .any(|attr| changed.contains(&attr.as_str()));
            if woken {
                // Full mapping, not a diff: each subscriber reads only
                // the fields it cares about.
                sub.on_update(values);
            }
        }
    }
}

// ── Aggregate computation ────────────────────────────────────────────

/// Insert the computed `total_left` and per-tier `total_price` fields
/// into a fresh station detail document, and derive the connector-detail
/// request parameters for every addressable tier. Tiers without a usable
/// ID are skipped entirely.
fn apply_aggregates(data: &mut Map<String, Value>) -> Vec<TierRequest> {
    let stat = data.get("charge_connector_stat");
    let total_left = field_f64(stat, "dc_left") + field_f64(stat, "ac_left");
    data.insert("total_left".to_owned(), number(total_left));

    let mut requests = Vec::new();
    if let Some(Value::Array(tiers)) = data.get("tp_list") {
        for (index, value) in tiers.iter().enumerate() {
            let Some(tier) = PricingTier::new(index, value) else {
                continue;
            };
            let Some(id) = tier.id() else { continue };
            let fees = value.get("current_charge_fee");
            let total_price =
                field_f64(fees, "MarketElecPrice") + field_f64(fees, "MarketServicePrice");
            requests.push(TierRequest {
                index,
                id: id.to_owned(),
                tp_code: tier.tp_code(),
                total_price,
            });
        }
    }

    if let Some(Value::Array(tiers)) = data.get_mut("tp_list") {
        for request in &requests {
            if let Some(obj) = tiers.get_mut(request.index).and_then(Value::as_object_mut) {
                obj.insert("total_price".to_owned(), number(request.total_price));
            }
        }
    }
    requests
}

/// Numeric field lookup with a zero default for missing/unparseable data.
fn field_f64(node: Option<&Value>, key: &str) -> f64 {
    node.and_then(|v| v.get(key))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
}

/// Represent an integral sum as an integer so decoded output stays clean.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Drive `tick()` on a fixed interval until cancelled.
async fn poll_task(
    coordinator: StationCoordinator,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => coordinator.tick().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn total_left_sums_dc_and_ac() {
        let mut data = as_map(json!({
            "charge_connector_stat": { "dc_left": 3, "ac_left": 2 }
        }));
        apply_aggregates(&mut data);
        assert_eq!(data["total_left"], json!(5));
    }

    #[test]
    fn total_left_treats_missing_fields_as_zero() {
        let mut data = as_map(json!({ "charge_connector_stat": { "dc_left": 4 } }));
        apply_aggregates(&mut data);
        assert_eq!(data["total_left"], json!(4));

        let mut empty = Map::new();
        apply_aggregates(&mut empty);
        assert_eq!(empty["total_left"], json!(0));
    }

    #[test]
    fn tier_total_price_sums_market_fees() {
        let mut data = as_map(json!({
            "tp_list": [
                {
                    "tp_id": "T1",
                    "current_charge_fee": {
                        "MarketElecPrice": 1.2,
                        "MarketServicePrice": 0.3,
                    },
                },
            ]
        }));
        let requests = apply_aggregates(&mut data);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "T1");
        assert_eq!(requests[0].tp_code, 88);
        assert_eq!(data["tp_list"][0]["total_price"], json!(1.5));
    }

    #[test]
    fn tier_without_id_is_skipped() {
        let mut data = as_map(json!({
            "tp_list": [
                { "current_charge_fee": { "MarketElecPrice": 9.0 } },
                { "tp_id": "", "current_charge_fee": {} },
                { "tp_id": "T2", "tp_code": 3 },
            ]
        }));
        let requests = apply_aggregates(&mut data);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "T2");
        assert_eq!(requests[0].index, 2);
        assert_eq!(requests[0].tp_code, 3);
        assert!(data["tp_list"][0].get("total_price").is_none());
        assert_eq!(data["tp_list"][2]["total_price"], json!(0));
    }

    #[test]
    fn coordinator_rejects_empty_uid() {
        let config = StationConfig::default();
        assert!(matches!(
            StationCoordinator::new(config),
            Err(CoreError::Config { .. })
        ));
    }
}
