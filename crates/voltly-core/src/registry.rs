// ── Converter registry ──
//
// Keyed by attr, iterated in insertion order so decode output stays
// stable across cycles. The registry starts with the static station
// fields and grows at runtime as tiers and connectors are observed
// (see `station.rs`).

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::convert::{Converter, FlatValues};
use crate::path::get_value;

/// Registry of field converters for one station.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    converters: indexmap::IndexMap<String, Converter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the static station fields.
    pub fn with_station_defaults() -> Self {
        let mut registry = Self::new();
        for conv in station_defaults() {
            registry.register(conv);
        }
        registry
    }

    // ── Mutation & lookup ────────────────────────────────────────────

    /// Insert a converter keyed by its attr. Re-registering the same attr
    /// overwrites -- last write wins.
    pub fn register(&mut self, conv: Converter) {
        self.converters.insert(conv.attr.clone(), conv);
    }

    pub fn get(&self, attr: &str) -> Option<&Converter> {
        self.converters.get(attr)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.converters.contains_key(attr)
    }

    /// All converters in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Converter> {
        self.converters.values()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// The set of attrs whose change should wake an observer of `attr`:
    /// the attr itself, its declared children, and every converter whose
    /// parent link points back at it. Computed from the current registry
    /// snapshot.
    pub fn subscribe_attrs(&self, attr: &str) -> BTreeSet<String> {
        let mut attrs = BTreeSet::new();
        attrs.insert(attr.to_owned());
        if let Some(conv) = self.converters.get(attr) {
            attrs.extend(conv.children.iter().cloned());
        }
        attrs.extend(
            self.converters
                .values()
                .filter(|c| c.parent.as_deref() == Some(attr))
                .map(|c| c.attr.clone()),
        );
        attrs
    }

    // ── Decode ───────────────────────────────────────────────────────

    /// Run every registered converter against the state tree.
    ///
    /// Converters whose path does not resolve still execute with no
    /// value, so every registered attr always appears in the output.
    pub fn decode_all(&self, tree: &Value) -> FlatValues {
        let mut values = FlatValues::with_capacity(self.converters.len());
        for conv in self.converters.values() {
            let raw = get_value(tree, conv.source_path());
            values.insert(conv.attr.clone(), conv.decode_value(raw));
        }
        values
    }
}

// ── Static station fields ────────────────────────────────────────────

/// The fixed field bundle every station starts with: the availability
/// aggregate with its per-current breakdown, and the parking info block.
fn station_defaults() -> Vec<Converter> {
    let stat = |attr: &str, prop: &str| {
        Converter::sensor(attr)
            .path(format!("charge_connector_stat.{prop}"))
            .parent("total_left")
    };

    vec![
        Converter::sensor("total_left")
            .numeric(0)
            .option("icon", json!("mdi:ev-station"))
            .option("state_class", json!("measurement")),
        stat("dc_left", "dc_left"),
        stat("ac_left", "ac_left"),
        stat("dc_total", "dc_total"),
        stat("dc_off", "dc_off"),
        stat("dc_fault", "dc_fault"),
        stat("dc_occu", "dc_occu"),
        stat("dc_min_power", "dc_min_power"),
        // `dc_max_pwer` is the vendor's own field spelling.
        stat("dc_max_power", "dc_max_pwer"),
        stat("dc_power_text", "dc_power_text"),
        stat("dc_idle_predict", "dc_idle_predict"),
        stat("ac_total", "ac_total"),
        stat("ac_off", "ac_off"),
        stat("ac_fault", "ac_fault"),
        stat("ac_occu", "ac_occu"),
        stat("ac_min_power", "ac_min_power"),
        stat("ac_max_power", "ac_max_power"),
        stat("ac_power_text", "ac_power_text"),
        stat("ac_idle_predict", "ac_idle_predict"),
        Converter::sensor("park_info")
            .path("additional_info.park_current_info")
            .option("icon", json!("mdi:parking")),
        Converter::sensor("uid")
            .path("basic_info.uid")
            .parent("park_info"),
        Converter::sensor("addr")
            .path("basic_info.addr")
            .parent("park_info"),
        Converter::sensor("park_detail")
            .path("charge_connector_stat.park_info")
            .parent("park_info"),
        Converter::sensor("park_extend")
            .path("charge_connector_stat.park_extend")
            .parent("park_info"),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_overwrites_same_attr() {
        let mut registry = ConverterRegistry::new();
        registry.register(Converter::sensor("x").path("a.b"));
        registry.register(Converter::sensor("x").path("c.d"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().source_path(), "c.d");
    }

    #[test]
    fn subscribe_attrs_collects_parent_links_and_children() {
        let mut registry = ConverterRegistry::new();
        registry.register(Converter::sensor("agg").child("extra"));
        registry.register(Converter::new("leaf_a").parent("agg"));
        registry.register(Converter::new("leaf_b").parent("agg"));
        registry.register(Converter::new("unrelated"));

        let attrs = registry.subscribe_attrs("agg");
        assert_eq!(
            attrs,
            ["agg", "extra", "leaf_a", "leaf_b"]
                .into_iter()
                .map(str::to_owned)
                .collect()
        );
    }

    #[test]
    fn subscribe_attrs_for_unknown_attr_is_just_itself() {
        let registry = ConverterRegistry::new();
        let attrs = registry.subscribe_attrs("ghost");
        assert_eq!(attrs.len(), 1);
        assert!(attrs.contains("ghost"));
    }

    #[test]
    fn decode_all_emits_every_registered_attr() {
        let mut registry = ConverterRegistry::new();
        registry.register(Converter::sensor("present").path("a"));
        registry.register(Converter::sensor("absent").path("no.such.path"));

        let values = registry.decode_all(&json!({ "a": 5 }));
        assert_eq!(values.get("present"), Some(&json!(5)));
        assert_eq!(values.get("absent"), Some(&Value::Null));
    }

    #[test]
    fn station_defaults_wire_breakdown_to_aggregate() {
        let registry = ConverterRegistry::with_station_defaults();

        assert!(registry.contains("total_left"));
        let dc = registry.get("dc_left").unwrap();
        assert_eq!(dc.parent.as_deref(), Some("total_left"));
        assert_eq!(dc.source_path(), "charge_connector_stat.dc_left");

        let subs = registry.subscribe_attrs("total_left");
        assert!(subs.contains("dc_left"));
        assert!(subs.contains("ac_idle_predict"));
        assert!(!subs.contains("park_info"));
    }

    #[test]
    fn station_defaults_decode_against_detail_payload() {
        let registry = ConverterRegistry::with_station_defaults();
        let tree = json!({
            "basic_info": { "uid": "abc", "addr": "1 Main St" },
            "charge_connector_stat": { "dc_left": 3, "ac_left": 2 },
            "total_left": 5,
        });

        let values = registry.decode_all(&tree);
        assert_eq!(values.get("total_left"), Some(&json!(5)));
        assert_eq!(values.get("uid"), Some(&json!("abc")));
        assert_eq!(values.get("dc_left"), Some(&json!(3)));
        // absent in this payload, still present in the output
        assert_eq!(values.get("park_info"), Some(&Value::Null));
    }
}
