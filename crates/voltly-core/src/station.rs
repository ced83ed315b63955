// ── Dynamic entity registration ──
//
// Pricing tiers and connectors appear in the feed at runtime; each one
// grows the registry with a fixed bundle of converters the first time it
// is observed. Re-observing a known entity is a no-op -- only genuinely
// new IDs change the registry.

use serde_json::{json, Map, Value};

use voltly_api::DEFAULT_TP_CODE;

use crate::convert::Converter;
use crate::registry::ConverterRegistry;

// ── Transient feed views ─────────────────────────────────────────────

/// View over one entry of the station detail's `tp_list`.
pub struct PricingTier<'a> {
    index: usize,
    data: &'a Map<String, Value>,
}

impl<'a> PricingTier<'a> {
    pub fn new(index: usize, value: &'a Value) -> Option<Self> {
        value.as_object().map(|data| Self { index, data })
    }

    /// The tier's own ID; `None` when missing or empty (such a tier
    /// cannot be named stably and is skipped entirely).
    pub fn id(&self) -> Option<&'a str> {
        self.data
            .get("tp_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Tier type code for the connector-detail request.
    pub fn tp_code(&self) -> i64 {
        self.data
            .get("tp_code")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_TP_CODE)
    }

    /// Position in `tp_list`; used as the stable attr prefix because the
    /// vendor does not reuse tier IDs for naming.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// View over one connector object from a connector-detail response.
pub struct Connector<'a> {
    data: &'a Map<String, Value>,
}

impl<'a> Connector<'a> {
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(|data| Self { data })
    }

    /// The connector's ID; `None` when missing or empty.
    pub fn id(&self) -> Option<&'a str> {
        self.data
            .get("connector_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Vendor display name, when present.
    pub fn name(&self) -> Option<&'a str> {
        self.data.get("connector_name").and_then(Value::as_str)
    }
}

/// Attr of a connector's aggregate converter: the last six characters of
/// its ID keep names short and still practically unique.
pub fn connector_attr(connector_id: &str) -> String {
    let chars: Vec<char> = connector_id.chars().collect();
    let start = chars.len().saturating_sub(6);
    let short: String = chars.iter().skip(start).collect();
    format!("connector_{short}")
}

// ── Registration bundles ─────────────────────────────────────────────

impl ConverterRegistry {
    /// Register the converter bundle for the pricing tier at `index`.
    ///
    /// Returns `false` without touching the registry when the tier's
    /// aggregate attr already exists.
    pub fn ensure_tier(&mut self, index: usize) -> bool {
        let root = format!("tp_{index}_price");
        if self.contains(&root) {
            return false;
        }
        let base = format!("tp_list.{index}");

        self.register(
            Converter::sensor(&root)
                .path(format!("{base}.total_price"))
                .option("device_class", json!("monetary"))
                .option("unit_of_measurement", json!("CNY")),
        );
        self.register(
            Converter::new(format!("tp_{index}_time_period"))
                .path(format!("{base}.current_charge_fee.Time"))
                .parent(&root),
        );
        self.register(
            Converter::new(format!("tp_{index}_electric_price"))
                .path(format!("{base}.current_charge_fee.MarketElecPrice"))
                .parent(&root),
        );
        self.register(
            Converter::new(format!("tp_{index}_service_price"))
                .path(format!("{base}.current_charge_fee.MarketServicePrice"))
                .parent(&root),
        );
        self.register(
            Converter::new(format!("tp_{index}_hundred_km_fee"))
                .path(format!("{base}.hundred_km_charge_fee"))
                .parent(&root),
        );
        self.register(
            Converter::new(format!("tp_{index}_fee_list"))
                .path(format!("{base}.cf"))
                .parent(&root),
        );
        true
    }

    /// Register the converter bundle for a connector.
    ///
    /// Returns `false` without touching the registry when the connector's
    /// aggregate attr already exists.
    pub fn ensure_connector(&mut self, connector_id: &str, display_name: Option<&str>) -> bool {
        let attr = connector_attr(connector_id);
        if self.contains(&attr) {
            return false;
        }
        let base = format!("connectors.{connector_id}");

        let mut status = Converter::sensor(&attr)
            .path(format!("{base}.status"))
            .mapped(
                vec![
                    (json!(0), json!("fault")),
                    (json!(1), json!("idle")),
                    (json!(2), json!("occupied")),
                ],
                Value::Null,
            )
            .option("icon", json!("mdi:power-plug"))
            .option("device_class", json!("plug"))
            .option("translation_key", json!("connector_status"));
        if let Some(name) = display_name {
            status = status.option("name", json!(name));
        }
        self.register(status);

        self.register(
            Converter::new(format!("{attr}_name"))
                .path(format!("{base}.connector_name"))
                .parent(&attr),
        );
        self.register(
            Converter::new(format!("{attr}_power"))
                .path(format!("{base}.power"))
                .parent(&attr),
        );
        self.register(
            Converter::new(format!("{attr}_can_down_lock"))
                .path(format!("{base}.can_down_lock"))
                .parent(&attr),
        );
        self.register(
            Converter::new(format!("{attr}_lock_title"))
                .path(format!("{base}.lock_title"))
                .parent(&attr),
        );
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connector_attr_uses_last_six_chars() {
        assert_eq!(connector_attr("ABCDEF123456"), "connector_123456");
        assert_eq!(connector_attr("abc"), "connector_abc");
    }

    #[test]
    fn tier_view_skips_missing_or_empty_id() {
        let no_id = json!({ "tp_code": 5 });
        assert_eq!(PricingTier::new(0, &no_id).unwrap().id(), None);

        let empty_id = json!({ "tp_id": "" });
        assert_eq!(PricingTier::new(0, &empty_id).unwrap().id(), None);

        let with_id = json!({ "tp_id": "T1" });
        assert_eq!(PricingTier::new(0, &with_id).unwrap().id(), Some("T1"));
    }

    #[test]
    fn tier_tp_code_defaults_to_vendor_constant() {
        let tier = json!({ "tp_id": "T1" });
        assert_eq!(PricingTier::new(0, &tier).unwrap().tp_code(), 88);

        let coded = json!({ "tp_id": "T1", "tp_code": 3 });
        assert_eq!(PricingTier::new(0, &coded).unwrap().tp_code(), 3);
    }

    #[test]
    fn ensure_tier_registers_bundle_once() {
        let mut registry = ConverterRegistry::new();
        assert!(registry.ensure_tier(0));
        let count = registry.len();

        assert!(!registry.ensure_tier(0));
        assert_eq!(registry.len(), count);

        let price = registry.get("tp_0_price").unwrap();
        assert_eq!(price.source_path(), "tp_list.0.total_price");

        let elec = registry.get("tp_0_electric_price").unwrap();
        assert_eq!(
            elec.source_path(),
            "tp_list.0.current_charge_fee.MarketElecPrice"
        );
        assert_eq!(elec.parent.as_deref(), Some("tp_0_price"));
    }

    #[test]
    fn ensure_connector_registers_bundle_once() {
        let mut registry = ConverterRegistry::new();
        assert!(registry.ensure_connector("ABCDEF123456", Some("A-1")));
        let count = registry.len();

        assert!(!registry.ensure_connector("ABCDEF123456", Some("renamed")));
        assert_eq!(registry.len(), count);

        let status = registry.get("connector_123456").unwrap();
        assert_eq!(status.source_path(), "connectors.ABCDEF123456.status");
        assert_eq!(status.options.get("name"), Some(&json!("A-1")));

        let power = registry.get("connector_123456_power").unwrap();
        assert_eq!(power.parent.as_deref(), Some("connector_123456"));
    }

    #[test]
    fn connector_status_decodes_three_states() {
        let mut registry = ConverterRegistry::new();
        registry.ensure_connector("ABCDEF123456", None);

        let tree = json!({ "connectors": { "ABCDEF123456": { "status": 2 } } });
        let values = registry.decode_all(&tree);
        assert_eq!(values.get("connector_123456"), Some(&json!("occupied")));
    }

    #[test]
    fn subscription_set_covers_connector_children() {
        let mut registry = ConverterRegistry::new();
        registry.ensure_connector("ABCDEF123456", None);

        let attrs = registry.subscribe_attrs("connector_123456");
        assert!(attrs.contains("connector_123456"));
        assert!(attrs.contains("connector_123456_power"));
        assert!(attrs.contains("connector_123456_lock_title"));
        assert_eq!(attrs.len(), 5);
    }
}
