// ── Field converters ──
//
// A `Converter` describes one flat output value: where to find it in the
// state tree, how to transform the raw JSON it finds there, and which
// parent field it hangs off for subscription purposes. The decode
// transforms are a closed tagged-variant set -- each variant carries only
// the fields its transform needs.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::CoreError;

/// The decoded output of one full registry pass: attr -> transformed value.
pub type FlatValues = IndexMap<String, Value>;

/// Which host surface a decoded field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Sensor,
    BinarySensor,
}

/// String literals that always read as false, regardless of configuration.
const FALSY_LITERALS: [&str; 3] = ["0", "off", "false"];

/// Decode transform applied to the raw resolved value.
#[derive(Debug, Clone)]
pub enum Decode {
    /// Pass the raw value through unchanged (`None` resolves to null).
    Raw,
    /// Strict float parse (whole token, whitespace trimmed), rounded to
    /// `precision` fractional digits. Unparseable input decodes to null --
    /// an explicit "no value", never zero.
    Numeric { precision: i32 },
    /// General truthiness, with a literal override set: null, `false`,
    /// zero, and empty containers are false, as is any string equal to
    /// `"0"`/`"off"`/`"false"` or one of the extra `falsy` literals.
    Boolean { falsy: Vec<String> },
    /// Ordered lookup table keyed by JSON equality; unmapped values
    /// decode to `default`.
    Map {
        table: Vec<(Value, Value)>,
        default: Value,
    },
}

/// A named field descriptor. Identity is `attr`, unique within one
/// station's registry.
#[derive(Debug, Clone)]
pub struct Converter {
    /// Unique output key.
    pub attr: String,
    /// Extraction path into the state tree; defaults to `attr`.
    pub path: Option<String>,
    /// Attr of the aggregate field this one hangs off.
    pub parent: Option<String>,
    /// Host surface, if this field is exposed as its own entity.
    pub domain: Option<Domain>,
    /// Tri-state: `Some(true)` on, `Some(false)` off by default, `None` lazy.
    pub enabled: Option<bool>,
    /// Decode transform.
    pub decode: Decode,
    /// Explicitly declared child attrs (beyond parent-link back references).
    pub children: BTreeSet<String>,
    /// Opaque display options (icon, unit, device class, ...).
    pub options: Map<String, Value>,
}

impl Converter {
    /// A raw attribute-only converter (no domain of its own).
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            path: None,
            parent: None,
            domain: None,
            enabled: Some(true),
            decode: Decode::Raw,
            children: BTreeSet::new(),
            options: Map::new(),
        }
    }

    /// A sensor-surfaced converter.
    pub fn sensor(attr: impl Into<String>) -> Self {
        Self {
            domain: Some(Domain::Sensor),
            ..Self::new(attr)
        }
    }

    /// A binary-sensor-surfaced converter; decodes via [`Decode::Boolean`].
    pub fn binary_sensor(attr: impl Into<String>) -> Self {
        Self {
            domain: Some(Domain::BinarySensor),
            decode: Decode::Boolean { falsy: Vec::new() },
            ..Self::new(attr)
        }
    }

    // ── Builder-style configuration ──────────────────────────────────

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn numeric(mut self, precision: i32) -> Self {
        self.decode = Decode::Numeric { precision };
        self
    }

    pub fn boolean(mut self, extra_falsy: &[&str]) -> Self {
        self.decode = Decode::Boolean {
            falsy: extra_falsy.iter().map(|s| (*s).to_owned()).collect(),
        };
        self
    }

    pub fn mapped(mut self, table: Vec<(Value, Value)>, default: Value) -> Self {
        self.decode = Decode::Map { table, default };
        self
    }

    pub fn option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_owned(), value);
        self
    }

    pub fn child(mut self, attr: impl Into<String>) -> Self {
        self.children.insert(attr.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = Some(false);
        self
    }

    pub fn lazy(mut self) -> Self {
        self.enabled = None;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The path this converter extracts from (falls back to `attr`).
    pub fn source_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.attr)
    }

    /// Whether the field should be surfaced without explicit opt-in.
    pub fn enabled_by_default(&self) -> bool {
        self.enabled != Some(false)
    }

    // ── Transforms ───────────────────────────────────────────────────

    /// Apply the decode transform to a resolved raw value.
    ///
    /// `None` (path did not resolve) still produces an output so the attr
    /// never silently disappears from the flat mapping.
    pub fn decode_value(&self, raw: Option<&Value>) -> Value {
        match &self.decode {
            Decode::Raw => raw.cloned().unwrap_or(Value::Null),
            Decode::Numeric { precision } => decode_numeric(raw, *precision),
            Decode::Boolean { falsy } => Value::Bool(decode_boolean(raw, falsy)),
            Decode::Map { table, default } => raw
                .and_then(|v| table.iter().find(|(key, _)| key == v))
                .map_or_else(|| default.clone(), |(_, mapped)| mapped.clone()),
        }
    }

    /// Apply the encode (reverse) transform.
    ///
    /// Only [`Decode::Map`] has a real reverse direction: the table is
    /// scanned for the first mapped-value match, and a miss is a hard
    /// fault. Every other variant passes the value through. This
    /// direction exists for interface symmetry; the polling path never
    /// calls it.
    pub fn encode_value(&self, value: &Value) -> Result<Value, CoreError> {
        match &self.decode {
            Decode::Map { table, .. } => table
                .iter()
                .find(|(_, mapped)| mapped == value)
                .map(|(key, _)| key.clone())
                .ok_or_else(|| CoreError::NoMatchingKey {
                    attr: self.attr.clone(),
                    value: value.to_string(),
                }),
            _ => Ok(value.clone()),
        }
    }
}

// ── Transform helpers ────────────────────────────────────────────────

fn decode_numeric(raw: Option<&Value>, precision: i32) -> Value {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(value) = parsed else {
        return Value::Null;
    };

    let factor = 10_f64.powi(precision);
    let rounded = (value * factor).round() / factor;

    // Integral results at precision 0 read as integers downstream.
    if precision <= 0 && rounded.fract() == 0.0 {
        Value::from(rounded as i64)
    } else {
        Number::from_f64(rounded).map_or(Value::Null, Value::Number)
    }
}

fn decode_boolean(raw: Option<&Value>, falsy: &[String]) -> bool {
    let Some(value) = raw else {
        return false;
    };
    if let Value::String(s) = value {
        if FALSY_LITERALS.contains(&s.as_str()) || falsy.iter().any(|f| f == s) {
            return false;
        }
    }
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
