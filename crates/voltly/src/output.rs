//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits tab-separated lines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use voltly_core::FlatValues;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Flat value rendering ─────────────────────────────────────────────

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "ATTR")]
    attr: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

/// Render a decoded flat mapping in the chosen format.
pub fn render_values(format: &OutputFormat, values: &FlatValues, color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ValueRow> = values
                .iter()
                .map(|(attr, value)| ValueRow {
                    attr: attr.clone(),
                    value: render_cell(value, color),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json_pretty(values),
        OutputFormat::JsonCompact => render_json_compact(values),
        OutputFormat::Plain => values
            .iter()
            .map(|(attr, value)| format!("{attr}\t{}", plain_value(value)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

/// Table cell text, with connector states colored when enabled.
fn render_cell(value: &Value, color: bool) -> String {
    let text = plain_value(value);
    if !color {
        return text;
    }
    match text.as_str() {
        "idle" => text.green().to_string(),
        "occupied" => text.yellow().to_string(),
        "fault" => text.red().to_string(),
        _ => text,
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
