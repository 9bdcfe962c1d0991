//! Display formatting for the summary panel and data table

use crate::export::{COLUMNS, TabularExport};
use crate::metrics::SummarySnapshot;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use serde::Serialize;

/// Insert `,` every three digits of the integer part
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Whole-won amount, e.g. `55,500 KRW`
pub fn format_krw(value: f64) -> String {
    format!("{} KRW", group_thousands(value.round() as i64))
}

/// Absolute change with its rate, e.g. `-1,500 (-2.70%)`
pub fn format_change(change: f64, rate: f64) -> String {
    format!("{} ({:.2}%)", group_thousands(change.round() as i64), rate)
}

/// One labelled figure of the summary panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

/// Current price, volume and 20-day mean, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPanel {
    pub title: String,
    pub metrics: Vec<Metric>,
}

impl SummaryPanel {
    pub fn new(company: &str, ticker: &str, snapshot: &SummarySnapshot) -> Self {
        let ma20 = snapshot
            .ma20
            .map_or_else(|| "n/a".to_string(), format_krw);

        Self {
            title: format!("{company} ({ticker}) summary"),
            metrics: vec![
                Metric {
                    label: "Current price".to_string(),
                    value: format_krw(snapshot.close),
                    delta: Some(format_change(snapshot.change, snapshot.change_rate)),
                },
                Metric {
                    label: "Volume".to_string(),
                    value: group_thousands(snapshot.volume as i64),
                    delta: None,
                },
                Metric {
                    label: "20-day average".to_string(),
                    value: ma20,
                    delta: None,
                },
            ],
        }
    }

    /// Plain-text rendering for the terminal
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.title);
        for metric in &self.metrics {
            out.push_str(&format!("  {:<16} {}", metric.label, metric.value));
            if let Some(delta) = &metric.delta {
                out.push_str(&format!("  {delta}"));
            }
            out.push('\n');
        }
        out
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{v:.2}"))
}

/// Render up to `limit` export rows (newest first) as a terminal table
pub fn render_table(export: &TabularExport, limit: usize) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(COLUMNS);

    for row in export.rows().iter().take(limit) {
        table.add_row(vec![
            row.date.to_string(),
            group_thousands(row.open.round() as i64),
            group_thousands(row.high.round() as i64),
            group_thousands(row.low.round() as i64),
            group_thousands(row.close.round() as i64),
            group_thousands(row.volume as i64),
            optional(row.ma20),
            optional(row.ma60),
            optional(row.ma120),
        ]);
    }

    for idx in 1..COLUMNS.len() {
        if let Some(column) = table.column_mut(idx) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    table.to_string()
}
