//! Plotly figure for the price/volume view
//!
//! [`compose`] turns an analyzed series into a Plotly-compatible figure: a
//! candlestick layer, 20- and 60-day moving average lines, and a volume bar
//! layer on a secondary axis that does not share range with the price axis.
//! The date axis always pans and zooms freely; how the price axis behaves is
//! decided by a single [`PriceAxisPolicy`].

use crate::metrics::AnalyzedSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chart height in pixels
pub const CHART_HEIGHT: u32 = 600;

/// Headroom above the largest volume bar
const VOLUME_HEADROOM: f64 = 1.1;

/// Price axis behavior while the date axis is panned or zoomed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceAxisPolicy {
    /// Price range is locked; only the date axis moves
    #[default]
    Fixed,
    /// Price axis autoranges and may be zoomed independently
    Autorange,
}

impl FromStr for PriceAxisPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "autorange" | "auto" => Ok(Self::Autorange),
            other => Err(format!("unknown price axis policy '{other}'")),
        }
    }
}

/// A complete figure: traces, layout and interaction config
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
    pub config: PlotConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Candlestick {
        name: String,
        x: Vec<NaiveDate>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        yaxis: String,
    },
    Scatter {
        name: String,
        x: Vec<NaiveDate>,
        /// `None` serializes as `null`, which leaves a gap
        y: Vec<Option<f64>>,
        mode: String,
        line: Line,
    },
    Bar {
        name: String,
        x: Vec<NaiveDate>,
        y: Vec<u64>,
        marker: Marker,
        opacity: f64,
        yaxis: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: String,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub dragmode: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub yaxis2: Axis,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    pub fixedrange: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showgrid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    pub scroll_zoom: bool,
    pub double_click: String,
    pub displaylogo: bool,
    pub mode_bar_buttons_to_remove: Vec<String>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            scroll_zoom: true,
            double_click: "reset".to_string(),
            displaylogo: false,
            mode_bar_buttons_to_remove: ["zoom2d", "autoScale2d", "select2d", "lasso2d"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Build the figure for `series`
pub fn compose(series: &AnalyzedSeries, policy: PriceAxisPolicy) -> ChartSpec {
    let rows = series.rows();
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();

    let candles = Trace::Candlestick {
        name: "Price".to_string(),
        x: dates.clone(),
        open: rows.iter().map(|r| r.open).collect(),
        high: rows.iter().map(|r| r.high).collect(),
        low: rows.iter().map(|r| r.low).collect(),
        close: rows.iter().map(|r| r.close).collect(),
        yaxis: "y".to_string(),
    };

    let ma20 = moving_average_line("MA20", &dates, rows.iter().map(|r| r.ma20), "orange");
    let ma60 = moving_average_line("MA60", &dates, rows.iter().map(|r| r.ma60), "blue");

    let volume = Trace::Bar {
        name: "Volume".to_string(),
        x: dates,
        y: rows.iter().map(|r| r.volume).collect(),
        marker: Marker {
            color: "lightgray".to_string(),
        },
        opacity: 0.4,
        yaxis: "y2".to_string(),
    };

    ChartSpec {
        data: vec![candles, ma20, ma60, volume],
        layout: layout(series.max_volume(), policy),
        config: PlotConfig::default(),
    }
}

fn moving_average_line(
    name: &str,
    dates: &[NaiveDate],
    values: impl Iterator<Item = Option<f64>>,
    color: &str,
) -> Trace {
    Trace::Scatter {
        name: name.to_string(),
        x: dates.to_vec(),
        y: values.collect(),
        mode: "lines".to_string(),
        line: Line {
            color: color.to_string(),
            width: 1,
        },
    }
}

fn layout(max_volume: u64, policy: PriceAxisPolicy) -> Layout {
    let price_axis = match policy {
        PriceAxisPolicy::Fixed => Axis {
            fixedrange: true,
            ..Axis::default()
        },
        PriceAxisPolicy::Autorange => Axis {
            fixedrange: false,
            autorange: Some(true),
            ..Axis::default()
        },
    };

    Layout {
        dragmode: "pan".to_string(),
        xaxis: Axis {
            title: "Date".to_string(),
            fixedrange: false,
            rangeslider: Some(RangeSlider { visible: false }),
            ..Axis::default()
        },
        yaxis: Axis {
            title: "Price (KRW)".to_string(),
            side: Some("right".to_string()),
            ..price_axis
        },
        yaxis2: Axis {
            title: "Volume".to_string(),
            side: Some("left".to_string()),
            overlaying: Some("y".to_string()),
            fixedrange: true,
            range: Some([0.0, max_volume as f64 * VOLUME_HEADROOM]),
            showgrid: Some(false),
            ..Axis::default()
        },
        height: CHART_HEIGHT,
    }
}
