//! Multi-panel chart layout payload.
//!
//! The payload is what a renderer consumes: vertically stacked panels, each
//! holding traces whose `x` values are row positions inside the display
//! window, plus thinned tick labels for the shared date axis.

pub mod builder;
pub mod ticks;

pub use builder::{
    build_layout, panel_domains, BandOptions, LayoutOptions, LineSpec, MacdLines, PanelWeights,
    PriceStyle,
};
pub use ticks::{thin_date_ticks, DEFAULT_TICK_STEP};

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub dates: Vec<NaiveDate>,
    pub panels: Vec<Panel>,
    pub x_ticks: Vec<AxisTick>,
}

impl ChartLayout {
    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.kind == kind)
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Price,
    Rsi,
    Macd,
    Volume,
}

impl PanelKind {
    /// Top-to-bottom stacking order.
    pub const ORDER: [PanelKind; 4] = [
        PanelKind::Price,
        PanelKind::Rsi,
        PanelKind::Macd,
        PanelKind::Volume,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Price => "Price",
            PanelKind::Rsi => "RSI",
            PanelKind::Macd => "MACD",
            PanelKind::Volume => "Volume",
        }
    }
}

/// Vertical extent of a panel as fractions of the figure height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelDomain {
    pub bottom: f64,
    pub top: f64,
}

impl PanelDomain {
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: String,
    pub domain: PanelDomain,
    pub traces: Vec<Trace>,
}

impl Panel {
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<usize>,
    pub data: TraceData,
    pub style: TraceStyle,
}

/// Trace values tagged with how they should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceData {
    Candlestick {
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
    },
    Line {
        y: Vec<Option<f64>>,
    },
    Markers {
        y: Vec<Option<f64>>,
    },
    Bars {
        y: Vec<f64>,
    },
}

impl TraceData {
    pub fn len(&self) -> usize {
        match self {
            TraceData::Candlestick { close, .. } => close.len(),
            TraceData::Line { y } | TraceData::Markers { y } => y.len(),
            TraceData::Bars { y } => y.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every finite value the trace draws, used for axis scaling.
    pub fn values(&self) -> Vec<f64> {
        match self {
            TraceData::Candlestick { high, low, .. } => {
                high.iter().chain(low.iter()).copied().collect()
            }
            TraceData::Line { y } | TraceData::Markers { y } => y.iter().flatten().copied().collect(),
            TraceData::Bars { y } => y.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceStyle {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_symbol: Option<String>,
    /// Fill the region between this trace and the one drawn before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_to_previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increasing_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decreasing_color: Option<String>,
}

impl TraceStyle {
    pub fn line(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn marker(color: &str, size: f64, symbol: Option<&str>) -> Self {
        Self {
            color: color.to_string(),
            marker_size: Some(size),
            marker_symbol: symbol.map(str::to_string),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTick {
    pub position: usize,
    pub label: String,
}
