//! Chart layout assembly.
//!
//! Indicators and crossover events arrive computed over the full history.
//! The builder only cuts them to the display window, so warm-up has already
//! been satisfied for every row that survives the cut.

use crate::domain::crossover::{CrossKind, CrossoverEvent};
use crate::domain::error::ChartError;
use crate::domain::indicator::{BollingerParams, IndicatorType, Overlays};
use crate::domain::layout::ticks::{thin_date_ticks, DEFAULT_TICK_STEP};
use crate::domain::layout::{
    ChartLayout, Panel, PanelDomain, PanelKind, Trace, TraceData, TraceStyle,
};
use crate::domain::ohlcv::OhlcvSeries;

pub const GOLDEN_COLOR: &str = "blueviolet";
pub const DEAD_COLOR: &str = "black";
pub const BAND_FILL: &str = "rgba(170,170,170,0.25)";
pub const CANDLE_UP: &str = "#00ada9";
pub const CANDLE_DOWN: &str = "#a0a0a0";
pub const VOLUME_COLOR: &str = "#7f7f7f";
const MARKER_SIZE: f64 = 12.0;
const LINE_WIDTH: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceStyle {
    #[default]
    Candlestick,
    CloseLine,
}

/// One overlay drawn as a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub indicator: IndicatorType,
    pub label: String,
    pub color: String,
}

impl LineSpec {
    pub fn new(indicator: IndicatorType, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            indicator,
            label: label.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandOptions {
    pub upper: IndicatorType,
    pub middle: IndicatorType,
    pub lower: IndicatorType,
    pub show_middle: bool,
}

impl BandOptions {
    pub fn from_params(params: &BollingerParams, show_middle: bool) -> Self {
        Self {
            upper: params.upper_type(),
            middle: params.middle_type(),
            lower: params.lower_type(),
            show_middle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: LineSpec,
    pub signal: LineSpec,
}

/// Relative panel heights before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelWeights {
    pub price: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volume: f64,
}

impl Default for PanelWeights {
    fn default() -> Self {
        Self {
            price: 0.55,
            rsi: 0.15,
            macd: 0.15,
            volume: 0.15,
        }
    }
}

impl PanelWeights {
    pub fn weight(&self, kind: PanelKind) -> f64 {
        match kind {
            PanelKind::Price => self.price,
            PanelKind::Rsi => self.rsi,
            PanelKind::Macd => self.macd,
            PanelKind::Volume => self.volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub title: String,
    /// Rows kept for display, counted from the end. `None` keeps every row.
    pub display_window: Option<usize>,
    pub tick_step: usize,
    pub price_style: PriceStyle,
    pub moving_averages: Vec<LineSpec>,
    pub crossovers: bool,
    pub bands: Option<BandOptions>,
    pub rsi: Vec<LineSpec>,
    pub macd: Option<MacdLines>,
    pub volume: bool,
    pub weights: PanelWeights,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            display_window: Some(120),
            tick_step: DEFAULT_TICK_STEP,
            price_style: PriceStyle::Candlestick,
            moving_averages: Vec::new(),
            crossovers: false,
            bands: None,
            rsi: Vec::new(),
            macd: None,
            volume: true,
            weights: PanelWeights::default(),
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.display_window == Some(0) {
            return Err(ChartError::invalid_parameter(
                "display window",
                "display window must keep at least one row",
            ));
        }
        if self.tick_step == 0 {
            return Err(ChartError::invalid_parameter(
                "tick step",
                "tick step must be positive",
            ));
        }
        for kind in self.panel_kinds() {
            let w = self.weights.weight(kind);
            if !w.is_finite() || w <= 0.0 {
                return Err(ChartError::invalid_parameter(
                    "panel weight",
                    format!("{} panel weight must be a positive number", kind.title()),
                ));
            }
        }
        Ok(())
    }

    /// Panels this layout includes, in stacking order.
    pub fn panel_kinds(&self) -> Vec<PanelKind> {
        PanelKind::ORDER
            .into_iter()
            .filter(|kind| match kind {
                PanelKind::Price => true,
                PanelKind::Rsi => !self.rsi.is_empty(),
                PanelKind::Macd => self.macd.is_some(),
                PanelKind::Volume => self.volume,
            })
            .collect()
    }
}

/// Stack panels top to bottom, sized by normalized weight. The first panel
/// touches 1.0 and the last touches 0.0 exactly.
pub fn panel_domains(kinds: &[PanelKind], weights: &PanelWeights) -> Vec<PanelDomain> {
    let total: f64 = kinds.iter().map(|k| weights.weight(*k)).sum();
    let mut domains = Vec::with_capacity(kinds.len());
    let mut top = 1.0;

    for (i, kind) in kinds.iter().enumerate() {
        let bottom = if i + 1 == kinds.len() {
            0.0
        } else {
            top - weights.weight(*kind) / total
        };
        domains.push(PanelDomain { bottom, top });
        top = bottom;
    }
    domains
}

pub fn build_layout(
    series: &OhlcvSeries,
    overlays: &Overlays,
    events: &[CrossoverEvent],
    options: &LayoutOptions,
) -> Result<ChartLayout, ChartError> {
    options.validate()?;

    let total = series.len();
    let rows = options.display_window.map_or(total, |w| w.min(total));
    let start = total - rows;
    let bars = series.tail(rows);
    let x: Vec<usize> = (0..rows).collect();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();

    let window = |indicator: &IndicatorType| -> Result<Vec<Option<f64>>, ChartError> {
        let overlay = overlays.require(indicator)?;
        if overlay.len() != total {
            return Err(ChartError::invalid_parameter(
                overlay.name(),
                format!("overlay has {} values for {} rows", overlay.len(), total),
            ));
        }
        Ok(overlay.tail(rows).to_vec())
    };
    let line = |spec: &LineSpec| -> Result<Trace, ChartError> {
        Ok(Trace {
            name: spec.label.clone(),
            x: x.clone(),
            data: TraceData::Line {
                y: window(&spec.indicator)?,
            },
            style: TraceStyle::line(&spec.color, LINE_WIDTH),
        })
    };

    let mut price_traces = Vec::new();
    price_traces.push(match options.price_style {
        PriceStyle::Candlestick => Trace {
            name: "chart".to_string(),
            x: x.clone(),
            data: TraceData::Candlestick {
                open: bars.iter().map(|b| b.open).collect(),
                high: bars.iter().map(|b| b.high).collect(),
                low: bars.iter().map(|b| b.low).collect(),
                close: bars.iter().map(|b| b.close).collect(),
            },
            style: TraceStyle {
                color: CANDLE_UP.to_string(),
                increasing_color: Some(CANDLE_UP.to_string()),
                decreasing_color: Some(CANDLE_DOWN.to_string()),
                ..TraceStyle::default()
            },
        },
        PriceStyle::CloseLine => Trace {
            name: "Close".to_string(),
            x: x.clone(),
            data: TraceData::Line {
                y: bars.iter().map(|b| Some(b.close)).collect(),
            },
            style: TraceStyle::line("#1f77b4", LINE_WIDTH),
        },
    });

    for spec in &options.moving_averages {
        price_traces.push(line(spec)?);
    }

    if options.crossovers {
        let mut golden = vec![None; rows];
        let mut dead = vec![None; rows];
        for event in events.iter().filter(|e| e.index >= start && e.index < total) {
            let slot = event.index - start;
            match event.kind {
                CrossKind::Golden => golden[slot] = Some(event.price),
                CrossKind::Dead => dead[slot] = Some(event.price),
            }
        }
        price_traces.push(Trace {
            name: "Golden Cross".to_string(),
            x: x.clone(),
            data: TraceData::Markers { y: golden },
            style: TraceStyle::marker(GOLDEN_COLOR, MARKER_SIZE, None),
        });
        price_traces.push(Trace {
            name: "Dead Cross".to_string(),
            x: x.clone(),
            data: TraceData::Markers { y: dead },
            style: TraceStyle::marker(DEAD_COLOR, MARKER_SIZE, Some("x")),
        });
    }

    if let Some(bands) = &options.bands {
        price_traces.push(Trace {
            name: "BB_Up".to_string(),
            x: x.clone(),
            data: TraceData::Line {
                y: window(&bands.upper)?,
            },
            style: TraceStyle::line(BAND_FILL, 0.0),
        });
        price_traces.push(Trace {
            name: "BB_Low".to_string(),
            x: x.clone(),
            data: TraceData::Line {
                y: window(&bands.lower)?,
            },
            style: TraceStyle {
                fill_to_previous: Some(BAND_FILL.to_string()),
                ..TraceStyle::line(BAND_FILL, 0.0)
            },
        });
        if bands.show_middle {
            price_traces.push(Trace {
                name: "BB_Mid".to_string(),
                x: x.clone(),
                data: TraceData::Line {
                    y: window(&bands.middle)?,
                },
                style: TraceStyle::line("gray", 1.0),
            });
        }
    }

    let kinds = options.panel_kinds();
    let domains = panel_domains(&kinds, &options.weights);
    let mut panels = Vec::with_capacity(kinds.len());

    for (kind, domain) in kinds.into_iter().zip(domains) {
        let traces = match kind {
            PanelKind::Price => std::mem::take(&mut price_traces),
            PanelKind::Rsi => options.rsi.iter().map(&line).collect::<Result<Vec<_>, _>>()?,
            PanelKind::Macd => match &options.macd {
                Some(macd) => vec![line(&macd.line)?, line(&macd.signal)?],
                None => Vec::new(),
            },
            PanelKind::Volume => vec![Trace {
                name: "Volume".to_string(),
                x: x.clone(),
                data: TraceData::Bars {
                    y: bars.iter().map(|b| b.volume as f64).collect(),
                },
                style: TraceStyle {
                    color: VOLUME_COLOR.to_string(),
                    ..TraceStyle::default()
                },
            }],
        };
        panels.push(Panel {
            kind,
            title: kind.title().to_string(),
            domain,
            traces,
        });
    }

    Ok(ChartLayout {
        title: options.title.clone(),
        x_axis_title: "Date".to_string(),
        y_axis_title: "Price".to_string(),
        x_ticks: thin_date_ticks(&dates, options.tick_step)?,
        dates,
        panels,
    })
}
