//! Analysis configuration and the single-pass indicator → crossover → layout
//! pipeline.

use crate::domain::crossover::{detect_crossovers, CrossoverConfig, CrossoverEvent};
use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::macd::{self, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{
    compute_indicators, BollingerParams, IndicatorRequest, IndicatorType, Overlays,
};
use crate::domain::layout::{
    build_layout, BandOptions, ChartLayout, LayoutOptions, LineSpec, MacdLines, PriceStyle,
    DEFAULT_TICK_STEP,
};
use crate::domain::ohlcv::OhlcvSeries;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const CROSS_SHORT_COLOR: &str = "#ff007f";
const CROSS_LONG_COLOR: &str = "#7fbfff";
const SMA_COLORS: [&str; 3] = ["blue", "purple", "yellow"];
const OSCILLATOR_COLORS: [&str; 2] = ["red", "blue"];

/// Which panels a chart shows, and over how many rows by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPreset {
    #[default]
    Summary,
    Cross,
    Sma,
    Macd,
    Rsi,
    MacdRsiSma,
    Bollinger,
    Candle,
    Line,
}

impl ChartPreset {
    pub const ALL: [ChartPreset; 9] = [
        ChartPreset::Summary,
        ChartPreset::Cross,
        ChartPreset::Sma,
        ChartPreset::Macd,
        ChartPreset::Rsi,
        ChartPreset::MacdRsiSma,
        ChartPreset::Bollinger,
        ChartPreset::Candle,
        ChartPreset::Line,
    ];

    pub fn default_window(self) -> Option<usize> {
        match self {
            ChartPreset::Summary => Some(120),
            ChartPreset::Cross | ChartPreset::Sma | ChartPreset::MacdRsiSma => Some(200),
            ChartPreset::Macd | ChartPreset::Rsi => Some(100),
            ChartPreset::Bollinger => Some(300),
            ChartPreset::Candle => Some(500),
            ChartPreset::Line => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChartPreset::Summary => "summary",
            ChartPreset::Cross => "cross",
            ChartPreset::Sma => "sma",
            ChartPreset::Macd => "macd",
            ChartPreset::Rsi => "rsi",
            ChartPreset::MacdRsiSma => "macd-rsi-sma",
            ChartPreset::Bollinger => "bollinger",
            ChartPreset::Candle => "candle",
            ChartPreset::Line => "line",
        }
    }
}

impl fmt::Display for ChartPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ChartPreset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ChartPreset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Chart title; the series code is used when empty.
    pub title: String,
    pub preset: ChartPreset,
    pub crossover: CrossoverConfig,
    pub sma_periods: Vec<usize>,
    pub rsi_periods: Vec<usize>,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger: BollingerParams,
    /// Overrides the preset's window when set.
    pub display_window: Option<usize>,
    pub tick_step: usize,
    /// Overrides the preset's volume panel toggle when set.
    pub show_volume: Option<bool>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            preset: ChartPreset::Summary,
            crossover: CrossoverConfig::default(),
            sma_periods: vec![5, 25, 75],
            rsi_periods: vec![14, 28],
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            bollinger: BollingerParams::default(),
            display_window: None,
            tick_step: DEFAULT_TICK_STEP,
            show_volume: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        self.crossover.validate()?;
        for p in &self.sma_periods {
            require_period("sma period", *p)?;
        }
        for p in &self.rsi_periods {
            require_period("rsi period", *p)?;
        }
        macd::validate_periods(self.macd_fast, self.macd_slow, self.macd_signal)?;
        self.bollinger.validate()?;
        if self.display_window == Some(0) {
            return Err(ChartError::invalid_parameter(
                "display window",
                "display window must keep at least one row",
            ));
        }
        require_period("tick step", self.tick_step)?;
        Ok(())
    }

    pub fn window(&self) -> Option<usize> {
        self.display_window.or(self.preset.default_window())
    }

    /// Every indicator the analysis computes; duplicates are dropped.
    pub fn indicator_requests(&self) -> Vec<IndicatorRequest> {
        let mut sma: Vec<usize> = self.sma_periods.clone();
        sma.push(self.crossover.short_period);
        sma.push(self.crossover.long_period);
        sma.sort_unstable();
        sma.dedup();

        let mut rsi = self.rsi_periods.clone();
        rsi.sort_unstable();
        rsi.dedup();

        let mut requests: Vec<IndicatorRequest> =
            sma.into_iter().map(IndicatorRequest::Sma).collect();
        requests.extend(rsi.into_iter().map(IndicatorRequest::Rsi));
        requests.push(IndicatorRequest::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        });
        requests.push(IndicatorRequest::Bollinger(self.bollinger.clone()));
        requests
    }

    fn cross_lines(&self) -> Vec<LineSpec> {
        let CrossoverConfig {
            short_period,
            long_period,
        } = self.crossover;
        vec![
            LineSpec::new(
                IndicatorType::Sma(short_period),
                format!("MA{}", short_period),
                CROSS_SHORT_COLOR,
            ),
            LineSpec::new(
                IndicatorType::Sma(long_period),
                format!("MA{}", long_period),
                CROSS_LONG_COLOR,
            ),
        ]
    }

    fn sma_lines(&self) -> Vec<LineSpec> {
        self.sma_periods
            .iter()
            .enumerate()
            .map(|(i, p)| {
                LineSpec::new(
                    IndicatorType::Sma(*p),
                    format!("MA{}", p),
                    SMA_COLORS[i % SMA_COLORS.len()],
                )
            })
            .collect()
    }

    fn rsi_lines(&self) -> Vec<LineSpec> {
        self.rsi_periods
            .iter()
            .enumerate()
            .map(|(i, p)| {
                LineSpec::new(
                    IndicatorType::Rsi(*p),
                    format!("RSI{}", p),
                    OSCILLATOR_COLORS[i % OSCILLATOR_COLORS.len()],
                )
            })
            .collect()
    }

    fn macd_lines(&self) -> MacdLines {
        let (fast, slow, signal) = (self.macd_fast, self.macd_slow, self.macd_signal);
        MacdLines {
            line: LineSpec::new(
                IndicatorType::MacdLine { fast, slow, signal },
                "MACD",
                OSCILLATOR_COLORS[0],
            ),
            signal: LineSpec::new(
                IndicatorType::MacdSignal { fast, slow, signal },
                "Signal",
                OSCILLATOR_COLORS[1],
            ),
        }
    }

    pub fn layout_options(&self, default_title: &str) -> LayoutOptions {
        let title = if self.title.trim().is_empty() {
            default_title.to_string()
        } else {
            self.title.clone()
        };
        let base = LayoutOptions {
            title,
            display_window: self.window(),
            tick_step: self.tick_step,
            ..LayoutOptions::default()
        };

        let mut options = match self.preset {
            ChartPreset::Summary => LayoutOptions {
                moving_averages: self.cross_lines(),
                crossovers: true,
                bands: Some(BandOptions::from_params(&self.bollinger, false)),
                rsi: self.rsi_lines(),
                macd: Some(self.macd_lines()),
                ..base
            },
            ChartPreset::Cross => LayoutOptions {
                moving_averages: self.cross_lines(),
                crossovers: true,
                volume: false,
                ..base
            },
            ChartPreset::Sma | ChartPreset::Candle => LayoutOptions {
                moving_averages: self.sma_lines(),
                ..base
            },
            ChartPreset::Macd => LayoutOptions {
                macd: Some(self.macd_lines()),
                ..base
            },
            ChartPreset::Rsi => LayoutOptions {
                rsi: self.rsi_lines(),
                ..base
            },
            ChartPreset::MacdRsiSma => LayoutOptions {
                moving_averages: self.sma_lines(),
                rsi: self.rsi_lines(),
                macd: Some(self.macd_lines()),
                ..base
            },
            ChartPreset::Bollinger => LayoutOptions {
                bands: Some(BandOptions::from_params(&self.bollinger, true)),
                ..base
            },
            ChartPreset::Line => LayoutOptions {
                price_style: PriceStyle::CloseLine,
                volume: false,
                ..base
            },
        };
        if let Some(volume) = self.show_volume {
            options.volume = volume;
        }
        options
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub overlays: Overlays,
    pub events: Vec<CrossoverEvent>,
    pub layout: ChartLayout,
}

/// Compute every overlay over the full history, detect crossovers on the
/// configured pair, then cut everything to the display window.
pub fn run_analysis(series: &OhlcvSeries, config: &AnalysisConfig) -> Result<Analysis, ChartError> {
    config.validate()?;

    let mut overlays = Overlays::new();
    compute_indicators(&series.closes(), &config.indicator_requests(), &mut overlays)?;

    let short = overlays.require(&IndicatorType::Sma(config.crossover.short_period))?;
    let long = overlays.require(&IndicatorType::Sma(config.crossover.long_period))?;
    let events = detect_crossovers(&series.dates(), &short.values, &long.values)?;

    let layout = build_layout(series, &overlays, &events, &config.layout_options(series.code()))?;

    debug!(
        code = series.code(),
        rows = series.len(),
        overlays = overlays.len(),
        events = events.len(),
        panels = layout.panels.len(),
        preset = %config.preset,
        "analysis complete"
    );

    Ok(Analysis {
        overlays,
        events,
        layout,
    })
}
