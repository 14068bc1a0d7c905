//! Technical indicator implementations.
//!
//! This module provides types for representing indicator output:
//! - `IndicatorType`: indicator identity + parameters (serves as map key)
//! - `Overlay`: one indicator's values aligned 1:1 with the input series
//! - `Overlays`: the caller-owned mapping every computation attaches to
//! - `IndicatorRequest`: a batch entry for [`compute_indicators`]
//!
//! Undefined positions (warm-up, no price movement) are `None`.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::{bollinger_bands, bollinger_bands_with, BollingerBands, BollingerParams};
pub use ema::{ema_of_overlay, exponential_moving_average};
pub use macd::{macd, macd_default, MacdOverlays};
pub use rsi::rsi;
pub use sma::simple_moving_average;
pub use stddev::{rolling_std_dev, StdDevKind};

use crate::domain::error::{require_period, ChartError};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    MacdLine {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    BollingerUpper {
        period: usize,
        multiplier_bits: u64,
    },
    BollingerMiddle {
        period: usize,
        multiplier_bits: u64,
    },
    BollingerLower {
        period: usize,
        multiplier_bits: u64,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "sma{}", period),
            IndicatorType::Ema(period) => write!(f, "ema{}", period),
            IndicatorType::Rsi(period) => write!(f, "rsi{}", period),
            IndicatorType::MacdLine { .. } => write!(f, "macd"),
            IndicatorType::MacdSignal { .. } => write!(f, "macd_signal"),
            IndicatorType::BollingerUpper { .. } => write!(f, "bb_up"),
            IndicatorType::BollingerMiddle { .. } => write!(f, "bb_mid"),
            IndicatorType::BollingerLower { .. } => write!(f, "bb_low"),
        }
    }
}

/// An indicator's values, index-aligned with the series it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub indicator: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl Overlay {
    pub fn new(indicator: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self { indicator, values }
    }

    pub fn name(&self) -> String {
        self.indicator.to_string()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Number of leading undefined positions.
    pub fn warmup(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }

    /// Values of the last `n` positions.
    pub fn tail(&self, n: usize) -> &[Option<f64>] {
        &self.values[self.values.len().saturating_sub(n)..]
    }
}

/// Results mapping keyed by indicator identity, iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct Overlays {
    entries: BTreeMap<IndicatorType, Overlay>,
}

impl Overlays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, overlay: Overlay) {
        self.entries.insert(overlay.indicator, overlay);
    }

    pub fn get(&self, indicator: &IndicatorType) -> Option<&Overlay> {
        self.entries.get(indicator)
    }

    /// Look an overlay up by its display name, e.g. `"sma25"` or `"bb_up"`.
    pub fn by_name(&self, name: &str) -> Option<&Overlay> {
        self.entries.values().find(|o| o.name() == name)
    }

    pub fn require(&self, indicator: &IndicatorType) -> Result<&Overlay, ChartError> {
        self.get(indicator).ok_or_else(|| ChartError::MissingOverlay {
            name: indicator.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.entries.values()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorRequest {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger(BollingerParams),
}

impl IndicatorRequest {
    pub fn validate(&self) -> Result<(), ChartError> {
        match self {
            IndicatorRequest::Sma(p) => require_period("sma period", *p),
            IndicatorRequest::Ema(p) => require_period("ema period", *p),
            IndicatorRequest::Rsi(p) => require_period("rsi period", *p),
            IndicatorRequest::Macd { fast, slow, signal } => {
                macd::validate_periods(*fast, *slow, *signal)
            }
            IndicatorRequest::Bollinger(params) => params.validate(),
        }
    }
}

impl fmt::Display for IndicatorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorRequest::Sma(p) => write!(f, "SMA({})", p),
            IndicatorRequest::Ema(p) => write!(f, "EMA({})", p),
            IndicatorRequest::Rsi(p) => write!(f, "RSI({})", p),
            IndicatorRequest::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorRequest::Bollinger(params) => write!(
                f,
                "BB({},{},{})",
                params.period, params.multiplier, params.kind
            ),
        }
    }
}

/// Evaluate every request against `closes` and attach the overlays to `out`.
///
/// All requests are validated before any computation runs, so a bad
/// parameter leaves `out` untouched.
pub fn compute_indicators(
    closes: &[f64],
    requests: &[IndicatorRequest],
    out: &mut Overlays,
) -> Result<(), ChartError> {
    for request in requests {
        request.validate()?;
    }

    for request in requests {
        match request {
            IndicatorRequest::Sma(p) => out.insert(simple_moving_average(closes, *p)?),
            IndicatorRequest::Ema(p) => out.insert(exponential_moving_average(closes, *p)?),
            IndicatorRequest::Rsi(p) => out.insert(rsi(closes, *p)?),
            IndicatorRequest::Macd { fast, slow, signal } => {
                let result = macd(closes, *fast, *slow, *signal)?;
                out.insert(result.line);
                out.insert(result.signal);
            }
            IndicatorRequest::Bollinger(params) => {
                let bands = bollinger_bands_with(closes, params)?;
                out.insert(bands.upper);
                out.insert(bands.middle);
                out.insert(bands.lower);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_names() {
        assert_eq!(IndicatorType::Sma(5).to_string(), "sma5");
        assert_eq!(IndicatorType::Rsi(28).to_string(), "rsi28");
        assert_eq!(IndicatorType::Ema(12).to_string(), "ema12");
        let line = IndicatorType::MacdLine {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(line.to_string(), "macd");
        let signal = IndicatorType::MacdSignal {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(signal.to_string(), "macd_signal");
        let up = IndicatorType::BollingerUpper {
            period: 25,
            multiplier_bits: 2.0f64.to_bits(),
        };
        assert_eq!(up.to_string(), "bb_up");
    }

    #[test]
    fn request_display() {
        assert_eq!(IndicatorRequest::Sma(75).to_string(), "SMA(75)");
        let macd = IndicatorRequest::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
        assert_eq!(
            IndicatorRequest::Bollinger(BollingerParams::default()).to_string(),
            "BB(25,2,sample)"
        );
    }

    #[test]
    fn overlay_warmup_and_get() {
        let overlay = Overlay::new(IndicatorType::Sma(3), vec![None, None, Some(2.0), Some(3.0)]);
        assert_eq!(overlay.warmup(), 2);
        assert_eq!(overlay.get(1), None);
        assert_eq!(overlay.get(3), Some(3.0));
        assert_eq!(overlay.get(10), None);
        assert_eq!(overlay.tail(2), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn compute_indicators_fills_mapping() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let mut overlays = Overlays::new();
        compute_indicators(
            &closes,
            &[
                IndicatorRequest::Sma(5),
                IndicatorRequest::Sma(25),
                IndicatorRequest::Rsi(14),
                IndicatorRequest::Macd {
                    fast: 12,
                    slow: 26,
                    signal: 9,
                },
                IndicatorRequest::Bollinger(BollingerParams::default()),
            ],
            &mut overlays,
        )
        .unwrap();

        assert_eq!(overlays.len(), 8);
        for name in ["sma5", "sma25", "rsi14", "macd", "macd_signal", "bb_up", "bb_mid", "bb_low"] {
            let overlay = overlays.by_name(name).unwrap_or_else(|| panic!("missing {name}"));
            assert_eq!(overlay.len(), closes.len(), "{name} length");
        }
    }

    #[test]
    fn close_bollinger_multipliers_keep_separate_overlays() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.5).cos() * 3.0).collect();
        let narrow = BollingerParams {
            multiplier: 2.001,
            ..BollingerParams::with_period(10)
        };
        let wide = BollingerParams {
            multiplier: 2.004,
            ..BollingerParams::with_period(10)
        };
        let mut overlays = Overlays::new();
        compute_indicators(
            &closes,
            &[
                IndicatorRequest::Bollinger(narrow.clone()),
                IndicatorRequest::Bollinger(wide.clone()),
            ],
            &mut overlays,
        )
        .unwrap();

        assert_eq!(overlays.len(), 6);
        let narrow_up = overlays.get(&narrow.upper_type()).unwrap();
        let wide_up = overlays.get(&wide.upper_type()).unwrap();
        assert!(wide_up.get(20).unwrap() > narrow_up.get(20).unwrap());
    }

    #[test]
    fn compute_indicators_validates_before_computing() {
        let closes = vec![1.0, 2.0, 3.0];
        let mut overlays = Overlays::new();
        let err = compute_indicators(
            &closes,
            &[IndicatorRequest::Sma(2), IndicatorRequest::Rsi(0)],
            &mut overlays,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::InvalidParameter { .. }));
        assert!(overlays.is_empty());
    }

    #[test]
    fn require_reports_missing_overlay() {
        let overlays = Overlays::new();
        let err = overlays.require(&IndicatorType::Sma(75)).unwrap_err();
        assert!(matches!(err, ChartError::MissingOverlay { name } if name == "sma75"));
    }

    #[test]
    fn overlays_insert_replaces_same_key() {
        let mut overlays = Overlays::new();
        overlays.insert(Overlay::new(IndicatorType::Sma(2), vec![None]));
        overlays.insert(Overlay::new(IndicatorType::Sma(2), vec![Some(1.0)]));
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays.get(&IndicatorType::Sma(2)).unwrap().get(0), Some(1.0));
    }
}
