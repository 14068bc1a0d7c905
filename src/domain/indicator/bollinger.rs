//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev defaults to the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=25, multiplier=2.0
//! Warmup: first (period-1) values are undefined.

use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::sma::sma_values;
use crate::domain::indicator::stddev::{rolling_std_dev, StdDevKind};
use crate::domain::indicator::{IndicatorType, Overlay};

pub const DEFAULT_PERIOD: usize = 25;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub multiplier: f64,
    pub kind: StdDevKind,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            multiplier: DEFAULT_MULTIPLIER,
            kind: StdDevKind::Sample,
        }
    }
}

impl BollingerParams {
    pub fn with_period(period: usize) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        require_period("bollinger period", self.period)?;
        if self.period < self.kind.min_period() {
            return Err(ChartError::invalid_parameter(
                "bollinger period",
                format!(
                    "{} standard deviation needs a period of at least {}",
                    self.kind,
                    self.kind.min_period()
                ),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(ChartError::invalid_parameter(
                "bollinger multiplier",
                "multiplier must be a positive number",
            ));
        }
        Ok(())
    }

    /// Exact bit pattern of the multiplier, used in the overlay key.
    pub fn multiplier_bits(&self) -> u64 {
        self.multiplier.to_bits()
    }

    pub fn upper_type(&self) -> IndicatorType {
        IndicatorType::BollingerUpper {
            period: self.period,
            multiplier_bits: self.multiplier_bits(),
        }
    }

    pub fn middle_type(&self) -> IndicatorType {
        IndicatorType::BollingerMiddle {
            period: self.period,
            multiplier_bits: self.multiplier_bits(),
        }
    }

    pub fn lower_type(&self) -> IndicatorType {
        IndicatorType::BollingerLower {
            period: self.period,
            multiplier_bits: self.multiplier_bits(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Overlay,
    pub middle: Overlay,
    pub lower: Overlay,
}

/// Bands with the default multiplier and sample standard deviation.
pub fn bollinger_bands(closes: &[f64], period: usize) -> Result<BollingerBands, ChartError> {
    bollinger_bands_with(closes, &BollingerParams::with_period(period))
}

pub fn bollinger_bands_with(
    closes: &[f64],
    params: &BollingerParams,
) -> Result<BollingerBands, ChartError> {
    params.validate()?;

    let middle = sma_values(closes, params.period);
    let stddev = rolling_std_dev(closes, params.period, params.kind)?;

    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());
    for (mid, sd) in middle.iter().zip(&stddev) {
        match (mid, sd) {
            (Some(m), Some(s)) => {
                let half_width = params.multiplier * s;
                upper.push(Some(m + half_width));
                lower.push(Some(m - half_width));
            }
            _ => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    Ok(BollingerBands {
        upper: Overlay::new(params.upper_type(), upper),
        middle: Overlay::new(params.middle_type(), middle),
        lower: Overlay::new(params.lower_type(), lower),
    })
}
