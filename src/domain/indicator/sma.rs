//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) values are undefined.

use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::{IndicatorType, Overlay};

pub fn simple_moving_average(closes: &[f64], period: usize) -> Result<Overlay, ChartError> {
    require_period("sma period", period)?;
    Ok(Overlay::new(
        IndicatorType::Sma(period),
        sma_values(closes, period),
    ))
}

/// Trailing-window means; the caller guarantees `period > 0`.
pub(crate) fn sma_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
