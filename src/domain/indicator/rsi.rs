//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both are 0 the price never moved and RSI is undefined.
//!
//! Warmup: first n values are undefined (n price changes are needed).

use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::{IndicatorType, Overlay};

pub fn rsi(closes: &[f64], period: usize) -> Result<Overlay, ChartError> {
    require_period("rsi period", period)?;

    let mut values = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(Overlay::new(IndicatorType::Rsi(period), values));
    }

    let mut gains: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / n;
    values[period] = rsi_value(avg_gain, avg_loss);

    for i in (period + 1)..closes.len() {
        let change_idx = i - 1;
        avg_gain = (avg_gain * (n - 1.0) + gains[change_idx]) / n;
        avg_loss = (avg_loss * (n - 1.0) + losses[change_idx]) / n;
        values[i] = rsi_value(avg_gain, avg_loss);
    }

    Ok(Overlay::new(IndicatorType::Rsi(period), values))
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { Some(100.0) } else { None }
    } else {
        Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
    }
}
