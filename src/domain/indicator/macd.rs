//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is undefined for slow - 1 values, the signal line for
//! slow - 1 + signal - 1 values.

use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorType, Overlay};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdOverlays {
    pub line: Overlay,
    pub signal: Overlay,
}

pub(crate) fn validate_periods(fast: usize, slow: usize, signal: usize) -> Result<(), ChartError> {
    require_period("macd fast period", fast)?;
    require_period("macd slow period", slow)?;
    require_period("macd signal period", signal)?;
    if fast >= slow {
        return Err(ChartError::invalid_parameter(
            "macd fast period",
            format!("fast period {} must be shorter than slow period {}", fast, slow),
        ));
    }
    Ok(())
}

pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdOverlays, ChartError> {
    validate_periods(fast, slow, signal_period)?;

    let input: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    let ema_fast = ema_values(&input, fast);
    let ema_slow = ema_values(&input, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();
    let signal = ema_values(&line, signal_period);

    Ok(MacdOverlays {
        line: Overlay::new(
            IndicatorType::MacdLine {
                fast,
                slow,
                signal: signal_period,
            },
            line,
        ),
        signal: Overlay::new(
            IndicatorType::MacdSignal {
                fast,
                slow,
                signal: signal_period,
            },
            signal,
        ),
    })
}

pub fn macd_default(closes: &[f64]) -> Result<MacdOverlays, ChartError> {
    macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
