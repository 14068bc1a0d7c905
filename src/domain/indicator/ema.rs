//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) defined inputs produce undefined output.

use crate::domain::error::{require_period, ChartError};
use crate::domain::indicator::{IndicatorType, Overlay};

pub fn exponential_moving_average(closes: &[f64], period: usize) -> Result<Overlay, ChartError> {
    require_period("ema period", period)?;
    let input: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    Ok(Overlay::new(
        IndicatorType::Ema(period),
        ema_values(&input, period),
    ))
}

/// EMA over a sequence that may itself carry undefined positions, such as a
/// MACD line. Seeding starts at the first defined value.
pub fn ema_of_overlay(values: &[Option<f64>], period: usize) -> Result<Vec<Option<f64>>, ChartError> {
    require_period("ema period", period)?;
    Ok(ema_values(values, period))
}

/// An undefined input resets the seed, so output resumes only after another
/// `period` defined values.
pub(crate) fn ema_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for value in values {
        match (*value, ema) {
            (None, _) => {
                ema = None;
                seed_sum = 0.0;
                seed_count = 0;
            }
            (Some(v), Some(prev)) => {
                ema = Some(v * k + prev * (1.0 - k));
            }
            (Some(v), None) => {
                seed_sum += v;
                seed_count += 1;
                if seed_count == period {
                    ema = Some(seed_sum / period as f64);
                }
            }
        }
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ema_warmup() {
        let overlay = exponential_moving_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 3).unwrap();
        assert!(overlay.get(0).is_none());
        assert!(overlay.get(1).is_none());
        assert!(overlay.get(2).is_some());
        assert!(overlay.get(4).is_some());
    }

    #[test]
    fn ema_seed_is_sma() {
        let overlay = exponential_moving_average(&[10.0, 20.0, 30.0], 3).unwrap();
        assert_relative_eq!(overlay.get(2).unwrap(), 20.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let overlay = exponential_moving_average(&[10.0, 20.0, 30.0, 40.0, 50.0], 3).unwrap();
        let k = 2.0 / 4.0;
        let seed = 20.0;
        let ema_3 = 40.0 * k + seed * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        assert_relative_eq!(overlay.get(3).unwrap(), ema_3);
        assert_relative_eq!(overlay.get(4).unwrap(), ema_4);
    }

    #[test]
    fn ema_equal_prices() {
        let overlay = exponential_moving_average(&[100.0; 6], 3).unwrap();
        for i in 2..6 {
            assert_relative_eq!(overlay.get(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_over_overlay_skips_leading_undefined() {
        let values = [None, None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let out = ema_of_overlay(&values, 2).unwrap();
        assert_eq!(&out[..3], &[None, None, None]);
        assert_relative_eq!(out[3].unwrap(), 1.5);
        let k = 2.0 / 3.0;
        assert_relative_eq!(out[4].unwrap(), 3.0 * k + 1.5 * (1.0 - k));
    }

    #[test]
    fn ema_gap_restarts_seed() {
        let values = [Some(1.0), Some(3.0), None, Some(5.0), Some(7.0)];
        let out = ema_of_overlay(&values, 2).unwrap();
        assert_eq!(out[1], Some(2.0));
        assert_eq!(out[2], None);
        assert_eq!(out[3], None);
        assert_eq!(out[4], Some(6.0));
    }

    #[test]
    fn ema_zero_period_fails() {
        assert!(exponential_moving_average(&[1.0], 0).is_err());
        assert!(ema_of_overlay(&[Some(1.0)], 0).is_err());
    }

    #[test]
    fn ema_empty_input() {
        let overlay = exponential_moving_average(&[], 3).unwrap();
        assert!(overlay.is_empty());
    }
}
