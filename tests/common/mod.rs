#![allow(dead_code)]

use chrono::NaiveDate;
use crosschart::domain::error::ChartError;
pub use crosschart::domain::ohlcv::{OhlcvBar, OhlcvSeries};
use crosschart::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        _exchange: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ChartError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ChartError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, ChartError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: date(date_str),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// Consecutive daily bars starting 2024-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date("2024-01-01");
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000 + i as u64 * 10,
        })
        .collect()
}

/// A wavy trend long enough for every default indicator to warm up and
/// for the short and long averages to cross several times.
pub fn generate_bars(n: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 1000.0 + (i as f64 / 12.0).sin() * 80.0 + i as f64 * 0.5)
        .collect();
    bars_from_closes(&closes)
}

pub fn make_series(code: &str, n: usize) -> OhlcvSeries {
    OhlcvSeries::new(code, generate_bars(n)).unwrap()
}

/// Bars serialized in the stooq CSV layout.
pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    csv
}
