//! CSV file data adapter.
//!
//! Reads `<dir>/<code>_<exchange>.csv` files in the stooq download layout:
//! a `Date,Open,High,Low,Close,Volume` header followed by one row per
//! trading day. Header names are matched case-insensitively.

use crate::domain::error::ChartError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, exchange))
    }
}

fn data_err(reason: impl Into<String>) -> ChartError {
    ChartError::Data {
        reason: reason.into(),
    }
}

/// Column index for each of [`COLUMNS`], in that order.
fn column_indices(headers: &StringRecord) -> Result<[usize; 6], ChartError> {
    let mut indices = [0usize; 6];
    for (slot, wanted) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| data_err(format!("missing {} column", wanted)))?;
    }
    Ok(indices)
}

fn field<'r>(record: &'r StringRecord, index: usize, name: &str, line: u64) -> Result<&'r str, ChartError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_err(format!("line {}: missing {} value", line, name)))
}

fn price(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<f64, ChartError> {
    let raw = field(record, index, name, line)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| data_err(format!("line {}: invalid {} value '{}'", line, name, raw)))
}

/// Volumes are whole shares; some exports write them as `1234.0`.
fn volume(record: &StringRecord, index: usize, line: u64) -> Result<u64, ChartError> {
    let raw = field(record, index, "volume", line)?;
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
        _ => Err(data_err(format!("line {}: invalid volume value '{}'", line, raw))),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ChartError> {
        let path = self.csv_path(code, exchange);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_err(format!("CSV header error: {}", e)))?
            .clone();
        let [date_col, open_col, high_col, low_col, close_col, volume_col] =
            column_indices(&headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date_str = field(&record, date_col, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                data_err(format!("line {}: invalid date '{}': {}", line, date_str, e))
            })?;

            if start_date.is_some_and(|start| date < start) || end_date.is_some_and(|end| date > end) {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: price(&record, open_col, "open", line)?,
                high: price(&record, high_col, "high", line)?,
                low: price(&record, low_col, "low", line)?,
                close: price(&record, close_col, "close", line)?,
                volume: volume(&record, volume_col, line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        let before = bars.len();
        bars.dedup_by_key(|b| b.date);
        if bars.len() != before {
            warn!(code, exchange, dropped = before - bars.len(), "duplicate dates in CSV");
        }

        debug!(code, exchange, rows = bars.len(), path = %path.display(), "loaded OHLCV");
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, ChartError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let suffix = format!("_{}.csv", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(code) = name.strip_suffix(&suffix) {
                if !code.is_empty() {
                    symbols.push(code.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000.0\n";

        fs::write(path.join("7203_TSE.csv"), csv_content).unwrap();
        fs::write(path.join("6758_TSE.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();
        fs::write(path.join("AAPL_US.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_sorts_and_parses() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("7203", "TSE", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[1].volume, 60000);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_ohlcv("7203", "TSE", Some(day), Some(day)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);

        let bars = adapter.fetch_ohlcv("7203", "TSE", Some(day), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_ohlcv_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_ohlcv("XYZ", "TSE", None, None).unwrap_err();
        assert!(matches!(err, ChartError::Data { .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_ohlcv("6758", "TSE", None, None).unwrap().is_empty());
    }

    #[test]
    fn lowercase_headers_in_any_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X_TSE.csv"),
            "date,volume,close,low,high,open\n2024-02-01,10,4.0,3.0,5.0,3.5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_ohlcv("X", "TSE", None, None).unwrap();
        assert_eq!(bars[0].open, 3.5);
        assert_eq!(bars[0].close, 4.0);
        assert_eq!(bars[0].volume, 10);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("X_TSE.csv"), "Date,Open,High,Low,Close\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_ohlcv("X", "TSE", None, None).unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn bad_price_is_reported_with_line() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X_TSE.csv"),
            "Date,Open,High,Low,Close,Volume\n2024-02-01,1,2,0.5,n/a,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_ohlcv("X", "TSE", None, None).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn duplicate_dates_keep_one_row() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X_TSE.csv"),
            "Date,Open,High,Low,Close,Volume\n\
             2024-02-01,1,2,0.5,1.5,10\n\
             2024-02-01,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.fetch_ohlcv("X", "TSE", None, None).unwrap().len(), 1);
    }

    #[test]
    fn list_symbols_returns_exchange_symbols() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_symbols("TSE").unwrap(), vec!["6758", "7203"]);
        assert_eq!(adapter.list_symbols("US").unwrap(), vec!["AAPL"]);
        assert!(adapter.list_symbols("LSE").unwrap().is_empty());
    }
}
