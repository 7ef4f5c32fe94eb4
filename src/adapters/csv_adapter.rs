//! CSV candle file adapter.
//!
//! One file per symbol (`BTC-USDT.csv` for `BTC/USDT`), columns
//! `timestamp,open,high,low,close,volume` with `YYYY-MM-DD HH:MM:SS`
//! timestamps. Rows are sorted by timestamp on load.

use crate::domain::candle::Candle;
use crate::domain::error::SigtraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.replace('/', "-")))
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, SigtraderError> {
    record
        .get(index)
        .ok_or_else(|| SigtraderError::Data {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|_| SigtraderError::Data {
            reason: format!("invalid {name} value '{}'", record.get(index).unwrap_or("")),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SigtraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp_str = record.get(0).ok_or_else(|| SigtraderError::Data {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| SigtraderError::Data {
                    reason: format!("invalid timestamp '{}': {}", timestamp_str.trim(), e),
                })?;

            if timestamp < start || timestamp > end {
                continue;
            }

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                symbols.push(stem.replace('-', "/"));
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
