//! CSV file data adapter.
//!
//! Reads `<dir>/<code>.csv` exports of index history. Columns are located by
//! header name, in English or in the Chinese labels the exchange exports
//! use; volume cells go through the magnitude parser.

use crate::domain::column::{parse_cell, ErrorPolicy};
use crate::domain::error::IndexvolError;
use crate::domain::ohlcv::IndexBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, LoadedSeries, RejectedRow};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

const FALLBACK_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATE: &[&str] = &["date", "日期"];
const OPEN: &[&str] = &["open", "開市", "开市", "开盘", "開盤"];
const HIGH: &[&str] = &["high", "高"];
const LOW: &[&str] = &["low", "低"];
const CLOSE: &[&str] = &["close", "收市", "收盘", "收盤"];
const VOLUME: &[&str] = &["volume", "vol.", "成交量", "交易量"];
const TOTAL_VOLUME: &[&str] = &["total_volume", "总交易量", "總交易量", "总成交量", "總成交量"];

pub struct CsvAdapter {
    base_path: PathBuf,
    date_format: String,
    policy: ErrorPolicy,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from the `[data]` and `[parse]` sections.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, IndexvolError> {
        let dir = config
            .get_string("data", "dir")
            .ok_or_else(|| IndexvolError::ConfigMissing {
                section: "data".into(),
                key: "dir".into(),
            })?;

        let policy = match config.get_string("parse", "on_error") {
            Some(s) => s.parse().map_err(|reason| IndexvolError::ConfigInvalid {
                section: "parse".into(),
                key: "on_error".into(),
                reason,
            })?,
            None => ErrorPolicy::default(),
        };

        let date_format = config
            .get_string("data", "date_format")
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        Ok(Self::new(PathBuf::from(dir))
            .with_date_format(&date_format)
            .with_policy(policy))
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        // Spreadsheet exports often append a midnight time.
        let day = raw.split_whitespace().next().unwrap_or(raw);
        std::iter::once(self.date_format.as_str())
            .chain(FALLBACK_DATE_FORMATS)
            .find_map(|fmt| {
                NaiveDate::parse_from_str(raw, fmt)
                    .or_else(|_| NaiveDate::parse_from_str(day, fmt))
                    .ok()
            })
    }
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    total_volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, path: &str) -> Result<Self, IndexvolError> {
        let find = |aliases: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim_start_matches('\u{feff}').trim().to_lowercase();
                aliases.iter().any(|a| *a == h)
            })
        };
        let require = |name: &str, aliases: &[&str]| {
            find(aliases).ok_or_else(|| IndexvolError::Data {
                reason: format!("missing {} column in {}", name, path),
            })
        };

        Ok(Self {
            date: require("date", DATE)?,
            open: require("open", OPEN)?,
            high: require("high", HIGH)?,
            low: require("low", LOW)?,
            close: require("close", CLOSE)?,
            volume: require("volume", VOLUME)?,
            total_volume: find(TOTAL_VOLUME),
        })
    }
}

fn cell<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, IndexvolError> {
    record.get(idx).ok_or_else(|| IndexvolError::Data {
        reason: format!("row {}: missing {} column", row, name),
    })
}

fn parse_price(raw: &str, name: &str, row: usize) -> Result<f64, IndexvolError> {
    raw.trim()
        .replace(',', "")
        .parse()
        .map_err(|_| IndexvolError::Data {
            reason: format!("row {}: invalid {} value '{}'", row, name, raw),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, code: &str) -> Result<LoadedSeries, IndexvolError> {
        let path = self.csv_path(code);
        let path_str = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| IndexvolError::Data {
            reason: format!("failed to read {}: {}", path_str, e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| IndexvolError::Data {
            reason: format!("CSV header error in {}: {}", path_str, e),
        })?;
        let cols = Columns::locate(headers, &path_str)?;

        let mut series = LoadedSeries {
            code: code.to_string(),
            ..LoadedSeries::default()
        };

        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| IndexvolError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            if record.iter().all(|c| c.is_empty()) {
                continue;
            }

            let date_str = cell(&record, cols.date, "date", row)?;
            let date = self.parse_date(date_str).ok_or_else(|| IndexvolError::Data {
                reason: format!(
                    "row {}: invalid date '{}' (expected {})",
                    row, date_str, self.date_format
                ),
            })?;

            let open = parse_price(cell(&record, cols.open, "open", row)?, "open", row)?;
            let high = parse_price(cell(&record, cols.high, "high", row)?, "high", row)?;
            let low = parse_price(cell(&record, cols.low, "low", row)?, "low", row)?;
            let close = parse_price(cell(&record, cols.close, "close", row)?, "close", row)?;

            let mut rejected = Vec::new();

            let volume_raw = cell(&record, cols.volume, "volume", row)?;
            let volume = match parse_cell(volume_raw, row, "volume", self.policy)? {
                Ok(v) => v.unwrap_or(f64::NAN),
                Err(rej) => {
                    rejected.push(("volume", rej));
                    f64::NAN
                }
            };

            let total_volume = match cols.total_volume.and_then(|idx| record.get(idx)) {
                None | Some("") => None,
                Some(raw) => match parse_cell(raw, row, "total_volume", self.policy)? {
                    Ok(v) => v,
                    Err(rej) => {
                        rejected.push(("total_volume", rej));
                        Some(f64::NAN)
                    }
                },
            };

            let drop_row = !rejected.is_empty() && self.policy == ErrorPolicy::Skip;
            series
                .rejected
                .extend(rejected.into_iter().map(|(column, cell)| RejectedRow {
                    column: column.to_string(),
                    cell,
                    dropped: drop_row,
                }));

            if drop_row {
                continue;
            }

            series.bars.push(IndexBar {
                date,
                open,
                high,
                low,
                close,
                volume,
                total_volume,
            });
        }

        series.bars.sort_by_key(|b| b.date);
        Ok(series)
    }

    fn list_codes(&self) -> Result<Vec<String>, IndexvolError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| IndexvolError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut codes = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| IndexvolError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}
