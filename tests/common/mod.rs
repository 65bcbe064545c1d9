#![allow(dead_code)]

use chrono::NaiveDate;
use indexvol::domain::column::RejectedCell;
use indexvol::domain::error::IndexvolError;
pub use indexvol::domain::ohlcv::IndexBar;
use indexvol::ports::data_port::{DataPort, LoadedSeries, RejectedRow};
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<IndexBar>>,
    pub rejected: HashMap<String, Vec<RejectedRow>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            rejected: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<IndexBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_rejected(
        mut self,
        code: &str,
        column: &str,
        cell: RejectedCell,
        dropped: bool,
    ) -> Self {
        self.rejected
            .entry(code.to_string())
            .or_default()
            .push(RejectedRow {
                column: column.to_string(),
                cell,
                dropped,
            });
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, code: &str) -> Result<LoadedSeries, IndexvolError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(IndexvolError::Data {
                reason: reason.clone(),
            });
        }
        Ok(LoadedSeries {
            code: code.to_string(),
            bars: self.data.get(code).cloned().unwrap_or_default(),
            rejected: self.rejected.get(code).cloned().unwrap_or_default(),
        })
    }

    fn list_codes(&self) -> Result<Vec<String>, IndexvolError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64, volume: f64) -> IndexBar {
    IndexBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 10.0,
        high: close + 20.0,
        low: close - 20.0,
        close,
        volume,
        total_volume: None,
    }
}

/// One bar per calendar day from `start_date`.
pub fn generate_bars(
    start_date: &str,
    count: usize,
    start_price: f64,
    volume: f64,
) -> Vec<IndexBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| IndexBar {
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 5.0,
            low: start_price + i as f64 - 5.0,
            close: start_price + i as f64,
            volume,
            total_volume: Some(volume * 4.0),
        })
        .collect()
}
