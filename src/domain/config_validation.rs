//! Configuration validation.
//!
//! Checks the `[data]` and `[parse]` sections before any file is read.

use crate::domain::column::ErrorPolicy;
use crate::domain::error::IndexvolError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const MAX_PRECISION: usize = 12;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    validate_dir(config)?;
    validate_codes(config)?;
    validate_dates(config)?;
    validate_policy(config)?;
    validate_precision(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> IndexvolError {
    IndexvolError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_dir(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(invalid("data", "dir", "dir must not be empty")),
        None => Err(IndexvolError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    match config.get_string("data", "codes") {
        Some(s) => parse_codes(&s).map(|_| ()),
        None => Ok(()),
    }
}

/// Split a comma-separated code list, uppercasing each code.
pub fn parse_codes(input: &str) -> Result<Vec<String>, IndexvolError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid("data", "codes", "empty token in code list"));
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(invalid("data", "codes", format!("duplicate code: {}", code)));
        }
        codes.push(code);
    }

    Ok(codes)
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    let start = config_date(config, "start_date")?;
    let end = config_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Optional `[data]` date in YYYY-MM-DD form.
pub fn config_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, IndexvolError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn validate_policy(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    match config.get_string("parse", "on_error") {
        Some(s) => s
            .parse::<ErrorPolicy>()
            .map(|_| ())
            .map_err(|reason| invalid("parse", "on_error", reason)),
        None => Ok(()),
    }
}

fn validate_precision(config: &dyn ConfigPort) -> Result<(), IndexvolError> {
    match config.get_string("parse", "precision") {
        Some(s) => match s.trim().parse::<usize>() {
            Ok(p) if p <= MAX_PRECISION => Ok(()),
            _ => Err(invalid(
                "parse",
                "precision",
                format!("precision must be an integer between 0 and {}", MAX_PRECISION),
            )),
        },
        None => Ok(()),
    }
}
