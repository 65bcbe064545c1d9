//! Column-wise magnitude parsing with an explicit policy for bad cells.

use crate::domain::error::{IndexvolError, ParseError};
use crate::domain::magnitude;
use std::fmt;
use std::str::FromStr;

/// What to do with a cell that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Fail the whole column on the first bad cell.
    #[default]
    Abort,
    /// Leave the cell empty and record it.
    Skip,
    /// Substitute NaN and record it.
    Nan,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            "nan" => Ok(ErrorPolicy::Nan),
            other => Err(format!(
                "unknown error policy '{}' (expected abort, skip or nan)",
                other
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorPolicy::Abort => "abort",
            ErrorPolicy::Skip => "skip",
            ErrorPolicy::Nan => "nan",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCell {
    /// One-based position in the column.
    pub row: usize,
    pub error: ParseError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedColumn {
    /// One entry per input cell; `None` only under [`ErrorPolicy::Skip`].
    pub values: Vec<Option<f64>>,
    pub rejected: Vec<RejectedCell>,
}

impl ParsedColumn {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Apply [`magnitude::parse`] to every cell of a column.
///
/// `column` names the column in the `Cell` error returned under
/// [`ErrorPolicy::Abort`].
pub fn parse_column<I, S>(
    cells: I,
    column: &str,
    policy: ErrorPolicy,
) -> Result<ParsedColumn, IndexvolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedColumn::default();

    for (index, cell) in cells.into_iter().enumerate() {
        match parse_cell(cell.as_ref(), index + 1, column, policy)? {
            Ok(v) => parsed.values.push(v),
            Err(rejected) => {
                parsed.values.push(match policy {
                    ErrorPolicy::Nan => Some(f64::NAN),
                    _ => None,
                });
                parsed.rejected.push(rejected);
            }
        }
    }

    Ok(parsed)
}

/// Parse one cell under `policy`; `row` is one-based.
///
/// The outer `Result` is the abort path; the inner one hands a tolerated
/// rejection back to the caller.
pub fn parse_cell(
    raw: &str,
    row: usize,
    column: &str,
    policy: ErrorPolicy,
) -> Result<Result<Option<f64>, RejectedCell>, IndexvolError> {
    match magnitude::parse(raw) {
        Ok(v) => Ok(Ok(Some(v))),
        Err(source) if policy == ErrorPolicy::Abort => Err(IndexvolError::Cell {
            row,
            column: column.to_string(),
            source,
        }),
        Err(error) => Ok(Err(RejectedCell { row, error })),
    }
}
