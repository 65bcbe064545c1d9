//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{config_date, parse_codes, validate_config, MAX_PRECISION};
use crate::domain::error::IndexvolError;
use crate::domain::magnitude::{self, DEFAULT_PRECISION};
use crate::domain::ohlcv::IndexBar;
use crate::domain::series::{align, filter_months, filter_range, overlay_by_year, parse_months};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, LoadedSeries};

#[derive(Parser, Debug)]
#[command(name = "indexvol", about = "Index volume data cleaning")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse magnitude strings such as 12.3B or 450M
    Parse {
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Format numbers with a K/M/B/T suffix
    Format {
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
        #[arg(short, long)]
        precision: Option<usize>,
    },
    /// Print cleaned bars with midpoint and volume share
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print high/low/midpoint per year on a shared month-day axis
    Overlay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// Comma-separated months to keep, e.g. 9,10,11,12
        #[arg(long)]
        months: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Align two indices by date and compare their volumes
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        primary: String,
        #[arg(long)]
        secondary: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List codes available in the data directory
    ListCodes {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Parse { values } => run_parse(&values),
        Command::Format { values, precision } => run_format(&values, precision),
        Command::Summary {
            config,
            code,
            output,
        } => run_summary(&config, code.as_deref(), output.as_ref()),
        Command::Overlay {
            config,
            code,
            months,
            output,
        } => run_overlay(&config, code.as_deref(), months.as_deref(), output.as_ref()),
        Command::Compare {
            config,
            primary,
            secondary,
            output,
        } => run_compare(&config, &primary, &secondary, output.as_ref()),
        Command::ListCodes { config } => run_list_codes(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: &IndexvolError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(&IndexvolError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Load and validate a config, then build the CSV adapter it describes.
fn load_validated(path: &PathBuf) -> Result<(FileConfigAdapter, CsvAdapter), ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let config = load_config(path)?;
    validate_config(&config).map_err(|e| fail(&e))?;
    let adapter = CsvAdapter::from_config(&config).map_err(|e| fail(&e))?;
    Ok((config, adapter))
}

/// Render a table in memory and write it to `path` (or stdout) only once
/// the pipeline has succeeded. A failed run leaves an existing file as it was.
pub fn write_rendered<F>(path: Option<&PathBuf>, pipeline: F) -> Result<usize, IndexvolError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<usize, IndexvolError>,
{
    let mut buf = Vec::new();
    let rows = pipeline(&mut buf)?;
    match path {
        Some(p) => File::create(p)?.write_all(&buf)?,
        None => io::stdout().write_all(&buf)?,
    }
    Ok(rows)
}

fn finish(result: Result<usize, IndexvolError>, output: Option<&PathBuf>) -> ExitCode {
    match result {
        Ok(rows) => {
            match output {
                Some(p) => eprintln!("{} rows written to: {}", rows, p.display()),
                None => eprintln!("{} rows", rows),
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

// --- parse / format ---

fn run_parse(values: &[String]) -> ExitCode {
    for raw in values {
        match magnitude::parse(raw) {
            Ok(v) => println!("{}\t{}", raw, v),
            Err(e) => {
                eprintln!("error: {}", e.display_with_context());
                return (&IndexvolError::from(e)).into();
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_format(values: &[String], precision: Option<usize>) -> ExitCode {
    let precision = precision.unwrap_or(DEFAULT_PRECISION);
    if precision > MAX_PRECISION {
        return fail(&IndexvolError::ConfigInvalid {
            section: "cli".into(),
            key: "precision".into(),
            reason: format!("precision must be between 0 and {}", MAX_PRECISION),
        });
    }

    for raw in values {
        match magnitude::parse(raw) {
            Ok(v) => println!("{}\t{}", raw, magnitude::format(v, precision)),
            Err(e) => {
                eprintln!("error: {}", e.display_with_context());
                return (&IndexvolError::from(e)).into();
            }
        }
    }
    ExitCode::SUCCESS
}

// --- data commands ---

/// Output options shared by the table-producing commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
    pub header: bool,
    pub precision: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            header: true,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl TableOptions {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let precision = config.get_int("parse", "precision", DEFAULT_PRECISION as i64);
        Self {
            header: config.get_bool("output", "header", true),
            precision: usize::try_from(precision)
                .unwrap_or(DEFAULT_PRECISION)
                .min(MAX_PRECISION),
        }
    }
}

/// Codes from `--code`, else `[data] codes`.
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, IndexvolError> {
    if let Some(c) = code_override {
        return Ok(vec![c.trim().to_uppercase()]);
    }
    match config.get_string("data", "codes") {
        Some(s) => parse_codes(&s),
        None => Err(IndexvolError::ConfigMissing {
            section: "data".into(),
            key: "codes".into(),
        }),
    }
}

/// Fetch one code, report tolerated cells on stderr and apply the
/// configured date range.
pub fn load_series(
    data_port: &dyn DataPort,
    code: &str,
    config: &dyn ConfigPort,
) -> Result<LoadedSeries, IndexvolError> {
    let start = config_date(config, "start_date")?;
    let end = config_date(config, "end_date")?;

    let mut series = data_port.fetch_bars(code)?;
    for rej in &series.rejected {
        let action = if rej.dropped { "skipping row" } else { "NaN in row" };
        eprintln!(
            "warning: {} {} of {} ({}): {}",
            action, rej.cell.row, code, rej.column, rej.cell.error
        );
    }

    series.bars = filter_range(&series.bars, start, end);
    if series.bars.is_empty() {
        return Err(IndexvolError::NoData {
            code: code.to_string(),
        });
    }
    eprintln!("Loaded {}: {} bars", code, series.bars.len());
    Ok(series)
}

fn price(v: f64) -> String {
    format!("{:.2}", v)
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

pub const SUMMARY_HEADER: [&str; 11] = [
    "code",
    "date",
    "open",
    "high",
    "low",
    "close",
    "midpoint",
    "volume",
    "volume_fmt",
    "total_volume",
    "volume_share_pct",
];

pub fn summary_row(code: &str, bar: &IndexBar, precision: usize) -> Vec<String> {
    vec![
        code.to_string(),
        bar.date.to_string(),
        price(bar.open),
        price(bar.high),
        price(bar.low),
        price(bar.close),
        price(bar.midpoint()),
        bar.volume.to_string(),
        magnitude::format(bar.volume, precision),
        opt_num(bar.total_volume),
        opt_num(bar.volume_share_pct()),
    ]
}

fn write_table<W: Write>(
    out: W,
    header: &[&str],
    rows: &[Vec<String>],
    opts: TableOptions,
) -> Result<usize, IndexvolError> {
    let mut wtr = csv::Writer::from_writer(out);
    let to_io = |e: csv::Error| IndexvolError::Io(io::Error::other(e));
    if opts.header {
        wtr.write_record(header).map_err(to_io)?;
    }
    for row in rows {
        wtr.write_record(row).map_err(to_io)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

pub fn run_summary_pipeline<W: Write>(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    codes: &[String],
    out: W,
) -> Result<usize, IndexvolError> {
    let opts = TableOptions::from_config(config);
    let mut rows = Vec::new();

    for code in codes {
        let series = load_series(data_port, code, config)?;
        rows.extend(
            series
                .bars
                .iter()
                .map(|bar| summary_row(code, bar, opts.precision)),
        );
    }

    write_table(out, &SUMMARY_HEADER, &rows, opts)
}

pub const OVERLAY_HEADER: [&str; 6] = ["code", "year", "month_day", "high", "low", "midpoint"];

pub fn run_overlay_pipeline<W: Write>(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    codes: &[String],
    months: &[u32],
    out: W,
) -> Result<usize, IndexvolError> {
    let opts = TableOptions::from_config(config);
    let mut rows = Vec::new();

    for code in codes {
        let series = load_series(data_port, code, config)?;
        let bars = filter_months(&series.bars, months);
        for year in overlay_by_year(&bars) {
            eprintln!("  {} {}: {} points", code, year.year, year.points.len());
            for p in &year.points {
                rows.push(vec![
                    code.clone(),
                    year.year.to_string(),
                    p.day.format("%m-%d").to_string(),
                    price(p.high),
                    price(p.low),
                    price(p.midpoint),
                ]);
            }
        }
    }

    write_table(out, &OVERLAY_HEADER, &rows, opts)
}

pub const COMPARE_HEADER: [&str; 6] = [
    "date",
    "primary_mid",
    "secondary_mid",
    "primary_volume",
    "secondary_volume",
    "volume_share_pct",
];

pub fn run_compare_pipeline<W: Write>(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    primary: &str,
    secondary: &str,
    out: W,
) -> Result<usize, IndexvolError> {
    let opts = TableOptions::from_config(config);
    let p = load_series(data_port, primary, config)?;
    let s = load_series(data_port, secondary, config)?;

    let aligned = align(&p.bars, &s.bars);
    if aligned.is_empty() {
        return Err(IndexvolError::Data {
            reason: format!("{} and {} share no trading dates", primary, secondary),
        });
    }

    let rows: Vec<Vec<String>> = aligned
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                price(r.primary_mid),
                price(r.secondary_mid),
                r.primary_volume.to_string(),
                r.secondary_volume.to_string(),
                opt_num(r.volume_share_pct),
            ]
        })
        .collect();

    write_table(out, &COMPARE_HEADER, &rows, opts)
}

fn run_summary(config_path: &PathBuf, code: Option<&str>, output: Option<&PathBuf>) -> ExitCode {
    let (config, adapter) = match load_validated(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let result = resolve_codes(code, &config).and_then(|codes| {
        write_rendered(output, |out| {
            run_summary_pipeline(&adapter, &config, &codes, out)
        })
    });
    finish(result, output)
}

fn run_overlay(
    config_path: &PathBuf,
    code: Option<&str>,
    months: Option<&str>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let months = match months.map(parse_months).transpose() {
        Ok(m) => m.unwrap_or_default(),
        Err(reason) => {
            return fail(&IndexvolError::ConfigInvalid {
                section: "cli".into(),
                key: "months".into(),
                reason,
            });
        }
    };
    let (config, adapter) = match load_validated(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let result = resolve_codes(code, &config).and_then(|codes| {
        write_rendered(output, |out| {
            run_overlay_pipeline(&adapter, &config, &codes, &months, out)
        })
    });
    finish(result, output)
}

fn run_compare(
    config_path: &PathBuf,
    primary: &str,
    secondary: &str,
    output: Option<&PathBuf>,
) -> ExitCode {
    let (config, adapter) = match load_validated(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    let primary = primary.trim().to_uppercase();
    let secondary = secondary.trim().to_uppercase();
    eprintln!("Comparing {} against {}", primary, secondary);
    let result = write_rendered(output, |out| {
        run_compare_pipeline(&adapter, &config, &primary, &secondary, out)
    });
    finish(result, output)
}

fn run_list_codes(config_path: &PathBuf) -> ExitCode {
    let (_config, adapter) = match load_validated(config_path) {
        Ok(pair) => pair,
        Err(code) => return code,
    };
    match adapter.list_codes() {
        Ok(codes) if codes.is_empty() => {
            eprintln!("No data files found");
            ExitCode::SUCCESS
        }
        Ok(codes) => {
            for code in &codes {
                println!("{}", code);
            }
            eprintln!("{} codes found", codes.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }

    let opts = TableOptions::from_config(&config);
    eprintln!(
        "  dir:       {}",
        config.get_string("data", "dir").unwrap_or_default()
    );
    eprintln!(
        "  codes:     {}",
        config.get_string("data", "codes").unwrap_or_default()
    );
    eprintln!(
        "  on_error:  {}",
        config
            .get_string("parse", "on_error")
            .unwrap_or_else(|| "abort".to_string())
    );
    eprintln!("  precision: {}", opts.precision);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
