//! Command-line front end: inspect a file, draw the exploratory charts, or
//! forecast a held-out window.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use forecast_explorer::config::ExplorerConfig;
use forecast_explorer::core::Period;
use forecast_explorer::explore::{gallery, write_gallery};
use forecast_explorer::io::{self, spreadsheet, RawTable, SourceFormat};
use forecast_explorer::pipeline::{self, SeriesRequest, MAX_SAMPLES};
use forecast_explorer::render::{
    band_table, column_summary_table, raw_table, render_to_file, series_table, split_table,
};
use forecast_explorer::transform::EmptyPeriodPolicy;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forecast-explorer", version)]
#[command(about = "Explore, resample and forecast tabular time series", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file with default settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Spreadsheet (.xlsx, .xls, .ods) or delimited text file
    file: PathBuf,

    /// Field delimiter for delimited text
    #[arg(long)]
    delimiter: Option<char>,

    /// Sheet to read (default: the first)
    #[arg(long)]
    sheet: Option<String>,

    /// 0-based row holding the column names
    #[arg(long)]
    header_row: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the columns and last rows of a file
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        /// Number of trailing rows to print
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Write the exploratory chart gallery for one column
    Explore {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        time_column: Option<String>,

        #[arg(long)]
        value_column: Option<String>,

        /// Rename the time column
        #[arg(long)]
        alias_time: Option<String>,

        /// Rename the value column
        #[arg(long)]
        alias_value: Option<String>,

        /// Keep only the last N rows
        #[arg(long)]
        last: Option<usize>,

        /// Aggregation period (default: monthly)
        #[arg(long)]
        period: Option<Period>,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Fit on a training window and forecast the held-out periods
    Forecast {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        time_column: Option<String>,

        /// Column to forecast; repeat for several
        #[arg(long = "value-column")]
        value_columns: Vec<String>,

        /// weekly, monthly, quarterly or yearly
        #[arg(long)]
        period: Option<Period>,

        /// Periods held out for validation (default 36)
        #[arg(long)]
        holdout: Option<usize>,

        /// Samples per forecast period
        #[arg(long, value_parser = parse_samples)]
        samples: Option<usize>,

        #[arg(long, value_parser = parse_quantile)]
        low_quantile: Option<f64>,

        #[arg(long, value_parser = parse_quantile)]
        high_quantile: Option<f64>,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Value of periods without observations: zero or missing
        #[arg(long)]
        empty_periods: Option<EmptyPeriodPolicy>,

        /// Keep only the last N rows
        #[arg(long)]
        last: Option<usize>,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn parse_samples(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a whole number", s))?;
    if !(1..=MAX_SAMPLES).contains(&n) {
        return Err(format!("must be between 1 and {}", MAX_SAMPLES));
    }
    Ok(n)
}

fn parse_quantile(s: &str) -> std::result::Result<f64, String> {
    let q: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.01..=0.99).contains(&q) {
        return Err("must be between 0.01 and 0.99".to_string());
    }
    Ok(q)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply command-line input flags on top of the config file.
fn apply_input(config: &mut ExplorerConfig, input: &InputArgs) {
    if let Some(d) = input.delimiter {
        config.input.delimiter = d;
    }
    if let Some(sheet) = &input.sheet {
        config.input.sheet = Some(sheet.clone());
    }
    if let Some(row) = input.header_row {
        config.input.header_row = row;
    }
}

fn load_table(config: &ExplorerConfig, input: &InputArgs) -> Result<RawTable> {
    io::load(&input.file, &config.load_options())
        .with_context(|| format!("failed to load {}", input.file.display()))
}

fn required(flag: Option<String>, fallback: &Option<String>, name: &str) -> Result<String> {
    match flag.or_else(|| fallback.clone()) {
        Some(value) => Ok(value),
        None => bail!("--{} is required (or set it in the config file)", name),
    }
}

fn inspect(config: &ExplorerConfig, input: &InputArgs, rows: usize) -> Result<()> {
    if SourceFormat::from_path(&input.file) == SourceFormat::Spreadsheet {
        let sheets = spreadsheet::sheet_names(&input.file)
            .with_context(|| format!("failed to open {}", input.file.display()))?;
        println!("sheets: {}\n", sheets.join(", "));
    }
    let table = load_table(config, input)?;
    println!("{} rows\n", table.len());
    println!("{}", column_summary_table(&table.column_summary()));
    println!("\n{}", raw_table(&table.tail(rows)));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn explore(
    config: &ExplorerConfig,
    input: &InputArgs,
    time_column: Option<String>,
    value_column: Option<String>,
    alias_time: Option<String>,
    alias_value: Option<String>,
    last: Option<usize>,
    period: Option<Period>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let time = required(time_column, &config.input.time_column, "time-column")?;
    let value = required(
        value_column,
        &config.input.value_columns.first().cloned(),
        "value-column",
    )?;
    let alias_time = alias_time.unwrap_or_else(|| time.clone());
    let alias_value = alias_value.unwrap_or_else(|| value.clone());

    let table = load_table(config, input)?
        .select(&[
            (time.as_str(), alias_time.as_str()),
            (value.as_str(), alias_value.as_str()),
        ])
        .context("failed to select columns")?;

    let period = period.or(config.forecast.period).unwrap_or(Period::Monthly);
    let mut request = SeriesRequest::new(alias_time, [alias_value], period)
        .with_policy(config.forecast.empty_periods);
    if let Some(n) = last.or(config.input.last) {
        request = request.with_last(n);
    }
    let series = pipeline::prepare_series(&table, &request).context("failed to build series")?;
    println!("{}", series_table(&series, Some(12)));

    let out_dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
    let charts = gallery(&series, 0).context("failed to build charts")?;
    let written = write_gallery(&charts, &out_dir, config.output.size())
        .with_context(|| format!("failed to write charts to {}", out_dir.display()))?;
    println!("\nwrote {} charts to {}", written.len(), out_dir.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn forecast(
    mut config: ExplorerConfig,
    input: &InputArgs,
    time_column: Option<String>,
    value_columns: Vec<String>,
    period: Option<Period>,
    holdout: Option<usize>,
    samples: Option<usize>,
    low_quantile: Option<f64>,
    high_quantile: Option<f64>,
    seed: Option<u64>,
    empty_periods: Option<EmptyPeriodPolicy>,
    last: Option<usize>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let f = &mut config.forecast;
    f.holdout = holdout.or(f.holdout);
    f.samples = samples.unwrap_or(f.samples);
    f.low_quantile = low_quantile.unwrap_or(f.low_quantile);
    f.high_quantile = high_quantile.unwrap_or(f.high_quantile);
    f.seed = seed.or(f.seed);
    f.empty_periods = empty_periods.unwrap_or(f.empty_periods);

    let time = required(time_column, &config.input.time_column, "time-column")?;
    let values = if value_columns.is_empty() {
        config.input.value_columns.clone()
    } else {
        value_columns
    };
    if values.is_empty() {
        bail!("--value-column is required (or set value_columns in the config file)");
    }
    let Some(period) = period.or(config.forecast.period) else {
        bail!("--period is required (or set it in the config file)");
    };

    let params = config.forecast_params();
    let mut request =
        SeriesRequest::new(time, values, period).with_policy(config.forecast.empty_periods);
    if let Some(n) = last.or(config.input.last) {
        request = request.with_last(n);
    }

    let table = load_table(&config, input)?;
    let model = pipeline::holt_winters(config.forecast.seed);
    let run = pipeline::run(&table, &request, &params, &model).context("forecast failed")?;

    println!("{}", split_table(&run.split));
    for (channel, band) in run.bands.iter().enumerate() {
        let actual = run.split.validation.channel(channel)?;
        println!("\n{}", band.label);
        println!("{}", band_table(band, Some(&actual)));
    }

    let out_dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join("forecast.svg");
    render_to_file(&run.chart, &path, config.output.size())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), model = %run.model, "wrote forecast chart");
    println!("\nwrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => ExplorerConfig::default(),
    };

    match cli.command {
        Commands::Inspect { input, rows } => {
            apply_input(&mut config, &input);
            inspect(&config, &input, rows)
        }
        Commands::Explore {
            input,
            time_column,
            value_column,
            alias_time,
            alias_value,
            last,
            period,
            out_dir,
        } => {
            apply_input(&mut config, &input);
            explore(
                &config,
                &input,
                time_column,
                value_column,
                alias_time,
                alias_value,
                last,
                period,
                out_dir,
            )
        }
        Commands::Forecast {
            input,
            time_column,
            value_columns,
            period,
            holdout,
            samples,
            low_quantile,
            high_quantile,
            seed,
            empty_periods,
            last,
            out_dir,
        } => {
            apply_input(&mut config, &input);
            forecast(
                config,
                &input,
                time_column,
                value_columns,
                period,
                holdout,
                samples,
                low_quantile,
                high_quantile,
                seed,
                empty_periods,
                last,
                out_dir,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::try_parse_from([
            "forecast-explorer",
            "-vv",
            "forecast",
            "sales.csv",
            "--time-column",
            "Month",
            "--value-column",
            "Sales",
            "--value-column",
            "Returns",
            "--period",
            "monthly",
            "--samples",
            "500",
            "--empty-periods",
            "missing",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Forecast {
                value_columns,
                period,
                samples,
                empty_periods,
                ..
            } => {
                assert_eq!(value_columns, vec!["Sales", "Returns"]);
                assert_eq!(period, Some(Period::Monthly));
                assert_eq!(samples, Some(500));
                assert_eq!(empty_periods, Some(EmptyPeriodPolicy::Missing));
            }
            _ => panic!("expected forecast"),
        }
    }

    #[test]
    fn out_of_range_controls_are_rejected() {
        for args in [
            ["--samples", "0"],
            ["--samples", "10001"],
            ["--low-quantile", "0.001"],
            ["--high-quantile", "1.5"],
        ] {
            let result = Cli::try_parse_from(
                ["forecast-explorer", "forecast", "sales.csv"]
                    .into_iter()
                    .chain(args),
            );
            assert!(result.is_err(), "{:?} accepted", args);
        }
    }
}
