//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{write_series_csv, JsonReportAdapter};
use crate::adapters::portfolio_file_adapter::{read_portfolio, write_portfolio};
use crate::domain::analysis::{run_analysis, MarketData, MetricsResult};
use crate::domain::config_validation::{
    analysis_settings, analysis_window, data_source, portfolio_path, validate_analysis_config,
    DataSource,
};
use crate::domain::error::FolioError;
use crate::domain::portfolio::DEFAULT_WEIGHT_TOLERANCE;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::time_series_port::TimeSeriesPort;

#[derive(Parser, Debug)]
#[command(name = "folioscope", about = "Portfolio risk and return analytics")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct ConfigArg {
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an analysis and print the summary
    Analyze {
        #[command(flatten)]
        config: ConfigArg,
        /// Portfolio file, overriding [analysis] portfolio
        #[arg(short, long)]
        portfolio: Option<PathBuf>,
        /// JSON report path, overriding [report] output
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Series CSV path, overriding [report] series_output
        #[arg(long)]
        series_output: Option<PathBuf>,
    },
    /// Validate a configuration and its portfolio without loading data
    Validate {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// Rescale portfolio weights to sum to one
    Normalize {
        #[arg(short, long)]
        input: PathBuf,
        /// Defaults to rewriting the input file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a Ticker,Weight CSV into a portfolio file
    Import {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Export a portfolio to a Ticker,Weight CSV
    Export {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List tickers available in the configured store
    ListTickers {
        #[command(flatten)]
        config: ConfigArg,
    },
    /// Show data range for one or all tickers
    Info {
        #[command(flatten)]
        config: ConfigArg,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Copy the CSV store into the SQLite database
    Ingest {
        #[command(flatten)]
        config: ConfigArg,
    },
}

/// Installs the stderr `tracing` subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze {
            config,
            portfolio,
            output,
            series_output,
        } => run_analyze(
            &config.config,
            portfolio.as_deref(),
            output.as_deref(),
            series_output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config.config),
        Command::Normalize { input, output } => {
            run_normalize(&input, output.as_deref().unwrap_or(&input))
        }
        Command::Import { input, output } | Command::Export { input, output } => {
            run_convert(&input, &output)
        }
        Command::ListTickers { config } => run_list_tickers(&config.config),
        Command::Info { config, ticker } => run_info(&config.config, ticker.as_deref()),
        Command::Ingest { config } => run_ingest(&config.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FolioError> {
    debug!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Opens the store named by `[data] source`.
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn TimeSeriesPort>, FolioError> {
    match data_source(config)? {
        DataSource::Csv => Ok(Box::new(csv_store(config)?)),
        DataSource::Sqlite => sqlite_store(config),
    }
}

fn csv_store(config: &dyn ConfigPort) -> Result<CsvAdapter, FolioError> {
    let dir = config
        .get_string("data", "dir")
        .ok_or_else(|| FolioError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    let risk_free = config
        .get_string("data", "risk_free_path")
        .ok_or_else(|| FolioError::ConfigMissing {
            section: "data".into(),
            key: "risk_free_path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(dir), PathBuf::from(risk_free)))
}

#[cfg(feature = "sqlite")]
fn sqlite_store(config: &dyn ConfigPort) -> Result<Box<dyn TimeSeriesPort>, FolioError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_store(_config: &dyn ConfigPort) -> Result<Box<dyn TimeSeriesPort>, FolioError> {
    Err(FolioError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    })
}

fn run_analyze(
    config_path: &Path,
    portfolio_override: Option<&Path>,
    output_override: Option<&Path>,
    series_override: Option<&Path>,
) -> Result<(), FolioError> {
    let config = load_config(config_path)?;
    validate_analysis_config(&config)?;
    let window = analysis_window(&config)?;
    let settings = analysis_settings(&config)?;

    let portfolio_file = match portfolio_override {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(portfolio_path(&config)?),
    };
    let portfolio = read_portfolio(&portfolio_file)?.portfolio;

    let store = open_store(&config)?;
    let data = MarketData::fetch(store.as_ref(), &portfolio, &window)?;
    let result = run_analysis(&data.input(&portfolio, &window), &settings)?;

    print_summary(&result, config.get_bool("report", "holdings", true));

    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));
    if let Some(output) = output {
        JsonReportAdapter::new().write(&result, &output.to_string_lossy())?;
        println!("\nReport written to: {}", output.display());
    }

    let series = series_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "series_output").map(PathBuf::from));
    if let Some(series) = series {
        write_series_csv(&result, &series)?;
        println!("Series written to: {}", series.display());
    }
    Ok(())
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn fmt_opt(value: Option<f64>, pct: bool) -> String {
    match value {
        Some(v) if pct => fmt_pct(v),
        Some(v) => format!("{:.3}", v),
        None => "n/a".to_string(),
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Prints the run to stdout. The per-holding table is optional.
pub fn print_summary(result: &MetricsResult, show_holdings: bool) {
    let m = &result.metrics;
    let dist = &m.distribution;

    println!("=== {} vs {} ===", result.portfolio_name, result.benchmark);
    println!(
        "Period:              {} to {} ({} returns)",
        result.start_date, result.end_date, m.observations
    );
    println!("Risk-Free Rate:      {}", fmt_pct(result.risk_free_rate));
    println!("Total Return:        {}", fmt_pct(m.total_return));
    println!("Annualized Return:   {}", fmt_pct(m.annualized_return));
    println!("Annualized Vol:      {}", fmt_pct(m.annualized_volatility));
    println!("Sharpe Ratio:        {}", fmt_opt(m.sharpe_ratio, false));
    println!("Beta:                {}", fmt_opt(m.beta, false));
    println!("Alpha:               {}", fmt_opt(m.alpha, true));
    println!("Treynor Ratio:       {}", fmt_opt(m.treynor_ratio, false));
    println!(
        "Max Drawdown:        -{} (peak {}, trough {})",
        fmt_pct(result.max_drawdown),
        fmt_date(result.max_drawdown_peak_date),
        fmt_date(result.max_drawdown_date)
    );
    println!("Current Drawdown:    -{}", fmt_pct(result.current_drawdown));
    println!(
        "Benchmark:           {} return, {} vol, corr {}",
        fmt_pct(m.benchmark_annualized_return),
        fmt_pct(m.benchmark_volatility),
        fmt_opt(m.benchmark_correlation, false)
    );

    println!("\n=== Daily Distribution ===");
    println!("Mean / Std:          {} / {}", fmt_pct(dist.mean), fmt_pct(dist.std_dev));
    println!("Skewness:            {}", fmt_opt(dist.skewness, false));
    println!("Excess Kurtosis:     {}", fmt_opt(dist.excess_kurtosis, false));
    println!("Best / Worst Day:    {} / {}", fmt_pct(dist.max), fmt_pct(dist.min));
    println!("Up Days:             {:.1}%", dist.up_days_pct * 100.0);
    for p in &dist.percentiles {
        println!("P{:<3}                {}", p.percentile, fmt_pct(p.value));
    }

    if show_holdings && !result.holdings.is_empty() {
        println!("\n=== Holdings ===");
        println!(
            "{:<8} {:>8} {:>10} {:>10} {:>8}",
            "Ticker", "Weight", "Ann. Ret", "Ann. Vol", "Beta"
        );
        for h in &result.holdings {
            println!(
                "{:<8} {:>8} {:>10} {:>10} {:>8}",
                h.ticker,
                fmt_pct(h.weight),
                fmt_pct(h.annualized_return),
                fmt_opt(h.annualized_volatility, true),
                fmt_opt(h.beta, false)
            );
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), FolioError> {
    let config = load_config(config_path)?;
    validate_analysis_config(&config)?;
    let settings = analysis_settings(&config)?;
    let window = analysis_window(&config)?;
    println!(
        "Config valid: {} to {}, benchmark {}",
        window.start, window.end, window.benchmark
    );

    let path = PathBuf::from(portfolio_path(&config)?);
    let import = read_portfolio(&path)?;
    for row in &import.skipped {
        println!("  skipped line {}: {}", row.line, row.reason);
    }
    import.portfolio.validate(settings.weight_tolerance)?;
    println!(
        "Portfolio valid: {} ({} holdings)",
        import.portfolio.name,
        import.portfolio.len()
    );
    Ok(())
}

fn run_normalize(input: &Path, output: &Path) -> Result<(), FolioError> {
    let portfolio = read_portfolio(input)?.portfolio;
    let before = portfolio.total_weight();
    let normalized = portfolio.normalized()?;
    write_portfolio(&normalized, output)?;

    println!("Normalized {} (total weight was {:.6})", normalized.name, before);
    for pos in normalized.positions() {
        println!("  {:<8} {:.6}", pos.ticker, pos.weight);
    }
    Ok(())
}

fn run_convert(input: &Path, output: &Path) -> Result<(), FolioError> {
    let import = read_portfolio(input)?;
    for row in &import.skipped {
        println!("skipped line {}: {}", row.line, row.reason);
    }
    if let Err(reason) = import.portfolio.validate(DEFAULT_WEIGHT_TOLERANCE) {
        warn!(%reason, "imported portfolio needs normalize before analyzing");
    }
    write_portfolio(&import.portfolio, output)?;
    println!(
        "Wrote {} holdings to {}",
        import.portfolio.len(),
        output.display()
    );
    Ok(())
}

fn run_list_tickers(config_path: &Path) -> Result<(), FolioError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let tickers = store.list_tickers()?;
    if tickers.is_empty() {
        eprintln!("No tickers found");
    }
    for ticker in &tickers {
        println!("{}", ticker);
    }
    info!(count = tickers.len(), "listed tickers");
    Ok(())
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> Result<(), FolioError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let tickers = match ticker {
        Some(t) => vec![t.trim().to_uppercase()],
        None => store.list_tickers()?,
    };

    println!("{:<10} {:<12} {:<12} {:>8}", "Ticker", "First", "Last", "Rows");
    for ticker in &tickers {
        match store.get_data_range(ticker)? {
            Some((first, last, count)) => {
                println!("{:<10} {:<12} {:<12} {:>8}", ticker, first, last, count)
            }
            None => println!("{:<10} no data", ticker),
        }
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_ingest(config_path: &Path) -> Result<(), FolioError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = load_config(config_path)?;
    let source = csv_store(&config)?;
    let target = SqliteAdapter::from_config(&config)?;
    target.initialize_schema()?;

    let mut rows = 0;
    for ticker in source.list_tickers()? {
        let Some((first, last, _)) = source.get_data_range(&ticker)? else {
            warn!(ticker = %ticker, "empty price file");
            continue;
        };
        let series = source.fetch_prices(&ticker, first, last)?;
        rows += target.insert_prices(&ticker, &series)?;
        debug!(ticker = %ticker, rows = series.len(), "ingested prices");
    }
    let rates = source.fetch_risk_free(NaiveDate::MIN, NaiveDate::MAX)?;
    let rate_rows = target.insert_rates(&rates)?;

    println!("Ingested {} price rows and {} rate rows", rows, rate_rows);
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_ingest(_config_path: &Path) -> Result<(), FolioError> {
    Err(FolioError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    })
}
