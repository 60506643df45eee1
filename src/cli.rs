//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_dashboard::HtmlDashboardAdapter;
use crate::domain::config_validation::{
    PROVIDER_KINDS, parse_date, validate_dashboard_config, validate_provider_config,
};
use crate::domain::dashboard::{DashboardOutcome, build_dashboard};
use crate::domain::error::IndexboardError;
use crate::domain::fetch_cache::{DEFAULT_CACHE_CAPACITY, FetchCache};
use crate::domain::fetcher::Fetcher;
use crate::domain::registry::{DEFAULT_SELECTION, IndexRegistry};
use crate::domain::selection::{Selection, parse_index_list};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_START_DATE: &str = "2022-01-01";
pub const DEFAULT_OUTPUT: &str = "dashboard.html";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "info";

pub type BoxedFetcher = Fetcher<Box<dyn MarketDataPort + Send>>;

#[derive(Parser, Debug)]
#[command(name = "indexboard", about = "Global market index dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dashboard and write it as HTML
    Render {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// First date, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Last date (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// Index display name; repeat for several
        #[arg(short, long = "index")]
        indices: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Read `<SYMBOL>.csv` files from this directory instead of the network
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List the index catalog
    List,
    /// Validate a dashboard configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct RenderOverrides {
    pub start: Option<String>,
    pub end: Option<String>,
    pub indices: Vec<String>,
    pub data_dir: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Render {
            config,
            start,
            end,
            indices,
            output,
            data_dir,
        } => run_render(
            config.as_ref(),
            RenderOverrides {
                start,
                end,
                indices,
                data_dir,
            },
            output,
        ),
        Command::List => run_list(),
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = IndexboardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Logging knobs read from the `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub filter: String,
    pub ansi: bool,
}

pub fn logging_settings(config: &dyn ConfigPort) -> LoggingSettings {
    LoggingSettings {
        filter: config
            .get_string("logging", "filter")
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        ansi: config.get_bool("logging", "ansi", true),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `[logging] filter`.
pub fn init_logging(config: &dyn ConfigPort) {
    let settings = logging_settings(config);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // a subscriber may already be installed (tests, repeated runs)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(settings.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolves the selection from overrides, then config, then defaults.
///
/// Names outside the catalog are kept; the pipeline skips each one with a
/// warning line.
pub fn build_selection(
    config: &dyn ConfigPort,
    registry: &IndexRegistry,
    overrides: &RenderOverrides,
    today: NaiveDate,
) -> Result<Selection, IndexboardError> {
    let start = match &overrides.start {
        Some(s) => parse_date(s, "cli", "start")?,
        None => match config.get_string("dashboard", "start_date") {
            Some(s) => parse_date(&s, "dashboard", "start_date")?,
            None => parse_date(DEFAULT_START_DATE, "dashboard", "start_date")?,
        },
    };
    let end = match &overrides.end {
        Some(s) => parse_date(s, "cli", "end")?,
        None => match config.get_string("dashboard", "end_date") {
            Some(s) => parse_date(&s, "dashboard", "end_date")?,
            None => today,
        },
    };

    let names = if !overrides.indices.is_empty() {
        overrides.indices.clone()
    } else if let Some(list) = config.get_string("dashboard", "indices") {
        parse_index_list(&list).map_err(|e| IndexboardError::ConfigInvalid {
            section: "dashboard".to_string(),
            key: "indices".to_string(),
            reason: e.to_string(),
        })?
    } else {
        DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect()
    };

    for name in names.iter().filter(|n| !registry.contains(n)) {
        warn!(index = %name, "not in the index catalog, it will be skipped");
    }

    Selection::new(names, start, end)
}

/// Picks the provider (`--data-dir` forces the CSV one) and wraps it in a
/// cached fetcher.
pub fn build_fetcher(
    config: &dyn ConfigPort,
    data_dir: Option<&PathBuf>,
) -> Result<BoxedFetcher, IndexboardError> {
    let capacity = config.get_int("cache", "capacity", DEFAULT_CACHE_CAPACITY as i64);
    let cache = FetchCache::new(usize::try_from(capacity).unwrap_or(DEFAULT_CACHE_CAPACITY));

    let port: Box<dyn MarketDataPort + Send> = match data_dir {
        Some(dir) => Box::new(CsvAdapter::new(dir.clone())),
        None => {
            let kind = config
                .get_string("provider", "kind")
                .unwrap_or_else(|| "yahoo".to_string())
                .trim()
                .to_lowercase();
            match kind.as_str() {
                "csv" => {
                    let dir = config.get_string("provider", "data_dir").ok_or_else(|| {
                        IndexboardError::ConfigMissing {
                            section: "provider".to_string(),
                            key: "data_dir".to_string(),
                        }
                    })?;
                    Box::new(CsvAdapter::new(PathBuf::from(dir.trim())))
                }
                "yahoo" => yahoo_port(config)?,
                _ => {
                    return Err(IndexboardError::ConfigInvalid {
                        section: "provider".to_string(),
                        key: "kind".to_string(),
                        reason: format!("kind must be one of: {}", PROVIDER_KINDS.join(", ")),
                    });
                }
            }
        }
    };

    Ok(Fetcher::new(port, cache))
}

#[cfg(feature = "yahoo")]
fn yahoo_port(config: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort + Send>, IndexboardError> {
    use crate::adapters::yahoo_adapter::{
        DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, YahooAdapter,
    };
    use std::time::Duration;

    let base_url = config
        .get_string("provider", "base_url")
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = config.get_int("provider", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64);
    let timeout = u64::try_from(timeout).unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = config
        .get_string("provider", "user_agent")
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Ok(Box::new(YahooAdapter::new(
        &base_url,
        Duration::from_secs(timeout),
        &user_agent,
    )?))
}

#[cfg(not(feature = "yahoo"))]
fn yahoo_port(_config: &dyn ConfigPort) -> Result<Box<dyn MarketDataPort + Send>, IndexboardError> {
    Err(IndexboardError::ConfigInvalid {
        section: "provider".to_string(),
        key: "kind".to_string(),
        reason: "the yahoo provider needs the `yahoo` feature".to_string(),
    })
}

fn run_render(
    config_path: Option<&PathBuf>,
    overrides: RenderOverrides,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(c) => c,
                Err(code) => return code,
            }
        }
        None => FileConfigAdapter::empty(),
    };
    init_logging(&config);

    let registry = IndexRegistry::new();
    if let Err(e) = validate_dashboard_config(&config, &registry) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if overrides.data_dir.is_none() {
        if let Err(e) = validate_provider_config(&config) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    let selection = match build_selection(&config, &registry, &overrides, Local::now().date_naive())
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let mut fetcher = match build_fetcher(&config, overrides.data_dir.as_ref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let output = output
        .or_else(|| config.get_string("dashboard", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    run_render_pipeline(
        &registry,
        &mut fetcher,
        &selection,
        &HtmlDashboardAdapter::new(),
        &output,
    )
}

/// Runs the dashboard pipeline once, prints the summary and writes the page.
///
/// The page is written even when nothing could be shown; the exit code then
/// reports [`IndexboardError::NoValidData`].
pub fn run_render_pipeline<P: MarketDataPort>(
    registry: &IndexRegistry,
    fetcher: &mut Fetcher<P>,
    selection: &Selection,
    report: &dyn ReportPort,
    output: &PathBuf,
) -> ExitCode {
    eprintln!(
        "Building dashboard: {} indices, {} to {}",
        selection.display_names.len(),
        selection.start_date,
        selection.end_date
    );

    let outcome = build_dashboard(registry, fetcher, selection);
    for line in summary_lines(&outcome) {
        eprintln!("{line}");
    }

    let output_str = output.to_string_lossy();
    if let Err(e) = report.write(&outcome, &output_str) {
        eprintln!("error: failed to write dashboard: {e}");
        return (&e).into();
    }
    eprintln!("\nDashboard written to: {}", output.display());

    let stats = fetcher.cache_stats();
    info!(hits = stats.hits, misses = stats.misses, "fetch cache");

    match outcome.into_result() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => (&e).into(),
    }
}

/// Console rendering of a dashboard: warnings, then either the table shape and
/// the strongest/weakest lines, or the terminal error.
pub fn summary_lines(outcome: &DashboardOutcome) -> Vec<String> {
    let mut lines: Vec<String> = outcome
        .warnings()
        .iter()
        .map(|w| format!("warning: {w}"))
        .collect();

    match outcome.view() {
        Some(view) => {
            let dates = view.prices.dates();
            if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
                lines.push(format!(
                    "Loaded {} indices over {} dates ({} to {})",
                    view.prices.column_count(),
                    dates.len(),
                    first,
                    last
                ));
            }
            match (view.strongest_line(), view.weakest_line()) {
                (Some(strongest), Some(weakest)) => {
                    lines.push(strongest);
                    lines.push(weakest);
                }
                _ => lines.push("Not enough indices to compare correlations.".to_string()),
            }
        }
        None => lines.push(IndexboardError::NoValidData.to_string()),
    }
    lines
}

fn run_list() -> ExitCode {
    for entry in IndexRegistry::new().entries() {
        println!("{}\t{}", entry.symbol, entry.display_name);
    }
    ExitCode::SUCCESS
}

pub fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let registry = IndexRegistry::new();
    if let Err(e) = validate_dashboard_config(&config, &registry) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_provider_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match build_selection(
        &config,
        &registry,
        &RenderOverrides::default(),
        Local::now().date_naive(),
    ) {
        Ok(selection) => {
            eprintln!("Config validated successfully");
            eprintln!(
                "  indices: {}",
                if selection.is_empty() {
                    "(none)".to_string()
                } else {
                    selection.display_names.join(", ")
                }
            );
            eprintln!("  range:   {} to {}", selection.start_date, selection.end_date);
            for name in selection
                .display_names
                .iter()
                .filter(|n| !registry.contains(n))
            {
                eprintln!("  warning: {name} is not in the index catalog and will be skipped");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        init_logging(&config);

        let registry = IndexRegistry::new();
        for result in [
            validate_dashboard_config(&config, &registry),
            validate_provider_config(&config),
        ] {
            if let Err(e) = result {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }

        let fetcher = match build_fetcher(&config, None) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let defaults = match serve_defaults(&config, &registry) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let addr: SocketAddr = match listen.trim().parse() {
            Ok(a) => a,
            Err(_) => {
                let err = IndexboardError::ConfigInvalid {
                    section: "web".to_string(),
                    key: "listen".to_string(),
                    reason: format!("not a socket address: {listen}"),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        };

        let router = build_router(AppState::new(registry, fetcher, defaults));

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };

        eprintln!("Starting web server on {}", addr);
        let served: std::io::Result<()> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: server failed: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

#[cfg(feature = "web")]
fn serve_defaults(
    config: &dyn ConfigPort,
    registry: &IndexRegistry,
) -> Result<crate::adapters::web::SelectionDefaults, IndexboardError> {
    let end_date = config
        .get_string("dashboard", "end_date")
        .map(|s| parse_date(&s, "dashboard", "end_date"))
        .transpose()?;
    // any end date works here; only start and indices are kept
    let selection = build_selection(
        config,
        registry,
        &RenderOverrides::default(),
        NaiveDate::MAX,
    )?;
    Ok(crate::adapters::web::SelectionDefaults {
        start_date: selection.start_date,
        end_date,
        indices: selection.display_names,
    })
}
