//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_render_adapter::JsonRenderAdapter;
use crate::adapters::svg_render_adapter::SvgRenderAdapter;
use crate::domain::analysis::{run_analysis, Analysis, AnalysisConfig, ChartPreset};
use crate::domain::config_validation::{
    parse_date, parse_period_list, read_positive, validate_analysis_config,
};
use crate::domain::crossover::{detect_crossovers, CrossoverConfig, CrossoverEvent};
use crate::domain::error::ChartError;
use crate::domain::indicator::bollinger::{DEFAULT_MULTIPLIER, DEFAULT_PERIOD};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{simple_moving_average, BollingerParams, StdDevKind};
use crate::domain::layout::DEFAULT_TICK_STEP;
use crate::domain::ohlcv::OhlcvSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::render_port::{OutputFormat, RenderPort};

#[derive(Parser, Debug)]
#[command(
    name = "crosschart",
    about = "Moving-average crossover charts from daily OHLCV data"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators and write a chart document
    Chart {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<ChartPreset>,
        /// Number of most recent rows to display
        #[arg(short, long)]
        window: Option<usize>,
        #[arg(short, long)]
        format: Option<OutputFormat>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print golden and dead crosses for a symbol
    Signals {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Emit the events as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// List symbols with data files for an exchange
    ListSymbols {
        #[arg(long)]
        exchange: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a chart configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Chart {
            config,
            code,
            exchange,
            data_dir,
            preset,
            window,
            format,
            output,
        } => run_chart(
            config.as_deref(),
            &DataOverrides {
                code,
                exchange,
                data_dir,
            },
            &ChartOverrides {
                preset,
                window,
                format,
                output,
            },
        ),
        Command::Signals {
            config,
            code,
            exchange,
            data_dir,
            json,
        } => run_signals(
            config.as_deref(),
            &DataOverrides {
                code,
                exchange,
                data_dir,
            },
            json,
        ),
        Command::ListSymbols {
            exchange,
            config,
            data_dir,
        } => run_list_symbols(
            config.as_deref(),
            &DataOverrides {
                code: None,
                exchange,
                data_dir,
            },
        ),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Values given on the command line that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct DataOverrides {
    pub code: Option<String>,
    pub exchange: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ChartOverrides {
    pub preset: Option<ChartPreset>,
    pub window: Option<usize>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
}

/// Which file to read and which rows of it to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSelection {
    pub dir: PathBuf,
    pub code: String,
    pub exchange: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ChartError> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// A missing config path behaves like an empty file.
fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, ChartError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string(""),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn resolve_exchange(
    config: &dyn ConfigPort,
    overrides: &DataOverrides,
) -> Result<String, ChartError> {
    non_empty(overrides.exchange.clone())
        .or_else(|| non_empty(config.get_string("data", "exchange")))
        .map(|e| e.to_uppercase())
        .ok_or_else(|| ChartError::ConfigMissing {
            section: "data".into(),
            key: "exchange".into(),
        })
}

pub fn resolve_data_dir(config: &dyn ConfigPort, overrides: &DataOverrides) -> PathBuf {
    overrides
        .data_dir
        .clone()
        .or_else(|| non_empty(config.get_string("data", "dir")).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn resolve_data_selection(
    config: &dyn ConfigPort,
    overrides: &DataOverrides,
) -> Result<DataSelection, ChartError> {
    let code = non_empty(overrides.code.clone())
        .or_else(|| non_empty(config.get_string("data", "code")))
        .ok_or_else(|| ChartError::ConfigMissing {
            section: "data".into(),
            key: "code".into(),
        })?;

    let start_date = config
        .get_string("data", "start_date")
        .map(|s| parse_date(&s, "data", "start_date"))
        .transpose()?;
    let end_date = config
        .get_string("data", "end_date")
        .map(|s| parse_date(&s, "data", "end_date"))
        .transpose()?;

    Ok(DataSelection {
        dir: resolve_data_dir(config, overrides),
        code: code.to_uppercase(),
        exchange: resolve_exchange(config, overrides)?,
        start_date,
        end_date,
    })
}

fn period_list(
    config: &dyn ConfigPort,
    key: &str,
    default: &[usize],
) -> Result<Vec<usize>, ChartError> {
    match config.get_string("indicators", key) {
        Some(value) => parse_period_list(&value).map_err(|reason| ChartError::ConfigInvalid {
            section: "indicators".into(),
            key: key.into(),
            reason,
        }),
        None => Ok(default.to_vec()),
    }
}

fn parsed<T: std::str::FromStr<Err = String>>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, ChartError> {
    config
        .get_string(section, key)
        .map(|s| {
            s.parse::<T>().map_err(|reason| ChartError::ConfigInvalid {
                section: section.into(),
                key: key.into(),
                reason,
            })
        })
        .transpose()
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, ChartError> {
    let defaults = AnalysisConfig::default();

    let bollinger = BollingerParams {
        period: read_positive(config, "indicators", "bollinger_period")?.unwrap_or(DEFAULT_PERIOD),
        multiplier: config.get_double("indicators", "bollinger_multiplier", DEFAULT_MULTIPLIER),
        kind: parsed::<StdDevKind>(config, "indicators", "bollinger_stddev")?.unwrap_or_default(),
    };
    let crossover = CrossoverConfig {
        short_period: read_positive(config, "crossover", "short_period")?
            .unwrap_or(defaults.crossover.short_period),
        long_period: read_positive(config, "crossover", "long_period")?
            .unwrap_or(defaults.crossover.long_period),
    };
    let show_volume = config
        .get_string("chart", "volume")
        .map(|_| config.get_bool("chart", "volume", true));

    let analysis = AnalysisConfig {
        title: config.get_string("chart", "title").unwrap_or_default(),
        preset: parsed::<ChartPreset>(config, "chart", "preset")?.unwrap_or_default(),
        crossover,
        sma_periods: period_list(config, "sma_periods", &defaults.sma_periods)?,
        rsi_periods: period_list(config, "rsi_periods", &defaults.rsi_periods)?,
        macd_fast: read_positive(config, "indicators", "macd_fast")?.unwrap_or(DEFAULT_FAST),
        macd_slow: read_positive(config, "indicators", "macd_slow")?.unwrap_or(DEFAULT_SLOW),
        macd_signal: read_positive(config, "indicators", "macd_signal")?.unwrap_or(DEFAULT_SIGNAL),
        bollinger,
        display_window: read_positive(config, "chart", "window")?,
        tick_step: read_positive(config, "chart", "tick_step")?.unwrap_or(DEFAULT_TICK_STEP),
        show_volume,
    };
    analysis.validate()?;
    Ok(analysis)
}

/// Fetch bars and wrap them in a series, failing when nothing came back.
pub fn load_series(
    data_port: &dyn DataPort,
    selection: &DataSelection,
) -> Result<OhlcvSeries, ChartError> {
    let bars = data_port.fetch_ohlcv(
        &selection.code,
        &selection.exchange,
        selection.start_date,
        selection.end_date,
    )?;
    if bars.is_empty() {
        return Err(ChartError::NoData {
            code: selection.code.clone(),
            exchange: selection.exchange.clone(),
        });
    }
    let series = OhlcvSeries::new(selection.code.clone(), bars)?;
    info!(
        "Loaded {} bars for {}.{} ({} to {})",
        series.len(),
        selection.code,
        selection.exchange,
        series.first_date().map(|d| d.to_string()).unwrap_or_default(),
        series.last_date().map(|d| d.to_string()).unwrap_or_default(),
    );
    Ok(series)
}

pub fn render_port_for(format: OutputFormat) -> Box<dyn RenderPort> {
    match format {
        OutputFormat::Json => Box::new(JsonRenderAdapter::new()),
        OutputFormat::Svg => Box::new(SvgRenderAdapter::new()),
    }
}

pub fn default_output_path(selection: &DataSelection, preset: ChartPreset, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!(
        "{}_{}_{}.{}",
        selection.code,
        selection.exchange,
        preset,
        format.extension()
    ))
}

/// Load, analyse, render and write one chart.
pub fn run_chart_pipeline(
    data_port: &dyn DataPort,
    render_port: &dyn RenderPort,
    selection: &DataSelection,
    analysis_config: &AnalysisConfig,
    output: &Path,
) -> Result<Analysis, ChartError> {
    let series = load_series(data_port, selection)?;
    let analysis = run_analysis(&series, analysis_config)?;

    if analysis.events.is_empty() {
        warn!(
            "No crossovers between MA{} and MA{}",
            analysis_config.crossover.short_period, analysis_config.crossover.long_period
        );
    } else {
        info!("{} crossover events", analysis.events.len());
    }

    render_port.write(&analysis.layout, output)?;
    info!(
        "Chart written to: {} ({} rows, {} panels)",
        output.display(),
        analysis.layout.row_count(),
        analysis.layout.panels.len()
    );
    Ok(analysis)
}

fn run_chart(
    config_path: Option<&Path>,
    data: &DataOverrides,
    chart: &ChartOverrides,
) -> Result<(), ChartError> {
    let config = load_optional_config(config_path)?;
    validate_analysis_config(&config)?;

    let selection = resolve_data_selection(&config, data)?;
    let mut analysis_config = build_analysis_config(&config)?;
    if let Some(preset) = chart.preset {
        analysis_config.preset = preset;
    }
    if chart.window.is_some() {
        analysis_config.display_window = chart.window;
    }
    analysis_config.validate()?;

    let format = match chart.format {
        Some(f) => f,
        None => parsed::<OutputFormat>(&config, "chart", "format")?.unwrap_or_default(),
    };
    let output = chart
        .output
        .clone()
        .or_else(|| non_empty(config.get_string("chart", "output")).map(PathBuf::from))
        .unwrap_or_else(|| default_output_path(&selection, analysis_config.preset, format));

    let data_port = CsvAdapter::new(selection.dir.clone());
    let render_port = render_port_for(format);
    run_chart_pipeline(&data_port, render_port.as_ref(), &selection, &analysis_config, &output)?;
    Ok(())
}

/// Crossovers over the whole loaded history.
pub fn collect_signals(
    data_port: &dyn DataPort,
    selection: &DataSelection,
    crossover: &CrossoverConfig,
) -> Result<Vec<CrossoverEvent>, ChartError> {
    crossover.validate()?;
    let series = load_series(data_port, selection)?;
    let closes = series.closes();
    let short = simple_moving_average(&closes, crossover.short_period)?;
    let long = simple_moving_average(&closes, crossover.long_period)?;
    detect_crossovers(&series.dates(), &short.values, &long.values)
}

pub fn format_signal(event: &CrossoverEvent) -> String {
    format!("{}\t{}\t{:.2}", event.date, event.kind, event.price)
}

fn run_signals(config_path: Option<&Path>, data: &DataOverrides, json: bool) -> Result<(), ChartError> {
    let config = load_optional_config(config_path)?;
    validate_analysis_config(&config)?;

    let selection = resolve_data_selection(&config, data)?;
    let crossover = build_analysis_config(&config)?.crossover;
    let data_port = CsvAdapter::new(selection.dir.clone());
    let events = collect_signals(&data_port, &selection, &crossover)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        for event in &events {
            println!("{}", format_signal(event));
        }
    }
    info!(
        "{} crossover events for {}.{}",
        events.len(),
        selection.code,
        selection.exchange
    );
    Ok(())
}

fn run_list_symbols(config_path: Option<&Path>, data: &DataOverrides) -> Result<(), ChartError> {
    let config = load_optional_config(config_path)?;
    let exchange = resolve_exchange(&config, data)?;
    let data_port = CsvAdapter::new(resolve_data_dir(&config, data));

    let symbols = data_port.list_symbols(&exchange)?;
    if symbols.is_empty() {
        warn!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        info!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ChartError> {
    let config = load_config(config_path)?;
    validate_analysis_config(&config)?;
    let analysis = build_analysis_config(&config)?;

    info!("Preset: {}", analysis.preset);
    info!(
        "Crossover: MA{} / MA{}",
        analysis.crossover.short_period, analysis.crossover.long_period
    );
    let requested: Vec<String> = analysis
        .indicator_requests()
        .iter()
        .map(|r| r.to_string())
        .collect();
    info!("Indicators to compute: {}", requested.join(", "));
    match analysis.window() {
        Some(n) => info!("Display window: last {} rows", n),
        None => info!("Display window: all rows"),
    }
    info!("Chart configuration is valid.");
    Ok(())
}
