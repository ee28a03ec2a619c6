//! Analyze CLI command.
//!
//! Loads a close-price CSV, runs the RSI / Bollinger / divergence pipeline and
//! writes the aligned report to a file or stdout.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use divergence_core::config_loader::DEFAULT_CONFIG_PATH;
use divergence_core::{AppConfig, ConfigLoader, ReportConfig, ReportFormat};
use divergence_data::{parse_timestamp, CsvPriceSource, ReportWriter};
use divergence_signals::{analyze, AnalysisReport, RsiZone};
use std::io::{self, Write};
use std::path::PathBuf;

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Price CSV file with a timestamp column and a close column
    #[arg(short, long)]
    pub data: PathBuf,

    /// Instrument label shown in the summary and JSON report (e.g., "SPY")
    #[arg(long)]
    pub symbol: Option<String>,

    /// Keep observations at or after this time (RFC 3339, "YYYY-MM-DD", or Unix seconds)
    #[arg(long)]
    pub start: Option<String>,

    /// Keep observations strictly before this time
    #[arg(long)]
    pub end: Option<String>,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Config profile overlay (e.g., "dev" also loads Config.dev.toml)
    #[arg(long)]
    pub profile: Option<String>,

    /// Report file path. The report goes to stdout if not provided.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format: csv or json (overrides config)
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// RSI window (overrides config)
    #[arg(long)]
    pub rsi_window: Option<usize>,

    /// Bollinger band window (overrides config)
    #[arg(long)]
    pub band_window: Option<usize>,

    /// Bollinger band standard deviation multiplier (overrides config)
    #[arg(long)]
    pub band_std_dev: Option<f64>,

    /// Divergence lookback window (overrides config)
    #[arg(long)]
    pub lookback: Option<usize>,

    /// First index scanned for divergences (overrides config)
    #[arg(long)]
    pub start_offset: Option<usize>,

    /// Skip the console summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl AnalyzeArgs {
    /// Applies command-line overrides on top of the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the resulting pipeline parameters are invalid.
    pub fn apply_overrides(&self, config: &mut AppConfig) -> Result<()> {
        let analysis = &mut config.analysis;
        if let Some(window) = self.rsi_window {
            analysis.oscillator_window = window;
        }
        if let Some(window) = self.band_window {
            analysis.band_window = window;
        }
        if let Some(multiplier) = self.band_std_dev {
            analysis.band_std_dev_multiplier = multiplier;
        }
        if let Some(lookback) = self.lookback {
            analysis.divergence_lookback = lookback;
        }
        if let Some(offset) = self.start_offset {
            analysis.divergence_start_offset = offset;
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }

        config
            .analysis
            .validate()
            .context("Invalid parameters after command-line overrides")?;
        Ok(())
    }

    /// Parses the optional `--start`/`--end` bounds.
    ///
    /// # Errors
    /// Returns an error if a bound cannot be parsed or start is not before end.
    pub fn time_range(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let start = self
            .start
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("Invalid --start")?;
        let end = self
            .end
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("Invalid --end")?;

        if let (Some(s), Some(e)) = (start, end) {
            if s >= e {
                bail!("--start ({s}) must be before --end ({e})");
            }
        }
        Ok((start, end))
    }
}

/// Runs the analyze command.
///
/// # Errors
/// Returns an error if configuration, loading, a fatal analysis stage, or
/// report output fails. No report is written on a fatal error.
pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = ConfigLoader::load_from(&args.config, args.profile.as_deref())?;
    args.apply_overrides(&mut config)?;
    let (start, end) = args.time_range()?;

    let candidate = CsvPriceSource::from_path(&args.data)?.within(start, end);
    if start.is_some() || end.is_some() {
        tracing::info!("{} rows inside the requested range", candidate.len());
    }

    let report = analyze(candidate, &config.analysis)
        .with_context(|| format!("Analysis of {} failed", args.data.display()))?;

    let symbol = args.symbol.as_deref();
    match &args.output {
        Some(path) => {
            ReportWriter::write_to_path(&report, path, symbol, &config.report)?;
            if !args.quiet {
                print!("{}", render_summary(&report, symbol, &config.report));
            }
        }
        None => {
            let stdout = io::stdout().lock();
            match config.report.format {
                ReportFormat::Csv => ReportWriter::write_csv(&report, stdout)?,
                ReportFormat::Json => {
                    ReportWriter::write_json(&report, symbol, &config.report, stdout)?;
                }
            }
            if !args.quiet {
                let mut stderr = io::stderr().lock();
                write!(stderr, "{}", render_summary(&report, symbol, &config.report))?;
            }
        }
    }

    Ok(())
}

/// Formats the console summary.
pub fn render_summary(
    report: &AnalysisReport,
    symbol: Option<&str>,
    report_config: &ReportConfig,
) -> String {
    let summary = report.summary(report_config.overbought, report_config.oversold);
    let params = &report.config;
    let mut out = String::new();

    let title = match symbol {
        Some(symbol) => format!("RSI divergence analysis: {symbol}"),
        None => "RSI divergence analysis".to_string(),
    };
    out.push_str(&format!("\n{}\n", title.bold()));

    let span = match (summary.first_timestamp, summary.last_timestamp) {
        (Some(first), Some(last)) => format!(
            " ({} to {})",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        ),
        _ => String::new(),
    };
    out.push_str(&format!("  Observations:   {}{}\n", summary.observations, span));

    if let Some(close) = summary.last_close {
        out.push_str(&format!("  Last close:     {close:.4}\n"));
    }

    let rsi_label = format!("RSI({})", params.oscillator_window);
    match (summary.last_rsi, summary.last_zone) {
        (Some(rsi), Some(zone)) => {
            let reading = format!("{rsi:.2} ({zone})");
            let reading = match zone {
                RsiZone::Overbought => reading.red(),
                RsiZone::Oversold => reading.green(),
                RsiZone::Neutral => reading.normal(),
            };
            out.push_str(&format!("  {rsi_label:<15} {reading}\n"));
        }
        _ => out.push_str(&format!("  {rsi_label:<15} {}\n", "undefined".dimmed())),
    }
    out.push_str(&format!(
        "  Zones:          {} readings >= {}, {} readings <= {}\n",
        summary.overbought_count,
        report_config.overbought,
        summary.oversold_count,
        report_config.oversold
    ));

    if summary.bands_available {
        out.push_str(&format!(
            "  Bands:          {} x {}\n",
            params.band_window, params.band_std_dev_multiplier
        ));
    } else {
        let reason = report.band_warning.as_deref().unwrap_or("unavailable");
        out.push_str(&format!("  Bands:          {}\n", reason.yellow()));
    }

    let dates = |indices: Vec<usize>| -> String {
        indices
            .iter()
            .filter_map(|&i| report.series.timestamps().get(i))
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let bullish = format!("{} bullish", summary.bullish_count);
    let bearish = format!("{} bearish", summary.bearish_count);
    out.push_str(&format!(
        "  Divergences:    {}, {}\n",
        bullish.green().bold(),
        bearish.red().bold()
    ));
    if summary.bullish_count > 0 {
        out.push_str(&format!(
            "    bullish at {}\n",
            dates(report.divergences.bullish_indices())
        ));
    }
    if summary.bearish_count > 0 {
        out.push_str(&format!(
            "    bearish at {}\n",
            dates(report.divergences.bearish_indices())
        ));
    }

    out
}
