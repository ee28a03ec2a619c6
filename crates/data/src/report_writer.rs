use anyhow::{Context, Result};
use csv::Writer;
use divergence_core::{DivergenceEvents, PipelineConfig, ReportConfig, ReportFormat};
use divergence_signals::{AnalysisReport, ReportRow, ReportSummary};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column order of the CSV report.
pub const CSV_HEADER: [&str; 7] = [
    "timestamp",
    "close",
    "rsi",
    "bb_middle",
    "bb_upper",
    "bb_lower",
    "divergence",
];

/// JSON document layout.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    config: &'a PipelineConfig,
    summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    band_warning: Option<&'a str>,
    divergences: &'a DivergenceEvents,
    rows: Vec<ReportRow>,
}

pub struct ReportWriter;

impl ReportWriter {
    /// Writes one row per observation.
    ///
    /// Format: timestamp,close,rsi,bb_middle,bb_upper,bb_lower,divergence
    ///
    /// Undefined values are written as empty cells.
    ///
    /// # Errors
    /// Returns error if writing fails
    pub fn write_csv<W: Write>(report: &AnalysisReport, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);

        writer.write_record(CSV_HEADER)?;

        for row in report.rows() {
            writer.write_record(&[
                row.timestamp.to_rfc3339(),
                row.close.to_string(),
                cell(row.rsi),
                cell(row.bb_middle),
                cell(row.bb_upper),
                cell(row.bb_lower),
                row.divergence.map(|d| d.to_string()).unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Writes the report as a pretty-printed JSON document with a summary
    /// computed against the configured RSI levels.
    ///
    /// # Errors
    /// Returns error if serialization or writing fails
    pub fn write_json<W: Write>(
        report: &AnalysisReport,
        symbol: Option<&str>,
        report_config: &ReportConfig,
        mut writer: W,
    ) -> Result<()> {
        let document = JsonReport {
            symbol,
            config: &report.config,
            summary: report.summary(report_config.overbought, report_config.oversold),
            band_warning: report.band_warning.as_deref(),
            divergences: &report.divergences,
            rows: report.rows(),
        };

        serde_json::to_writer_pretty(&mut writer, &document)
            .context("Failed to serialize report")?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the report to `path` in the configured format.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails
    pub fn write_to_path(
        report: &AnalysisReport,
        path: impl AsRef<Path>,
        symbol: Option<&str>,
        report_config: &ReportConfig,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let writer = BufWriter::new(file);

        match report_config.format {
            ReportFormat::Csv => Self::write_csv(report, writer)?,
            ReportFormat::Json => Self::write_json(report, symbol, report_config, writer)?,
        }

        tracing::info!(
            "Wrote {} report ({} rows) to {}",
            report_config.format,
            report.len(),
            path.display()
        );
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use divergence_core::{BandSeries, DivergenceEvent, IndicatorSeries, PriceSeries};
    use tempfile::tempdir;

    fn sample_report(bands: bool) -> AnalysisReport {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let series =
            PriceSeries::with_interval(start, Duration::days(1), vec![100.0, 101.5, 99.25])
                .unwrap();
        let bands = bands.then(|| BandSeries {
            middle: IndicatorSeries::new(vec![None, Some(100.75), Some(100.375)]),
            upper: IndicatorSeries::new(vec![None, Some(102.0), Some(102.5)]),
            lower: IndicatorSeries::new(vec![None, Some(99.5), Some(98.25)]),
        });
        let band_warning = if bands.is_some() {
            None
        } else {
            Some("band computation failed: test".to_string())
        };

        AnalysisReport {
            config: PipelineConfig::default(),
            series,
            oscillator: IndicatorSeries::new(vec![None, Some(75.0), Some(25.5)]),
            bands,
            band_warning,
            divergences: DivergenceEvents::new(vec![DivergenceEvent::bullish(2)]),
        }
    }

    // ============================================
    // CSV Tests
    // ============================================

    #[test]
    fn test_write_csv_layout() {
        let mut out = Vec::new();
        ReportWriter::write_csv(&sample_report(true), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,close,rsi,bb_middle,bb_upper,bb_lower,divergence");
        assert_eq!(lines[1], "2024-03-01T00:00:00+00:00,100,,,,,");
        assert_eq!(lines[2], "2024-03-02T00:00:00+00:00,101.5,75,100.75,102,99.5,");
        assert_eq!(
            lines[3],
            "2024-03-03T00:00:00+00:00,99.25,25.5,100.375,102.5,98.25,bullish"
        );
    }

    #[test]
    fn test_write_csv_without_bands_leaves_cells_empty() {
        let mut out = Vec::new();
        ReportWriter::write_csv(&sample_report(false), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text
            .lines()
            .nth(2)
            .is_some_and(|line| line.ends_with(",75,,,,")));
    }

    // ============================================
    // JSON Tests
    // ============================================

    #[test]
    fn test_write_json_document() {
        let mut out = Vec::new();
        ReportWriter::write_json(
            &sample_report(true),
            Some("SPY"),
            &ReportConfig::default(),
            &mut out,
        )
        .unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["symbol"], "SPY");
        assert_eq!(doc["config"]["oscillator_window"], 14);
        assert_eq!(doc["summary"]["observations"], 3);
        assert_eq!(doc["summary"]["overbought_count"], 1);
        assert_eq!(doc["summary"]["oversold_count"], 1);
        assert_eq!(doc["summary"]["last_zone"], "oversold");
        assert_eq!(doc["divergences"][0]["index"], 2);
        assert_eq!(doc["divergences"][0]["kind"], "bullish");
        assert_eq!(doc["rows"].as_array().map(Vec::len), Some(3));
        assert!(doc["rows"][0]["rsi"].is_null());
        assert_eq!(doc["rows"][2]["divergence"], "bullish");
        assert!(doc.get("band_warning").is_none());
    }

    #[test]
    fn test_write_json_includes_band_warning() {
        let mut out = Vec::new();
        ReportWriter::write_json(&sample_report(false), None, &ReportConfig::default(), &mut out)
            .unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(doc.get("symbol").is_none());
        assert_eq!(doc["band_warning"], "band computation failed: test");
        assert_eq!(doc["summary"]["bands_available"], false);
    }

    // ============================================
    // File Output Tests
    // ============================================

    #[test]
    fn test_write_to_path_follows_format() {
        let dir = tempdir().unwrap();
        let report = sample_report(true);

        let csv_path = dir.path().join("report.csv");
        ReportWriter::write_to_path(&report, &csv_path, None, &ReportConfig::default()).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv_text.starts_with("timestamp,close,rsi"));

        let json_path = dir.path().join("report.json");
        let json_config = ReportConfig {
            format: ReportFormat::Json,
            ..ReportConfig::default()
        };
        ReportWriter::write_to_path(&report, &json_path, Some("SPY"), &json_config).unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(doc["symbol"], "SPY");
    }

    #[test]
    fn test_write_to_path_missing_directory_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.csv");
        let err = ReportWriter::write_to_path(
            &sample_report(true),
            &path,
            None,
            &ReportConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to create report file"));
    }
}
