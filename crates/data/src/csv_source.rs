use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use divergence_core::CandidateSeries;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Accepted timestamp headers, in order of preference (case-insensitive).
pub const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "date", "datetime", "time"];
/// Close price header (case-insensitive).
pub const CLOSE_COLUMN: &str = "close";

/// Loads candidate price series from CSV files.
///
/// The file must have a header row. The first matching timestamp column is
/// used; the close column is optional so that its absence can be reported by
/// series validation. Rows are sorted by timestamp.
pub struct CsvPriceSource;

impl CsvPriceSource {
    /// Reads a candidate series from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The CSV file cannot be opened
    /// - The header has no timestamp column
    /// - A row cannot be read or its timestamp cannot be parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<CandidateSeries> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open price file: {}", path.display()))?;

        let candidate = Self::from_reader(file)
            .with_context(|| format!("Failed to parse price file: {}", path.display()))?;

        tracing::info!("Loaded {} rows from {}", candidate.len(), path.display());
        Ok(candidate)
    }

    /// Reads a candidate series from any CSV source.
    ///
    /// # Errors
    ///
    /// Same as [`CsvPriceSource::from_path`], minus file access.
    pub fn from_reader<R: Read>(reader: R) -> Result<CandidateSeries> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        let ts_col = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|name| find(name))
            .ok_or_else(|| {
                anyhow!(
                    "No timestamp column found (expected one of: {})",
                    TIMESTAMP_COLUMNS.join(", ")
                )
            })?;
        let close_col = find(CLOSE_COLUMN);

        if close_col.is_none() {
            tracing::warn!("No '{}' column in header: {:?}", CLOSE_COLUMN, headers);
        }

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let line = i + 2; // header is line 1
            let record = result.with_context(|| format!("Failed to read CSV line {line}"))?;

            let raw_ts = record.get(ts_col).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts)
                .with_context(|| format!("Invalid timestamp on line {line}"))?;
            let close = close_col.and_then(|c| record.get(c)).and_then(parse_close);

            rows.push((timestamp, close));
        }

        // Sort by timestamp to ensure chronological order
        rows.sort_by_key(|(timestamp, _)| *timestamp);

        let (timestamps, closes): (Vec<_>, Vec<_>) = rows.into_iter().unzip();

        Ok(match close_col {
            Some(_) => CandidateSeries::new(timestamps, closes),
            None => CandidateSeries::without_close(timestamps),
        })
    }
}

/// Parses a timestamp cell.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` (midnight UTC),
/// and integer Unix seconds.
///
/// # Errors
/// Returns an error if none of the formats match.
///
/// # Examples
/// ```
/// use divergence_data::parse_timestamp;
///
/// let a = parse_timestamp("2024-04-01").unwrap();
/// let b = parse_timestamp("2024-04-01T00:00:00Z").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| anyhow!("Unix timestamp out of range: {secs}"));
    }

    bail!("Unrecognized timestamp format: '{raw}'")
}

/// Parses a close cell; empty, unparsable or non-finite cells are undefined.
fn parse_close(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::debug!("Treating close '{}' as undefined", raw);
            None
        }
    }
}
