//! CSV Bar Source
//!
//! Reads exported bar files, one per symbol, at `{dir}/{SYMBOL}.csv`. The
//! header must name a `time` and a `close` column; every other column
//! (open/high/low, tick volume, spread) is ignored.
//!
//! `time` may be unix seconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` in UTC.
//! Fields may be quoted, including ignored columns holding commas.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{PricePoint, PriceSeries};
use crate::ports::market_data::{MarketDataError, MarketDataPort, PriceQuery};

/// File-backed market data port
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    async fn load_symbol(&self, symbol: &str, query: &PriceQuery) -> Result<PriceSeries, MarketDataError> {
        let path = self.path_for(symbol);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MarketDataError::UnknownSymbol(symbol.to_string()));
            }
            Err(source) => {
                return Err(MarketDataError::Io {
                    symbol: symbol.to_string(),
                    source,
                })
            }
        };

        let bars = parse_bars(symbol, &content)?;
        let mut series = PriceSeries::with_capacity(bars.len());
        for bar in bars.into_iter().filter(|b| query.contains(b.timestamp)) {
            if !query.timeframe.is_aligned(bar.timestamp) {
                return Err(MarketDataError::ResolutionMismatch {
                    symbol: symbol.to_string(),
                    timeframe: query.timeframe,
                    timestamp: bar.timestamp,
                });
            }
            series.push(bar);
        }

        debug!("{}: {} bars from {}", symbol, series.len(), path.display());
        Ok(series)
    }
}

#[async_trait]
impl MarketDataPort for CsvBarSource {
    async fn fetch_closes(&self, query: &PriceQuery) -> Result<HashMap<String, PriceSeries>, MarketDataError> {
        query.validate()?;

        let mut result = HashMap::with_capacity(query.symbols.len());
        for symbol in &query.symbols {
            let series = self.load_symbol(symbol, query).await?;
            result.insert(symbol.clone(), series);
        }

        info!(
            "Loaded {} {} series from {} ({} to {})",
            result.len(),
            query.timeframe,
            self.dir.display(),
            query.start,
            query.end
        );
        Ok(result)
    }
}

/// Parse a bar file into closing-price points, in file order
pub fn parse_bars(symbol: &str, content: &str) -> Result<PriceSeries, MarketDataError> {
    let parse_error = |line: u64, reason: String| MarketDataError::ParseError {
        symbol: symbol.to_string(),
        line: line as usize,
        reason,
    };
    let csv_error = |e: csv::Error| {
        let line = e.position().map(|p| p.line()).unwrap_or(1);
        parse_error(line, e.to_string())
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader.headers().map_err(csv_error)?.clone();
    if header.iter().all(str::is_empty) {
        return Err(parse_error(1, "missing header".into()));
    }
    let column = |name: &str| header.iter().position(|c| c.eq_ignore_ascii_case(name));
    let time_col = column("time").ok_or_else(|| parse_error(1, "no 'time' column".into()))?;
    let close_col = column("close").ok_or_else(|| parse_error(1, "no 'close' column".into()))?;

    let mut series = PriceSeries::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line_no = record.position().map(|p| p.line()).unwrap_or_default();

        let time_field = record
            .get(time_col)
            .ok_or_else(|| parse_error(line_no, "missing time field".into()))?;
        let close_field = record
            .get(close_col)
            .ok_or_else(|| parse_error(line_no, "missing close field".into()))?;

        let timestamp = parse_time(time_field)
            .ok_or_else(|| parse_error(line_no, format!("invalid time '{}'", time_field)))?;
        let close: f64 = close_field
            .parse()
            .map_err(|_| parse_error(line_no, format!("invalid close '{}'", close_field)))?;

        series.push(PricePoint::new(timestamp, close));
    }

    Ok(series)
}

fn parse_time(field: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = field.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(field) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(field, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::market_data::Timeframe;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    const BARS: &str = "time,open,high,low,close,tick_volume,spread\n\
        1704067200,1.1,1.2,1.0,1.1050,120,2\n\
        1704070800,1.1,1.2,1.0,1.1062,98,2\n\
        1704074400,1.1,1.2,1.0,1.1041,143,3\n";

    fn query(symbols: &[&str]) -> PriceQuery {
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        PriceQuery::lookback(
            Timeframe::H1,
            end,
            Duration::days(2),
            symbols.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_parse_bars_keeps_only_close() {
        let series = parse_bars("EURUSD", BARS).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(series[1].close, 1.1062);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(parse_time("1704070800"), Some(expected));
        assert_eq!(parse_time("2024-01-01T01:00:00Z"), Some(expected));
        assert_eq!(parse_time("2024-01-01 01:00:00"), Some(expected));
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn test_parse_errors_name_symbol_and_line() {
        let err = parse_bars("GBPUSD", "time,close\n1704067200,abc\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GBPUSD"));
        assert!(message.contains("line 2"));

        assert!(parse_bars("GBPUSD", "timestamp,price\n").is_err());
    }

    #[test]
    fn test_quoted_fields() {
        let content = "time,comment,Close\n\
            1704067200,\"broker note, rollover\",1.1050\n\
            \"2024-01-01 01:00:00\",\"\",\"1.1062\"\n";
        let series = parse_bars("EURUSD", content).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].close, 1.1050);
        assert_eq!(series[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(series[1].close, 1.1062);
    }

    #[test]
    fn test_quoted_header_and_blank_lines() {
        let series = parse_bars("EURUSD", "\"time\",\"close\"\n\n\"1704067200\",\"1.1050\"\n").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].close, 1.1050);

        let err = parse_bars("EURUSD", "").unwrap_err();
        assert!(err.to_string().contains("missing header"));
    }

    #[test]
    fn test_short_row_reports_its_line() {
        let err = parse_bars("GBPUSD", "time,open,close\n1704067200,1.1,1.2\n1704070800,1.1\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing close field"));
        assert!(message.contains("line 3"));
    }

    #[tokio::test]
    async fn test_fetch_closes_from_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("EURUSD.csv"), BARS).unwrap();

        let source = CsvBarSource::new(dir.path());
        assert_eq!(source.dir(), dir.path());
        let result = source.fetch_closes(&query(&["EURUSD"])).await.unwrap();

        assert_eq!(result["EURUSD"].len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_names_symbol() {
        let dir = tempdir().unwrap();
        let source = CsvBarSource::new(dir.path());

        let err = source.fetch_closes(&query(&["USDJPY"])).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownSymbol(ref s) if s == "USDJPY"));
    }

    #[tokio::test]
    async fn test_rejects_wrong_resolution() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("EURUSD.csv"),
            "time,close\n2024-01-01T00:00:00Z,1.10\n2024-01-01T00:15:00Z,1.11\n",
        )
        .unwrap();

        let source = CsvBarSource::new(dir.path());
        let err = source.fetch_closes(&query(&["EURUSD"])).await.unwrap_err();
        assert!(matches!(err, MarketDataError::ResolutionMismatch { .. }));
    }
}
