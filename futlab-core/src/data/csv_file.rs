//! CSV-backed price provider.
//!
//! Expected layout: a header row with `trading_day` and `symbol` columns and
//! one column per price field (`openprice`, `closeprice`, `settlementprice`,
//! ...). Trading days are `YYYY-MM-DD` or `YYYYMMDD`. Empty cells are treated
//! as absent values. When the same (day, symbol) appears on several rows,
//! later rows are more recent.

use super::provider::{PriceError, PriceProvider, PriceSeries};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    series: HashMap<(NaiveDate, String), PriceSeries>,
}

impl CsvPriceProvider {
    /// Load a price table from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self, PriceError> {
        let file = std::fs::File::open(path)
            .map_err(|e| PriceError::Io(format!("open {}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    /// Load a price table from any reader producing CSV text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PriceError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| PriceError::Parse(format!("read header: {e}")))?
            .clone();

        let day_col = column(&headers, "trading_day")?;
        let symbol_col = column(&headers, "symbol")?;
        let field_cols: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != day_col && *i != symbol_col)
            .collect();

        let mut series: HashMap<(NaiveDate, String), PriceSeries> = HashMap::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| PriceError::Parse(format!("row {}: {e}", row + 1)))?;
            let day_raw = record.get(day_col).unwrap_or_default();
            let day = parse_trading_day(day_raw).ok_or_else(|| {
                PriceError::Parse(format!("row {}: bad trading_day '{day_raw}'", row + 1))
            })?;
            let symbol = record.get(symbol_col).unwrap_or_default().to_string();
            if symbol.is_empty() {
                return Err(PriceError::Parse(format!("row {}: empty symbol", row + 1)));
            }

            let entry = series.entry((day, symbol)).or_default();
            for (col, field) in &field_cols {
                let cell = record.get(*col).unwrap_or_default();
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| {
                    PriceError::Parse(format!("row {}: field '{field}' is not a number: '{cell}'", row + 1))
                })?;
                entry.push_latest(field, value);
            }
        }

        Ok(Self { series })
    }

    /// Number of (trading day, symbol) entries loaded.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, PriceError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PriceError::Parse(format!("missing '{name}' column")))
}

/// Parse `YYYY-MM-DD` or the compact `YYYYMMDD` form.
pub fn parse_trading_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
}

impl PriceProvider for CsvPriceProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, trading_day: NaiveDate, symbol: &str) -> Result<PriceSeries, PriceError> {
        self.series
            .get(&(trading_day, symbol.to_string()))
            .cloned()
            .ok_or_else(|| PriceError::NotFound {
                symbol: symbol.to_string(),
                trading_day,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
trading_day,symbol,openprice,closeprice,settlementprice
20170601,rb1710,3100,3120,3115
2017-06-01,ag1712,4010,,4020
20170602,rb1710,3120,3150,3140
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 6, d).unwrap()
    }

    #[test]
    fn loads_fields_per_day_and_symbol() {
        let provider = CsvPriceProvider::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(provider.len(), 3);

        let rb = provider.fetch(day(1), "rb1710").unwrap();
        assert_eq!(rb.latest("closeprice"), Some(3120.0));
        assert_eq!(rb.latest("settlementprice"), Some(3115.0));

        let rb2 = provider.fetch(day(2), "rb1710").unwrap();
        assert_eq!(rb2.latest("closeprice"), Some(3150.0));
    }

    #[test]
    fn empty_cells_are_absent() {
        let provider = CsvPriceProvider::from_reader(SAMPLE.as_bytes()).unwrap();
        let ag = provider.fetch(day(1), "ag1712").unwrap();
        assert_eq!(ag.latest("closeprice"), None);
        assert_eq!(ag.latest("settlementprice"), Some(4020.0));
    }

    #[test]
    fn later_rows_are_more_recent() {
        let csv = "trading_day,symbol,closeprice\n20170601,rb1710,1\n20170601,rb1710,2\n";
        let provider = CsvPriceProvider::from_reader(csv.as_bytes()).unwrap();
        let series = provider.fetch(day(1), "rb1710").unwrap();
        assert_eq!(series.field("closeprice"), Some(&[2.0, 1.0][..]));
    }

    #[test]
    fn missing_symbol_is_not_found() {
        let provider = CsvPriceProvider::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(
            provider.fetch(day(2), "ag1712"),
            Err(PriceError::NotFound { .. })
        ));
    }

    #[test]
    fn rejects_bad_rows() {
        let no_symbol = "trading_day,closeprice\n20170601,1\n";
        assert!(matches!(
            CsvPriceProvider::from_reader(no_symbol.as_bytes()),
            Err(PriceError::Parse(_))
        ));

        let bad_day = "trading_day,symbol,closeprice\nJune,rb1710,1\n";
        assert!(CsvPriceProvider::from_reader(bad_day.as_bytes()).is_err());

        let bad_price = "trading_day,symbol,closeprice\n20170601,rb1710,abc\n";
        assert!(CsvPriceProvider::from_reader(bad_price.as_bytes()).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let provider = CsvPriceProvider::from_path(&path).unwrap();
        assert!(!provider.is_empty());

        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            CsvPriceProvider::from_path(&missing),
            Err(PriceError::Io(_))
        ));
    }
}
