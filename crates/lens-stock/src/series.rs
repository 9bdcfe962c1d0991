//! Daily price series and date ranges

use crate::error::{Result, StockError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Earliest date a lookup may start from
pub const MIN_LOOKUP_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1990, 1, 1) {
    Some(date) => date,
    None => panic!("invalid minimum lookup date"),
};

/// Suggested start date for a new lookup
pub const DEFAULT_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};

/// Inclusive calendar date range with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(StockError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range that must also lie within `[MIN_LOOKUP_DATE, today]`
    pub fn bounded(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self> {
        let range = Self::new(start, end)?;
        if start < MIN_LOOKUP_DATE {
            return Err(StockError::InvalidInput(format!(
                "start date {start} is before {MIN_LOOKUP_DATE}"
            )));
        }
        if end > today {
            return Err(StockError::InvalidInput(format!(
                "end date {end} is in the future"
            )));
        }
        Ok(range)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Format a date as the 8-digit `YYYYMMDD` string providers expect
pub fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parse an 8-digit `YYYYMMDD` string
pub fn parse_compact(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| StockError::ParseError(format!("invalid compact date '{value}': {e}")))
}

/// One trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceRow {
    /// All four prices are strictly positive
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Trading rows in ascending date order, one row per date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    rows: Vec<PriceRow>,
}

impl PriceSeries {
    /// Build a series, sorting ascending and keeping the last row seen for a repeated date
    pub fn new(mut rows: Vec<PriceRow>) -> Self {
        // stable sort keeps arrival order among equal dates
        rows.sort_by_key(|row| row.date);
        let mut deduped: Vec<PriceRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.date == row.date => *last = row,
                _ => deduped.push(row),
            }
        }
        Self { rows: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.close).collect()
    }

    pub fn first(&self) -> Option<&PriceRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PriceRow> {
        self.rows.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(d: NaiveDate, close: f64) -> PriceRow {
        PriceRow {
            date: d,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(DateRange::new(date(2023, 1, 31), date(2023, 1, 1)).is_err());
        let same = DateRange::new(date(2023, 1, 1), date(2023, 1, 1)).unwrap();
        assert!(same.contains(date(2023, 1, 1)));
    }

    #[test]
    fn test_date_range_bounds() {
        let today = date(2024, 6, 1);
        assert!(DateRange::bounded(date(1989, 12, 31), date(2000, 1, 1), today).is_err());
        assert!(DateRange::bounded(date(2024, 1, 1), date(2024, 6, 2), today).is_err());
        assert!(DateRange::bounded(MIN_LOOKUP_DATE, today, today).is_ok());
    }

    #[test]
    fn test_compact_dates() {
        assert_eq!(compact(date(2023, 1, 2)), "20230102");
        assert_eq!(parse_compact("20230102").unwrap(), date(2023, 1, 2));
        assert!(parse_compact("2023-01-02").is_err());
    }

    #[test]
    fn test_series_sorted_and_unique() {
        let series = PriceSeries::new(vec![
            row(date(2023, 1, 3), 3.0),
            row(date(2023, 1, 2), 1.0),
            row(date(2023, 1, 2), 2.0),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.rows()[0].date, date(2023, 1, 2));
        assert_eq!(series.rows()[0].close, 2.0);
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_valid_prices() {
        let mut r = row(date(2023, 1, 2), 100.0);
        assert!(r.has_valid_prices());
        r.open = 0.0;
        assert!(!r.has_valid_prices());
    }
}
