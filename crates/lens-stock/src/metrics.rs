//! Rolling means and summary metrics over a price series

use crate::error::{Result, StockError};
use crate::series::{PriceRow, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use ta::{Next, indicators::SimpleMovingAverage};

/// Rolling mean windows, in trading rows
pub const MA_WINDOWS: [usize; 3] = [20, 60, 120];

/// A trading row with its derived moving averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalyzedRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub ma120: Option<f64>,
}

/// Price series with derived columns, ascending by date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzedSeries {
    rows: Vec<AnalyzedRow>,
}

impl AnalyzedSeries {
    pub fn rows(&self) -> &[AnalyzedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_volume(&self) -> u64 {
        self.rows.iter().map(|row| row.volume).max().unwrap_or(0)
    }
}

/// Latest-day figures for the summary panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummarySnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub previous_close: f64,
    pub change: f64,
    /// Percent, unrounded
    pub change_rate: f64,
    pub volume: u64,
    pub ma20: Option<f64>,
}

/// Summary outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    Snapshot(SummarySnapshot),
    InsufficientData { rows: usize },
}

impl Summary {
    /// The snapshot, or `InsufficientData` as an error
    pub fn into_snapshot(self) -> Result<SummarySnapshot> {
        match self {
            Summary::Snapshot(snapshot) => Ok(snapshot),
            Summary::InsufficientData { rows } => Err(StockError::InsufficientData { rows }),
        }
    }
}

/// Output of [`compute`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub series: AnalyzedSeries,
    pub summary: Summary,
}

/// Rolling mean of `values` over `window` rows
///
/// Entry `i` is `Some(mean(values[i+1-window..=i]))` once `i >= window - 1`
/// and `None` before that.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(window)
        .map_err(|e| StockError::Other(format!("invalid rolling window {window}: {e}")))?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let mean = sma.next(value);
            (i + 1 >= window).then_some(mean)
        })
        .collect())
}

/// Derive moving averages and the summary snapshot
pub fn compute(series: &PriceSeries) -> Result<Analysis> {
    let closes = series.closes();
    let [ma20, ma60, ma120] = MA_WINDOWS.map(|window| rolling_mean(&closes, window));
    let (ma20, ma60, ma120) = (ma20?, ma60?, ma120?);

    let rows: Vec<AnalyzedRow> = series
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| analyzed(row, ma20[i], ma60[i], ma120[i]))
        .collect();

    let summary = summarize(&rows);
    Ok(Analysis {
        series: AnalyzedSeries { rows },
        summary,
    })
}

fn analyzed(row: &PriceRow, ma20: Option<f64>, ma60: Option<f64>, ma120: Option<f64>) -> AnalyzedRow {
    AnalyzedRow {
        date: row.date,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
        ma20,
        ma60,
        ma120,
    }
}

fn summarize(rows: &[AnalyzedRow]) -> Summary {
    let [.., previous, latest] = rows else {
        return Summary::InsufficientData { rows: rows.len() };
    };

    let change = latest.close - previous.close;
    Summary::Snapshot(SummarySnapshot {
        date: latest.date,
        close: latest.close,
        previous_close: previous.close,
        change,
        change_rate: change / previous.close * 100.0,
        volume: latest.volume,
        ma20: latest.ma20,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PriceRow {
                    date: start + Days::new(i as u64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000 + i as u64,
                })
                .collect(),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_rolling_mean_warmup() {
        let values: Vec<f64> = (1..=5).map(f64::from).collect();
        let means = rolling_mean(&values, 3).unwrap();
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert!(approx(means[2].unwrap(), 2.0));
        assert!(approx(means[3].unwrap(), 3.0));
        assert!(approx(means[4].unwrap(), 4.0));
    }

    #[test]
    fn test_rolling_mean_matches_definition() {
        let values: Vec<f64> = (0..150).map(|i| 50_000.0 + f64::from(i * 37 % 101)).collect();
        for window in MA_WINDOWS {
            let means = rolling_mean(&values, window).unwrap();
            for (i, mean) in means.iter().enumerate() {
                if i + 1 < window {
                    assert!(mean.is_none());
                } else {
                    let expected = values[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                    assert!(approx(mean.unwrap(), expected), "window {window} row {i}");
                }
            }
        }
    }

    #[test]
    fn test_rolling_mean_zero_window() {
        assert!(rolling_mean(&[1.0], 0).is_err());
    }

    #[test]
    fn test_twenty_rows() {
        let closes: Vec<f64> = (1..=20).map(|i| f64::from(i) * 100.0).collect();
        let analysis = compute(&series(&closes)).unwrap();
        let rows = analysis.series.rows();

        assert!(rows[..19].iter().all(|r| r.ma20.is_none()));
        assert!(approx(rows[19].ma20.unwrap(), 1050.0));
        assert!(rows.iter().all(|r| r.ma60.is_none() && r.ma120.is_none()));

        let snapshot = analysis.summary.into_snapshot().unwrap();
        assert_eq!(snapshot.close, 2000.0);
        assert_eq!(snapshot.previous_close, 1900.0);
        assert_eq!(snapshot.change, 100.0);
        assert!(approx(snapshot.change_rate, 100.0 / 1900.0 * 100.0));
        assert_eq!(snapshot.volume, 1_019);
        assert!(approx(snapshot.ma20.unwrap(), 1050.0));
    }

    #[test]
    fn test_nineteen_rows_have_no_ma20() {
        let closes: Vec<f64> = (1..=19).map(f64::from).collect();
        let analysis = compute(&series(&closes)).unwrap();
        assert!(analysis.series.rows().iter().all(|r| r.ma20.is_none()));
        let snapshot = analysis.summary.into_snapshot().unwrap();
        assert_eq!(snapshot.ma20, None);
    }

    #[test]
    fn test_negative_change() {
        let analysis = compute(&series(&[55_500.0, 54_000.0])).unwrap();
        let snapshot = analysis.summary.into_snapshot().unwrap();
        assert_eq!(snapshot.change, -1_500.0);
        assert!(approx(snapshot.change_rate, -2.702_702_702_7));
    }

    #[test]
    fn test_insufficient_data() {
        for closes in [&[][..], &[100.0][..]] {
            let analysis = compute(&series(closes)).unwrap();
            assert_eq!(
                analysis.summary,
                Summary::InsufficientData { rows: closes.len() }
            );
            assert!(matches!(
                analysis.summary.into_snapshot(),
                Err(StockError::InsufficientData { .. })
            ));
        }
    }

    #[test]
    fn test_max_volume() {
        let analysis = compute(&series(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(analysis.series.max_volume(), 1_002);
        assert_eq!(AnalyzedSeries::default().max_volume(), 0);
    }
}
