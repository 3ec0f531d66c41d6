//! Daily closing-price series

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One daily observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one ticker, ascending by date
///
/// Trading-day gaps are allowed. A series is built once per computation and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting the points by date
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            ticker: ticker.into(),
            points,
        }
    }

    /// Build a series of consecutive calendar days starting at `start`
    pub fn from_closes(ticker: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .filter_map(|(i, &close)| {
                start
                    .checked_add_days(Days::new(i as u64))
                    .map(|date| PricePoint { date, close })
            })
            .collect();
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest closing price
    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_points_are_sorted() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint { date: date(2024, 1, 3), close: 3.0 },
                PricePoint { date: date(2024, 1, 1), close: 1.0 },
                PricePoint { date: date(2024, 1, 2), close: 2.0 },
            ],
        );

        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 3)));
        assert_eq!(series.last_close(), Some(3.0));
    }

    #[test]
    fn test_from_closes() {
        let series = PriceSeries::from_closes("MSFT", date(2024, 2, 28), &[10.0, 11.0, 12.0]);
        assert_eq!(series.ticker(), "MSFT");
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_date(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::new("X", Vec::new());
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }
}
