//! Yahoo Finance price source

use super::PriceSource;
use crate::error::{ChatError, Result};
use crate::series::{PricePoint, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// Yahoo Finance daily-history client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    /// Get daily closes between two instants
    pub async fn get_closes_between(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| ChatError::data_unavailable(ticker, e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp()).map_err(|e| {
            ChatError::data_unavailable(ticker, format!("Invalid start timestamp: {e}"))
        })?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp()).map_err(|e| {
            ChatError::data_unavailable(ticker, format!("Invalid end timestamp: {e}"))
        })?;

        let response = provider
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| ChatError::data_unavailable(ticker, e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| ChatError::data_unavailable(ticker, e.to_string()))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter(|q| q.close.is_finite())
            .filter_map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0).map(|ts| PricePoint {
                    date: ts.date_naive(),
                    close: q.close,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(ChatError::data_unavailable(ticker, "No historical data available"));
        }

        debug!(ticker, observations = points.len(), "Fetched price history");
        Ok(PriceSeries::new(ticker, points))
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn fetch_daily_closes(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(lookback_days));
        self.get_closes_between(ticker, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_one_year() {
        let client = YahooFinanceClient::new();
        let series = client.fetch_daily_closes("AAPL", 365).await.unwrap();

        assert_eq!(series.ticker(), "AAPL");
        assert!(series.len() > 200);
        assert!(series.last_close().unwrap() > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_ticker_is_data_unavailable() {
        let client = YahooFinanceClient::new();
        let err = client
            .fetch_daily_closes("NOSUCHTICKERZZZ", 365)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::DataUnavailable { .. }));
    }
}
