//! Price history sources

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::series::PriceSeries;
use async_trait::async_trait;

/// Supplies daily closing prices for a ticker
///
/// Implementations fail with [`crate::ChatError::DataUnavailable`] for
/// unknown or delisted tickers and for empty histories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch daily closes covering the last `lookback_days` calendar days
    async fn fetch_daily_closes(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries>;
}
