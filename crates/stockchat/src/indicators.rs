//! Technical indicators over a closing-price series
//!
//! All functions take closes in ascending date order and evaluate the
//! indicator at the latest date. Exponential averages are unadjusted and
//! seeded with the first observation, which is exactly what
//! `ta::indicators::ExponentialMovingAverage` computes.

use crate::catalog::FunctionId;
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::{
    Next,
    indicators::{ExponentialMovingAverage, SimpleMovingAverage},
};

/// RSI smoothing period (centre of mass 13)
pub const RSI_PERIOD: usize = 14;

/// Fast EMA span of the MACD line
pub const MACD_FAST: usize = 12;

/// Slow EMA span of the MACD line
pub const MACD_SLOW: usize = 26;

/// EMA span of the MACD signal line
pub const MACD_SIGNAL: usize = 9;

/// RSI when there were no downward moves but some upward ones
pub const RSI_ALL_GAINS: f64 = 100.0;

/// RSI when the series never moved
pub const RSI_FLAT: f64 = 50.0;

/// MACD line, signal line and histogram at the latest date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// A computed indicator value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "indicator", rename_all = "snake_case")]
pub enum IndicatorResult {
    Price { value: f64 },
    Sma { window: usize, value: f64 },
    Ema { window: usize, value: f64 },
    Rsi { value: f64 },
    Macd(Macd),
}

impl fmt::Display for IndicatorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorResult::Price { value }
            | IndicatorResult::Sma { value, .. }
            | IndicatorResult::Ema { value, .. }
            | IndicatorResult::Rsi { value } => write!(f, "{value}"),
            IndicatorResult::Macd(m) => write!(f, "{}, {}, {}", m.macd, m.signal, m.histogram),
        }
    }
}

fn require(required: usize, available: usize) -> Result<()> {
    if available < required {
        return Err(ChatError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}

fn check_window(function: FunctionId, window: usize) -> Result<()> {
    if window == 0 {
        return Err(ChatError::InvalidArgument {
            function: function.name().to_string(),
            argument: "window".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn ema_indicator(function: FunctionId, period: usize) -> Result<ExponentialMovingAverage> {
    ExponentialMovingAverage::new(period).map_err(|e| ChatError::InvalidArgument {
        function: function.name().to_string(),
        argument: "window".to_string(),
        reason: e.to_string(),
    })
}

/// Full EMA path over `values`
fn ema_path(function: FunctionId, values: &[f64], span: usize) -> Result<Vec<f64>> {
    let mut ema = ema_indicator(function, span)?;
    Ok(values.iter().map(|&v| ema.next(v)).collect())
}

/// Last closing price
pub fn stock_price(closes: &[f64]) -> Result<f64> {
    closes.last().copied().ok_or(ChatError::InsufficientData {
        required: 1,
        available: 0,
    })
}

/// Mean of the trailing `window` closes
pub fn sma(closes: &[f64], window: usize) -> Result<f64> {
    check_window(FunctionId::CalculateSma, window)?;
    require(window, closes.len())?;

    let mut sma = SimpleMovingAverage::new(window).map_err(|e| ChatError::InvalidArgument {
        function: FunctionId::CalculateSma.name().to_string(),
        argument: "window".to_string(),
        reason: e.to_string(),
    })?;

    let mut value = 0.0;
    for &close in closes {
        value = sma.next(close);
    }
    Ok(value)
}

/// Exponential moving average with alpha = 2 / (window + 1)
pub fn ema(closes: &[f64], window: usize) -> Result<f64> {
    check_window(FunctionId::CalculateEma, window)?;
    require(window, closes.len())?;

    let path = ema_path(FunctionId::CalculateEma, closes, window)?;
    stock_price(&path)
}

/// Relative strength index with period 14
///
/// Up and down moves are smoothed with alpha = 1/14, the same as an EMA of
/// span 27. A series with no down moves yields [`RSI_ALL_GAINS`]; a series
/// that never moves yields [`RSI_FLAT`].
pub fn rsi(closes: &[f64]) -> Result<f64> {
    require(RSI_PERIOD + 1, closes.len())?;

    let span = 2 * RSI_PERIOD - 1;
    let mut up = ema_indicator(FunctionId::CalculateRsi, span)?;
    let mut down = ema_indicator(FunctionId::CalculateRsi, span)?;

    let mut up_mean = 0.0;
    let mut down_mean = 0.0;
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        up_mean = up.next(delta.max(0.0));
        down_mean = down.next((-delta).max(0.0));
    }

    if down_mean == 0.0 {
        return Ok(if up_mean == 0.0 { RSI_FLAT } else { RSI_ALL_GAINS });
    }

    let rs = up_mean / down_mean;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

/// MACD (12, 26, 9)
pub fn macd(closes: &[f64]) -> Result<Macd> {
    require(MACD_SLOW, closes.len())?;

    let fast = ema_path(FunctionId::CalculateMacd, closes, MACD_FAST)?;
    let slow = ema_path(FunctionId::CalculateMacd, closes, MACD_SLOW)?;
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_path(FunctionId::CalculateMacd, &line, MACD_SIGNAL)?;

    let macd = stock_price(&line)?;
    let signal = stock_price(&signal)?;
    Ok(Macd {
        macd,
        signal,
        histogram: macd - signal,
    })
}
