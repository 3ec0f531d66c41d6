//! Resolving a model's function call into a typed invocation and running it

use crate::api::PriceSource;
use crate::catalog::{Arity, FunctionId};
use crate::chart::{ChartArtifact, ChartRenderer};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::indicators::{self, IndicatorResult};
use crate::series::PriceSeries;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use stockchat_llm::FunctionCall;
use tracing::{debug, info, instrument, warn};

/// A function call as the model produced it, arguments still untyped
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub function_name: String,
    pub raw_arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(function_name: impl Into<String>, raw_arguments: Map<String, Value>) -> Self {
        Self {
            function_name: function_name.into(),
            raw_arguments,
        }
    }

    /// Parse the JSON argument string of a model function call
    ///
    /// Arguments that are not a JSON object are a protocol violation and
    /// surface as [`ChatError::ModelCallFailed`].
    pub fn from_function_call(call: &FunctionCall) -> Result<Self> {
        let value: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            ChatError::ModelCallFailed(format!(
                "malformed arguments for {}: {e}",
                call.name
            ))
        })?;

        match value {
            Value::Object(raw_arguments) => Ok(Self::new(call.name.clone(), raw_arguments)),
            other => Err(ChatError::ModelCallFailed(format!(
                "arguments for {} must be a JSON object, got {other}",
                call.name
            ))),
        }
    }
}

/// A validated call, one variant per catalog function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    GetStockPrice { ticker: String },
    CalculateSma { ticker: String, window: usize },
    CalculateEma { ticker: String, window: usize },
    CalculateRsi { ticker: String },
    CalculateMacd { ticker: String },
    PlotStockPrice { ticker: String },
}

impl Invocation {
    /// Validate a request against the catalog entry it names
    pub fn decode(request: &InvocationRequest) -> Result<Self> {
        let id = FunctionId::from_name(&request.function_name)
            .ok_or_else(|| ChatError::UnknownFunction(request.function_name.clone()))?;

        let declared = id.spec().parameters;
        let extra: Vec<&str> = request
            .raw_arguments
            .keys()
            .map(String::as_str)
            .filter(|key| !declared.iter().any(|p| p.name == *key))
            .collect();
        if !extra.is_empty() {
            warn!(function = %id, ignored = ?extra, "Ignoring undeclared arguments");
        }

        let args = &request.raw_arguments;
        let ticker = ticker_arg(id, args)?;

        let window = match id.arity() {
            Arity::TickerOnly => None,
            Arity::TickerAndWindow => Some(window_arg(id, args)?),
        };

        let invocation = match (id, window) {
            (FunctionId::GetStockPrice, _) => Invocation::GetStockPrice { ticker },
            (FunctionId::CalculateRsi, _) => Invocation::CalculateRsi { ticker },
            (FunctionId::CalculateMacd, _) => Invocation::CalculateMacd { ticker },
            (FunctionId::PlotStockPrice, _) => Invocation::PlotStockPrice { ticker },
            (FunctionId::CalculateSma, Some(window)) => Invocation::CalculateSma { ticker, window },
            (FunctionId::CalculateEma, Some(window)) => Invocation::CalculateEma { ticker, window },
            (FunctionId::CalculateSma | FunctionId::CalculateEma, None) => {
                return Err(missing(id, "window"));
            }
        };

        Ok(invocation)
    }

    pub fn id(&self) -> FunctionId {
        match self {
            Invocation::GetStockPrice { .. } => FunctionId::GetStockPrice,
            Invocation::CalculateSma { .. } => FunctionId::CalculateSma,
            Invocation::CalculateEma { .. } => FunctionId::CalculateEma,
            Invocation::CalculateRsi { .. } => FunctionId::CalculateRsi,
            Invocation::CalculateMacd { .. } => FunctionId::CalculateMacd,
            Invocation::PlotStockPrice { .. } => FunctionId::PlotStockPrice,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Invocation::GetStockPrice { ticker }
            | Invocation::CalculateSma { ticker, .. }
            | Invocation::CalculateEma { ticker, .. }
            | Invocation::CalculateRsi { ticker }
            | Invocation::CalculateMacd { ticker }
            | Invocation::PlotStockPrice { ticker } => ticker,
        }
    }
}

fn missing(id: FunctionId, argument: &str) -> ChatError {
    ChatError::MissingArgument {
        function: id.name().to_string(),
        argument: argument.to_string(),
    }
}

fn invalid(id: FunctionId, argument: &str, reason: impl Into<String>) -> ChatError {
    ChatError::InvalidArgument {
        function: id.name().to_string(),
        argument: argument.to_string(),
        reason: reason.into(),
    }
}

/// Required argument; JSON `null` counts as absent
fn required<'a>(id: FunctionId, args: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    match args.get(name) {
        None | Some(Value::Null) => Err(missing(id, name)),
        Some(value) => Ok(value),
    }
}

fn ticker_arg(id: FunctionId, args: &Map<String, Value>) -> Result<String> {
    let value = required(id, args, "ticker")?;
    let ticker = value
        .as_str()
        .ok_or_else(|| invalid(id, "ticker", format!("expected a string, got {value}")))?
        .trim();

    if ticker.is_empty() {
        return Err(invalid(id, "ticker", "must not be empty"));
    }
    Ok(ticker.to_uppercase())
}

/// Positive integer window; integral floats such as `20.0` are accepted
fn window_arg(id: FunctionId, args: &Map<String, Value>) -> Result<usize> {
    let value = required(id, args, "window")?;

    let window = if let Some(n) = value.as_u64() {
        usize::try_from(n).map_err(|_| invalid(id, "window", format!("{n} is too large")))?
    } else {
        match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => f as usize,
            _ => {
                return Err(invalid(
                    id,
                    "window",
                    format!("expected a positive integer, got {value}"),
                ));
            }
        }
    };

    if window == 0 {
        return Err(invalid(id, "window", "must be at least 1"));
    }
    Ok(window)
}

/// What a dispatched call produced
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Indicator(IndicatorResult),
    Chart(ChartArtifact),
}

/// Runs validated invocations against a price source
#[derive(Clone)]
pub struct Dispatcher {
    source: Arc<dyn PriceSource>,
    renderer: ChartRenderer,
    lookback_days: u32,
    timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher with a one-year lookback and a 30 second fetch timeout
    pub fn new(source: Arc<dyn PriceSource>, renderer: ChartRenderer) -> Self {
        Self {
            source,
            renderer,
            lookback_days: 365,
            timeout: Duration::from_secs(30),
        }
    }

    /// Dispatcher using the lookback, timeout and chart path of `config`
    pub fn from_config(source: Arc<dyn PriceSource>, config: &ChatConfig) -> Self {
        Self::new(source, ChartRenderer::new(config.chart_path.clone()))
            .with_lookback_days(config.lookback_days)
            .with_timeout(config.request_timeout)
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decode the request and invoke the function it names
    pub async fn resolve_and_invoke(&self, request: &InvocationRequest) -> Result<DispatchOutcome> {
        let invocation = Invocation::decode(request)?;
        self.invoke(invocation).await
    }

    /// Invoke a validated call
    #[instrument(skip(self), fields(function = %invocation.id(), ticker = invocation.ticker()))]
    pub async fn invoke(&self, invocation: Invocation) -> Result<DispatchOutcome> {
        let series = self.fetch(invocation.ticker()).await?;
        let closes = series.closes();

        let result = match invocation {
            Invocation::GetStockPrice { .. } => IndicatorResult::Price {
                value: indicators::stock_price(&closes)?,
            },
            Invocation::CalculateSma { window, .. } => IndicatorResult::Sma {
                window,
                value: indicators::sma(&closes, window)?,
            },
            Invocation::CalculateEma { window, .. } => IndicatorResult::Ema {
                window,
                value: indicators::ema(&closes, window)?,
            },
            Invocation::CalculateRsi { .. } => IndicatorResult::Rsi {
                value: indicators::rsi(&closes)?,
            },
            Invocation::CalculateMacd { .. } => IndicatorResult::Macd(indicators::macd(&closes)?),
            Invocation::PlotStockPrice { .. } => {
                return Ok(DispatchOutcome::Chart(self.renderer.render(&series)?));
            }
        };

        info!(result = %result, "Indicator computed");
        Ok(DispatchOutcome::Indicator(result))
    }

    async fn fetch(&self, ticker: &str) -> Result<PriceSeries> {
        let series = tokio::time::timeout(
            self.timeout,
            self.source.fetch_daily_closes(ticker, self.lookback_days),
        )
        .await
        .map_err(|_| {
            ChatError::data_unavailable(
                ticker,
                format!("price source timed out after {:?}", self.timeout),
            )
        })??;

        if series.is_empty() {
            return Err(ChatError::data_unavailable(ticker, "No historical data available"));
        }

        debug!(ticker, observations = series.len(), "Price series fetched");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPriceSource;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::tempdir;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn request(name: &str, value: Value) -> InvocationRequest {
        InvocationRequest::new(name, args(value))
    }

    fn series(ticker: &str, n: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        PriceSeries::from_closes(ticker, start, &closes)
    }

    fn dispatcher_with(source: MockPriceSource) -> Dispatcher {
        Dispatcher::new(Arc::new(source), ChartRenderer::new("unused.svg"))
    }

    #[test]
    fn test_decode_ticker_only() {
        let inv = Invocation::decode(&request("calculate_RSI", json!({"ticker": " aapl "}))).unwrap();
        assert_eq!(
            inv,
            Invocation::CalculateRsi {
                ticker: "AAPL".to_string()
            }
        );
        assert_eq!(inv.id(), FunctionId::CalculateRsi);
    }

    #[test]
    fn test_decode_with_window() {
        let inv =
            Invocation::decode(&request("calculate_EMA", json!({"ticker": "MSFT", "window": 20})))
                .unwrap();
        assert_eq!(
            inv,
            Invocation::CalculateEma {
                ticker: "MSFT".to_string(),
                window: 20
            }
        );

        let inv =
            Invocation::decode(&request("calculate_SMA", json!({"ticker": "MSFT", "window": 50.0})))
                .unwrap();
        assert_eq!(inv.id(), FunctionId::CalculateSma);
    }

    #[test]
    fn test_unknown_function() {
        let err = Invocation::decode(&request("get_weather", json!({"ticker": "AAPL"}))).unwrap_err();
        assert!(matches!(err, ChatError::UnknownFunction(name) if name == "get_weather"));
    }

    #[test]
    fn test_missing_window() {
        let err = Invocation::decode(&request("calculate_SMA", json!({"ticker": "AAPL"}))).unwrap_err();
        match err {
            ChatError::MissingArgument { function, argument } => {
                assert_eq!(function, "calculate_SMA");
                assert_eq!(argument, "window");
            }
            other => panic!("Expected MissingArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_or_null_ticker() {
        for payload in [json!({}), json!({"ticker": null})] {
            let err = Invocation::decode(&request("get_stock_price", payload)).unwrap_err();
            assert!(matches!(err, ChatError::MissingArgument { .. }));
        }
    }

    #[test]
    fn test_extra_arguments_ignored() {
        let inv = Invocation::decode(&request(
            "get_stock_price",
            json!({"ticker": "AAPL", "currency": "USD", "window": 5}),
        ))
        .unwrap();
        assert_eq!(
            inv,
            Invocation::GetStockPrice {
                ticker: "AAPL".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_argument_types() {
        for payload in [
            json!({"ticker": 42, "window": 5}),
            json!({"ticker": "  ", "window": 5}),
            json!({"ticker": "AAPL", "window": "20"}),
            json!({"ticker": "AAPL", "window": 2.5}),
            json!({"ticker": "AAPL", "window": -3}),
            json!({"ticker": "AAPL", "window": 0}),
        ] {
            let err = Invocation::decode(&request("calculate_SMA", payload.clone())).unwrap_err();
            assert!(
                matches!(err, ChatError::InvalidArgument { .. }),
                "{payload} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_malformed_argument_json() {
        let call = FunctionCall::new("get_stock_price", "{\"ticker\": ");
        let err = InvocationRequest::from_function_call(&call).unwrap_err();
        assert!(matches!(err, ChatError::ModelCallFailed(_)));

        let call = FunctionCall::new("get_stock_price", "[\"AAPL\"]");
        let err = InvocationRequest::from_function_call(&call).unwrap_err();
        assert!(matches!(err, ChatError::ModelCallFailed(_)));
    }

    #[test]
    fn test_request_from_function_call() {
        let call = FunctionCall::new("calculate_SMA", r#"{"ticker":"AAPL","window":10}"#);
        let req = InvocationRequest::from_function_call(&call).unwrap();
        assert_eq!(req.function_name, "calculate_SMA");
        assert_eq!(req.raw_arguments["window"], json!(10));
    }

    #[tokio::test]
    async fn test_invoke_price() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .withf(|ticker, days| ticker == "AAPL" && *days == 365)
            .times(1)
            .returning(|ticker, _| Ok(series(ticker, 30)));

        let outcome = dispatcher_with(source)
            .resolve_and_invoke(&request("get_stock_price", json!({"ticker": "aapl"})))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Indicator(IndicatorResult::Price { value: 129.0 })
        );
    }

    #[tokio::test]
    async fn test_invoke_sma() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .returning(|ticker, _| Ok(series(ticker, 30)));

        let outcome = dispatcher_with(source)
            .resolve_and_invoke(&request("calculate_SMA", json!({"ticker": "AAPL", "window": 10})))
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Indicator(IndicatorResult::Sma { window, value }) => {
                assert_eq!(window, 10);
                assert!((value - 124.5).abs() < 1e-9);
            }
            other => panic!("Expected SMA, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_sma_insufficient_data() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .returning(|ticker, _| Ok(series(ticker, 30)));

        let err = dispatcher_with(source)
            .resolve_and_invoke(&request("calculate_SMA", json!({"ticker": "AAPL", "window": 300})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChatError::InsufficientData {
                required: 300,
                available: 30
            }
        ));
    }

    #[tokio::test]
    async fn test_invoke_ema_insufficient_data() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .times(1)
            .returning(|ticker, _| Ok(series(ticker, 30)));

        let err = dispatcher_with(source)
            .resolve_and_invoke(&request("calculate_EMA", json!({"ticker": "AAPL", "window": 31})))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChatError::InsufficientData {
                required: 31,
                available: 30
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_function_never_fetches() {
        let mut source = MockPriceSource::new();
        source.expect_fetch_daily_closes().never();

        let err = dispatcher_with(source)
            .resolve_and_invoke(&request("get_weather", json!({"ticker": "AAPL"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownFunction(_)));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .returning(|ticker, _| Err(ChatError::data_unavailable(ticker, "delisted")));

        let err = dispatcher_with(source)
            .resolve_and_invoke(&request("calculate_MACD", json!({"ticker": "ZZZZ"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::DataUnavailable { ticker, .. } if ticker == "ZZZZ"));
    }

    #[tokio::test]
    async fn test_empty_series_is_data_unavailable() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .returning(|ticker, _| Ok(PriceSeries::new(ticker, Vec::new())));

        let err = dispatcher_with(source)
            .resolve_and_invoke(&request("get_stock_price", json!({"ticker": "NEW"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_invoke_chart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock.svg");

        let mut source = MockPriceSource::new();
        source
            .expect_fetch_daily_closes()
            .returning(|ticker, _| Ok(series(ticker, 50)));

        let dispatcher = Dispatcher::new(Arc::new(source), ChartRenderer::new(&path));
        let outcome = dispatcher
            .resolve_and_invoke(&request("plot_stock_price", json!({"ticker": "TSLA"})))
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Chart(artifact) => {
                assert_eq!(artifact.path, path);
                assert_eq!(artifact.ticker, "TSLA");
                assert!(path.exists());
            }
            other => panic!("Expected chart, got {other:?}"),
        }
    }

    struct SlowSource;

    #[async_trait]
    impl PriceSource for SlowSource {
        async fn fetch_daily_closes(&self, ticker: &str, _lookback_days: u32) -> Result<PriceSeries> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(series(ticker, 30))
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let dispatcher = Dispatcher::new(Arc::new(SlowSource), ChartRenderer::new("unused.svg"))
            .with_timeout(Duration::from_millis(20));

        let err = dispatcher
            .resolve_and_invoke(&request("calculate_RSI", json!({"ticker": "AAPL"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::DataUnavailable { .. }));
    }
}
