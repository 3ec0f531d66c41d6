//! The fixed set of functions the model may call
//!
//! [`FunctionId`] is the single source of truth: the static [`CATALOG`]
//! declares one [`FunctionSpec`] per variant, and the dispatcher matches on
//! the same enum, so a declared function without an implementation (or the
//! reverse) does not compile.

use serde::Serialize;
use serde_json::{Map, Value};
use stockchat_llm::FunctionDefinition;
use stockchat_llm::functions::schema;

/// Identifier of a callable function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionId {
    #[serde(rename = "get_stock_price")]
    GetStockPrice,
    #[serde(rename = "calculate_SMA")]
    CalculateSma,
    #[serde(rename = "calculate_EMA")]
    CalculateEma,
    #[serde(rename = "calculate_RSI")]
    CalculateRsi,
    #[serde(rename = "calculate_MACD")]
    CalculateMacd,
    #[serde(rename = "plot_stock_price")]
    PlotStockPrice,
}

/// Argument shape of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    TickerOnly,
    TickerAndWindow,
}

impl FunctionId {
    /// Every function, in catalog order
    pub const ALL: [FunctionId; 6] = [
        FunctionId::GetStockPrice,
        FunctionId::CalculateSma,
        FunctionId::CalculateEma,
        FunctionId::CalculateRsi,
        FunctionId::CalculateMacd,
        FunctionId::PlotStockPrice,
    ];

    /// Wire name the model uses
    pub fn name(self) -> &'static str {
        match self {
            FunctionId::GetStockPrice => "get_stock_price",
            FunctionId::CalculateSma => "calculate_SMA",
            FunctionId::CalculateEma => "calculate_EMA",
            FunctionId::CalculateRsi => "calculate_RSI",
            FunctionId::CalculateMacd => "calculate_MACD",
            FunctionId::PlotStockPrice => "plot_stock_price",
        }
    }

    /// Exact, case-sensitive lookup by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            FunctionId::CalculateSma | FunctionId::CalculateEma => Arity::TickerAndWindow,
            FunctionId::GetStockPrice
            | FunctionId::CalculateRsi
            | FunctionId::CalculateMacd
            | FunctionId::PlotStockPrice => Arity::TickerOnly,
        }
    }

    /// Catalog entry for this function
    pub fn spec(self) -> &'static FunctionSpec {
        &CATALOG[self as usize]
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
}

/// One declared parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
}

/// Declarative description of one callable function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    #[serde(rename = "name")]
    pub id: FunctionId,
    pub description: &'static str,
    pub parameters: &'static [ParamSpec],
}

impl FunctionSpec {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// JSON schema of the parameter object
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                let property = match p.kind {
                    ParamType::String => schema::string(p.description),
                    ParamType::Integer => schema::integer(p.description),
                };
                (p.name.to_string(), property)
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        schema::object(Value::Object(properties), &required)
    }

    /// Definition handed to the model
    pub fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::new(self.name(), self.description, self.parameters_schema())
    }
}

const TICKER: ParamSpec = ParamSpec {
    name: "ticker",
    kind: ParamType::String,
    description: "The ticker symbol of the company (for example, AAPL for Apple)",
    required: true,
};

const TICKER_ONLY: &[ParamSpec] = &[TICKER];

const TICKER_AND_SMA_WINDOW: &[ParamSpec] = &[
    TICKER,
    ParamSpec {
        name: "window",
        kind: ParamType::Integer,
        description: "The window size of the SMA",
        required: true,
    },
];

const TICKER_AND_EMA_WINDOW: &[ParamSpec] = &[
    TICKER,
    ParamSpec {
        name: "window",
        kind: ParamType::Integer,
        description: "The window size of the EMA",
        required: true,
    },
];

/// Catalog entries, indexed by `FunctionId as usize`
pub static CATALOG: [FunctionSpec; 6] = [
    FunctionSpec {
        id: FunctionId::GetStockPrice,
        description: "Get the current stock price of a company given its ticker symbol",
        parameters: TICKER_ONLY,
    },
    FunctionSpec {
        id: FunctionId::CalculateSma,
        description: "Calculate the Simple Moving Average of a company given its ticker symbol and window size",
        parameters: TICKER_AND_SMA_WINDOW,
    },
    FunctionSpec {
        id: FunctionId::CalculateEma,
        description: "Calculate the Exponential Moving Average of a company given its ticker symbol and window size",
        parameters: TICKER_AND_EMA_WINDOW,
    },
    FunctionSpec {
        id: FunctionId::CalculateRsi,
        description: "Calculate the Relative Strength Index of a company given its ticker symbol",
        parameters: TICKER_ONLY,
    },
    FunctionSpec {
        id: FunctionId::CalculateMacd,
        description: "Calculate the Moving Average Convergence Divergence of a company given its ticker symbol",
        parameters: TICKER_ONLY,
    },
    FunctionSpec {
        id: FunctionId::PlotStockPrice,
        description: "Plot the stock price of a company given its ticker symbol",
        parameters: TICKER_ONLY,
    },
];

/// Read-only view over [`CATALOG`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionCatalog;

impl FunctionCatalog {
    pub fn specs(&self) -> &'static [FunctionSpec] {
        &CATALOG
    }

    /// Definitions for the model request
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        CATALOG.iter().map(FunctionSpec::definition).collect()
    }
}
