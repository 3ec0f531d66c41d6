//! Stock chat CLI
//!
//! An interactive command-line chat about stock tickers.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! # Optional: any OpenAI-compatible server
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//!
//! cargo run --bin stockchat -p stockchat
//! cargo run --bin stockchat -p stockchat -- --ask "What's the RSI of NVDA?"
//! ```

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stockchat::bot::{BotConfig, BotReply, StockBot};
use stockchat::{ChatConfig, ChatOrchestrator, YahooFinanceClient};
use stockchat_llm::providers::{OpenAIConfig, OpenAIProvider};
use stockchat_utils::{AppConfig, LogFormat, init_tracing_with};
use tracing::info;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Parser, Debug)]
#[command(name = "stockchat")]
#[command(about = "Ask questions about stock tickers; a language model picks the indicator", long_about = None)]
struct Args {
    /// Model name (falls back to OPENAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL (falls back to OPENAI_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Where the chart is written (falls back to STOCKCHAT_CHART_PATH)
    #[arg(long)]
    chart_path: Option<PathBuf>,

    /// Timeout in seconds for each model or price request
    #[arg(long)]
    timeout: Option<u64>,

    /// Days of price history to fetch
    #[arg(long)]
    lookback_days: Option<u32>,

    /// System prompt sent with every request
    #[arg(long)]
    system: Option<String>,

    /// Ask a single question and exit
    #[arg(short, long)]
    ask: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn print_banner() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║              Stock Analysis Chatbot Assistant                ║
║                                                              ║
║  Ask in natural language:                                    ║
║    "What's the price of AAPL?"                               ║
║    "Calculate the 20 day EMA for MSFT"                       ║
║    "Show me TSLA's chart"                                    ║
║                                                              ║
║  Commands:                                                   ║
║    /help     - Show help                                     ║
║    /history  - Show the conversation                         ║
║    /reset    - Start over                                    ║
║    /exit     - Exit                                          ║
╚══════════════════════════════════════════════════════════════╝
"#
    );
}

fn chat_config(args: &Args) -> anyhow::Result<ChatConfig> {
    let mut builder = ChatConfig::builder();
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(path) = &args.chart_path {
        builder = builder.chart_path(path);
    }
    if let Some(secs) = args.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(days) = args.lookback_days {
        builder = builder.lookback_days(days);
    }
    if let Some(system) = &args.system {
        builder = builder.system_prompt(system);
    }
    Ok(builder.with_env()?.build()?)
}

fn provider_config(args: &Args) -> OpenAIConfig {
    let api_base = args
        .api_base
        .clone()
        .or_else(|| std::env::var("OPENAI_API_BASE").ok())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    // Local OpenAI-compatible servers accept any key
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "not-needed".to_string());

    OpenAIConfig::new(api_key).with_api_base(api_base)
}

fn show(reply: &BotReply) {
    match reply {
        BotReply::Message(text) => println!("{text}\n"),
        BotReply::Chart(path) => println!("Chart written to {}\n", path.display()),
        BotReply::Exit => println!("Goodbye!"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let app = AppConfig::from_env()?;
    let log_format = if args.json_logs {
        LogFormat::Json
    } else {
        app.log_format
    };
    init_tracing_with(log_format);

    let config = chat_config(&args)?;
    let openai_config = provider_config(&args);

    let api_base = openai_config.api_base.clone();
    let provider = Arc::new(OpenAIProvider::with_config(
        openai_config.with_timeout(config.request_timeout.as_secs().max(1)),
    )?);
    let source = Arc::new(YahooFinanceClient::new());
    let orchestrator = ChatOrchestrator::new(provider, source, config);

    info!(
        app = %app.app_name,
        environment = %app.environment,
        provider = orchestrator.provider_name(),
        api_base = %api_base,
        model = %orchestrator.config().model,
        chart_path = %orchestrator.config().chart_path.display(),
        "Starting stockchat"
    );
    let mut bot = StockBot::new(orchestrator, BotConfig::default());

    if let Some(question) = args.ask {
        let reply = bot.process_input(&question).await?;
        show(&reply);
        return Ok(());
    }

    print_banner();
    println!("{}\n", bot.welcome());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", bot.prompt());
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match bot.process_input(input).await {
            Ok(BotReply::Exit) => {
                show(&BotReply::Exit);
                break;
            }
            Ok(reply) => show(&reply),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}
