//! FxQuote CLI
//!
//! Command-line currency converter on top of the fxquote engine.

use clap::Parser;
use fxquote_fx::{FxEngine, FxEngineConfig};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

/// FxQuote CLI
#[derive(Parser, Debug)]
#[command(name = "fxquote")]
#[command(about = "Convert an amount between two currencies at the current rate")]
struct Args {
    /// Amount to convert
    #[arg(allow_negative_numbers = true)]
    amount: f64,

    /// Currency to convert from (e.g. EUR)
    from: String,

    /// Currency to convert to (e.g. USD)
    to: String,

    /// Days of history to attach
    #[arg(long)]
    history_days: Option<u32>,

    /// Skip the history and trend lookup
    #[arg(long)]
    no_history: bool,

    /// Print the quote as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let plain_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    // Load configuration
    let mut config = FxEngineConfig::from_env();
    if let Some(days) = args.history_days {
        config.history_window_days = days;
    }
    if args.no_history {
        config.history_enabled = false;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let engine = FxEngine::from_config(&config)?;
    debug!(providers = ?engine.provider_ids(), "Engine ready");

    match engine.quote(args.amount, &args.from, &args.to).await {
        Ok(quote) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                print!("{}", render::render_quote(&quote));
            }
            Ok(())
        }
        Err(e) => {
            error!(code = e.error_code(), error = %e, "Quote failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
