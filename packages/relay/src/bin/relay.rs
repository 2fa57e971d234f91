//! Reference relay for Huddle workspaces.
//!
//! Accepts bearer-authenticated WebSocket connections, relays chat and typing
//! events within workspace rooms, and serves recent history over HTTP.
//!
//! Run with:
//! ```not_rust
//! HUDDLE_RELAY_TOKENS="alice-token=alice:Alice,bob-token=bob:Bob" cargo run --bin huddle-relay
//! cargo run --bin huddle-relay -- --host 0.0.0.0 --port 3000 --tokens "t=alice:Alice"
//! ```

use std::sync::Arc;

use clap::Parser;

use huddle_relay::{
    auth::TokenTable, error::RelayError, infrastructure::repository::inmemory::DEFAULT_HISTORY_CAPACITY,
    ui::Server,
};
use huddle_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "huddle-relay")]
#[command(about = "Workspace chat relay over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the relay to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the relay to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Accepted tokens as comma-separated `token=userId:userName` entries
    #[arg(short = 't', long, env = "HUDDLE_RELAY_TOKENS", hide_env_values = true)]
    tokens: String,

    /// Messages kept per workspace
    #[arg(long, env = "HUDDLE_HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,
}

async fn run(args: Args) -> Result<(), RelayError> {
    let tokens: TokenTable = args.tokens.parse()?;
    if tokens.is_empty() {
        return Err(RelayError::Config("no tokens configured".to_string()));
    }
    if args.history_capacity == 0 {
        return Err(RelayError::Config(
            "history capacity must be at least 1".to_string(),
        ));
    }
    tracing::info!(
        "{} token(s) loaded, keeping {} message(s) per workspace",
        tokens.len(),
        args.history_capacity
    );

    let server = Server::in_memory(tokens, args.history_capacity, Arc::new(SystemClock));
    server.run(&args.host, args.port).await
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Relay error: {}", e);
        std::process::exit(1);
    }
}
