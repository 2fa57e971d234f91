//! Interactive workspace chat client.
//!
//! Connects to a Huddle relay with a bearer token, joins a workspace, prints its
//! history and live messages, and sends the lines typed at the prompt. The
//! connection is re-established automatically when it drops.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-client -- --token alice-token --user-id alice --workspace ws-1
//! HUDDLE_TOKEN=bob-token HUDDLE_USER_ID=bob cargo run --bin huddle-client -- -w ws-1
//! ```

use std::time::Duration;

use clap::Parser;

use huddle_client::{
    config::ClientConfig,
    credential::{BearerToken, Credential},
    domain::{UserId, WorkspaceId},
    ui::run_client,
};
use huddle_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "huddle-client")]
#[command(about = "Real-time workspace chat client", long_about = None)]
struct Args {
    /// Bearer token presented to the relay
    #[arg(short = 't', long, env = "HUDDLE_TOKEN", hide_env_values = true)]
    token: String,

    /// Your user ID (typing events from this user are not shown)
    #[arg(short = 'i', long, env = "HUDDLE_USER_ID")]
    user_id: String,

    /// Workspace to join on start
    #[arg(short = 'w', long, env = "HUDDLE_WORKSPACE")]
    workspace: Option<String>,

    /// WebSocket endpoint of the relay
    #[arg(short = 'u', long, env = "HUDDLE_RELAY_URL", default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Base URL of the history endpoint
    #[arg(short = 'a', long, env = "HUDDLE_API_URL", default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Milliseconds before a silent remote typist is dropped (0 keeps them until typing-stop)
    #[arg(long, env = "HUDDLE_TYPING_TTL_MS", default_value_t = 5000)]
    typing_ttl_ms: u64,

    /// Give up after this many failed reconnection attempts (retries forever if unset)
    #[arg(long, env = "HUDDLE_MAX_RECONNECT_ATTEMPTS")]
    max_reconnect_attempts: Option<u32>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let user_id = match UserId::new(args.user_id) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::error!("Invalid user ID: {}", e);
            std::process::exit(1);
        }
    };
    let workspace = match args.workspace.map(WorkspaceId::new).transpose() {
        Ok(workspace) => workspace,
        Err(e) => {
            tracing::error!("Invalid workspace: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = ClientConfig::new(args.url, args.api_url);
    config.remote_typing_ttl = match args.typing_ttl_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };
    config.reconnect.max_attempts = args.max_reconnect_attempts;

    let credential = Credential::new(BearerToken::new(args.token), user_id);

    // Run the client
    if let Err(e) = run_client(config, credential, workspace).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
