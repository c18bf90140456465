//! Interactive CLI client for the Kairo event room server.
//!
//! Connects to the server, prints incoming events and sends typed lines.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kairo-client
//! cargo run --bin kairo-client -- --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use kairo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kairo-client")]
#[command(about = "Interactive client for the Kairo event room server", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = kairo_client::run_client(args.url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
