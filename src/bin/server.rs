//! Relay server for the sign-language video chat.
//!
//! Serves the pair-scoped chat and video relays, the shared prediction
//! endpoint and identity issuance. Runs without a prediction model by
//! default; the prediction endpoint then reports the model unavailable.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --port 9000
//! ```

use clap::Parser;

use shuwa::common::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Relay server for sign-language video chat sessions", long_about = None)]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind to
    #[arg(short = 'p', long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = shuwa::server::run_server(args.host, args.port, None).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
