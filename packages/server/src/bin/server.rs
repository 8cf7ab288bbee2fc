//! Taleweave lobby server.
//!
//! Hosts adventure lobbies over HTTP and WebSocket and runs the shared rounds
//! of each lobby.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin taleweave-server
//! cargo run --bin taleweave-server -- --host 0.0.0.0 --port 3000
//! OPENROUTER_API_KEY=... cargo run --bin taleweave-server -- --adventures adventures.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use taleweave_server::{
    domain::StoryGenerator,
    infrastructure::{
        adventure::JsonAdventureCatalog,
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryLobbyRepository,
        story::{
            OpenRouterStoryGenerator, ScriptedStoryGenerator,
            openrouter::{DEFAULT_OPENROUTER_BASE_URL, DEFAULT_OPENROUTER_MODEL},
        },
    },
    ui::{AppState, Server},
};
use taleweave_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "taleweave-server")]
#[command(about = "Lobby and round server for Taleweave adventures", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TALEWEAVE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TALEWEAVE_PORT", default_value = "8000")]
    port: u16,

    /// Adventures JSON file (the built-in catalog is used when omitted)
    #[arg(long, env = "TALEWEAVE_ADVENTURES")]
    adventures: Option<PathBuf>,

    /// Upper bound on a single outbound WebSocket send, in milliseconds
    #[arg(long, env = "TALEWEAVE_SEND_TIMEOUT_MS", default_value = "2000")]
    send_timeout_ms: u64,

    /// API key for the chat-completions story generator
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_api_key: Option<String>,

    /// Model used by the chat-completions story generator
    #[arg(long, env = "OPENROUTER_MODEL", default_value = DEFAULT_OPENROUTER_MODEL)]
    openrouter_model: String,

    /// Base URL of the chat-completions API
    #[arg(long, env = "OPENROUTER_BASE_URL", default_value = DEFAULT_OPENROUTER_BASE_URL)]
    openrouter_base_url: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn story_generator(args: &Args) -> Arc<dyn StoryGenerator> {
    match args.openrouter_api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(api_key) => {
            tracing::info!(
                "Story generator: {} via {}",
                args.openrouter_model,
                args.openrouter_base_url
            );
            Arc::new(OpenRouterStoryGenerator::new(
                &args.openrouter_base_url,
                api_key,
                &args.openrouter_model,
            ))
        }
        None => {
            tracing::info!("Story generator: scripted (no API key configured)");
            Arc::new(ScriptedStoryGenerator::new())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_CRATE_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Adventure catalog
    // 2. Repository and MessagePusher
    // 3. Story generator
    // 4. AppState (use cases)
    // 5. Server

    // 1. Load adventures
    let catalog = match &args.adventures {
        Some(path) => JsonAdventureCatalog::from_path(path),
        None => JsonAdventureCatalog::builtin(),
    };
    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to load adventures: {}", e);
            std::process::exit(1);
        }
    };
    if catalog.is_empty() {
        tracing::warn!("Adventure catalog is empty; no lobby can be created");
    }

    // 2. In-memory registry and WebSocket pusher
    let repository = Arc::new(InMemoryLobbyRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new(Duration::from_millis(
        args.send_timeout_ms,
    )));

    // 3. Story generator
    let story_generator = story_generator(&args);

    // 4. Wire use cases
    let state = AppState::new(
        repository,
        message_pusher,
        Arc::new(catalog),
        story_generator,
        Arc::new(SystemClock),
    );

    // 5. Run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
