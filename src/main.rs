use clap::Parser;
use tracing::{error, info, warn};

use mechdept::web::{AppState, WebServer};
use mechdept::{Config, Database};

#[derive(Debug, Parser)]
#[command(name = "mechdept", version, about = "Mechanical Department backend", long_about = None)]
struct StartArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = StartArgs::parse();

    let config = match Config::load_with_env(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config);
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = mechdept::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        mechdept::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    info!("Mechanical Department backend");
    if config.auth.elevated_secret.trim().is_empty() {
        warn!("No elevated secret configured; teacher registration and login are disabled");
    }
    if config.chat.api_key.is_empty() {
        warn!("No chat API key configured; /api/chat will answer 503");
    }

    let db = match Database::open(&config.database.url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(db, &config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize chat proxy: {e}");
            std::process::exit(1);
        }
    };

    let server = match WebServer::from_config(&config, state) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!("Server configured on {}", server.addr());
    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        std::process::exit(1);
    }
}
