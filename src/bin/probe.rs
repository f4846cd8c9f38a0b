//! Inspect the upstream chat API: check the key and browse the model catalog.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use mechdept::chat::{free_models, models_matching, ModelCatalog};
use mechdept::config::sanitize_api_key;
use mechdept::Config;

#[derive(Debug, Parser)]
#[command(name = "probe", version, about = "Inspect the upstream chat API", long_about = None)]
struct CliArgs {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[clap(subcommand)]
    command: Execute,
}

#[derive(Debug, Subcommand)]
enum Execute {
    /// Check the API key against the upstream.
    Verify,
    /// List model identifiers.
    Models(ModelsArgs),
    /// Show how the API key was loaded, without revealing it.
    KeyReport,
}

#[derive(Debug, Args, Default, Clone)]
struct ModelsArgs {
    /// Only free-tier models.
    #[arg(long)]
    free: bool,

    /// Only models whose identifier contains this text (case-insensitive).
    #[arg(long, short)]
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    mechdept::logging::init_console_only("warn");

    let args = CliArgs::parse();
    let config = match Config::load_with_env(&args.config) {
        Ok(config) => config,
        Err(e) => {
            debug!("Config not loaded ({e}), using defaults");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    match args.command {
        Execute::KeyReport => {
            key_report();
            ExitCode::SUCCESS
        }
        Execute::Verify => verify(&config).await,
        Execute::Models(models) => list(&config, &models).await,
    }
}

fn key_report() {
    let Ok(raw) = std::env::var("OPENROUTER_API_KEY") else {
        println!("OPENROUTER_API_KEY is not set");
        return;
    };

    let clean = sanitize_api_key(&raw);
    println!("raw length:       {}", raw.len());
    println!("sanitized length: {}", clean.len());
    println!("had quotes:       {}", raw.contains(['"', '\'']));
    println!("had whitespace:   {}", raw.trim() != raw);
    let chars: Vec<char> = clean.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        println!("key:              {head}...{tail}");
    }
}

async fn verify(config: &Config) -> ExitCode {
    if config.chat.api_key.is_empty() {
        eprintln!("No API key configured");
        return ExitCode::FAILURE;
    }

    let catalog = match ModelCatalog::from_config(&config.chat) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match catalog.verify_key().await {
        Ok(status) => {
            println!("status: {}", status.status);
            match serde_json::to_string_pretty(&status.body) {
                Ok(body) => println!("{body}"),
                Err(e) => eprintln!("failed to render response: {e}"),
            }
            if status.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn list(config: &Config, args: &ModelsArgs) -> ExitCode {
    let catalog = match ModelCatalog::from_config(&config.chat) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut ids = match catalog.list_models().await {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.free {
        ids = free_models(&ids);
    }
    if let Some(needle) = &args.filter {
        ids = models_matching(&ids, needle);
    }

    for id in &ids {
        println!("{id}");
    }
    eprintln!("{} models", ids.len());

    ExitCode::SUCCESS
}
