//! TalkToDB - question-to-SQL relay with a confirmation gate.

use std::sync::Arc;

use talktodb::cli::{Cli, Command};
use talktodb::config::Config;
use talktodb::error::{RelayError, Result};
use talktodb::llm::{create_generator, GeminiClient, GeminiConfig};
use talktodb::query::{GateDecision, GatePolicy, QueryGate};
use talktodb::server::{self, AppState};
use talktodb::{db, logging};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => error!("Ignoring unreadable .env file: {}", e),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::ListModels => list_models(&config).await,
        Command::CheckSql { sql, confirm } => check_sql(&sql, confirm),
    }
}

/// Builds the configuration with precedence file < environment < CLI.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config)?;

    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    let database = db::connect(&config.database)?;
    let gate = QueryGate::new(Arc::from(database));
    let generator = create_generator(&config.llm)?;

    server::serve(AppState::new(Arc::new(config), gate, generator)).await
}

async fn list_models(config: &Config) -> Result<()> {
    let key = config
        .llm
        .api_key()
        .ok_or_else(|| RelayError::config("No API key configured. Set GEMINI_API_KEY."))?;
    let client = GeminiClient::new(GeminiConfig::from_llm_config(&config.llm, key))?;

    for model in client.list_models().await? {
        println!("{model}");
    }

    Ok(())
}

fn check_sql(sql: &str, confirm: bool) -> Result<()> {
    match GatePolicy::new().decide(sql, confirm)? {
        GateDecision::Execute(kind) => println!("{kind}: would execute"),
        GateDecision::NeedsConfirmation(request) => {
            println!("{}: {}", request.query_type, request.message)
        }
    }
    Ok(())
}
