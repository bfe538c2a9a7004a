use sessionctl::cli::Cli;
use sessionctl::commands;
use sessionctl::error::CliError;
use sessionctl::logger::initialize as LoggerInitialize;

use session_core::SessionConfig;
use session_core::SessionManager;
use session_core::storage::{FileCredentialStorage, PersistentCookieJar, detect_session_paths};

use std::fs::create_dir_all;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("sessionctl: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let paths = detect_session_paths()?;

    create_dir_all(&paths.log_dir).map_err(|e| {
        CliError::sessionctl(format!("Failed to create log directory: {e}"))
    })?;

    // Logger first so config loading is recorded
    LoggerInitialize(&paths.log_dir, cli.verbose)?;

    info!("sessionctl starting (paths from {})", paths.source);

    let config_dir = cli.config_dir.clone().unwrap_or(paths.config_dir);
    let config = SessionConfig::load_with_env(&config_dir)?;

    let storage = Arc::new(FileCredentialStorage::new(&paths.credentials_file));
    let cookie_jar = Arc::new(PersistentCookieJar::load(&paths.cookies_file));
    let manager = Arc::new(SessionManager::with_cookie_jar(
        &config, storage, cookie_jar,
    )?);

    commands::execute(&cli.command, manager).await
}
