//! CLI command implementations
//!
//! - init: write a default configuration and create the data directory
//! - serve: open the database and serve the HTTP API until Ctrl-C

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::http_server::HttpServer;
use crate::store::{BookStore, Database, StoreBackend};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Write the default configuration to `config_path`
///
/// Refuses to overwrite an existing file. The data directory is placed
/// beside the config file (`./data` for the default `./books.json`) and
/// created when the file backend is configured.
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path.display()));
    }

    let mut config = Config::default();
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
            config.store.data_dir = parent.join("data");
        }
    }

    config.save(config_path)?;

    if config.store.backend == StoreBackend::File {
        fs::create_dir_all(&config.store.data_dir)?;
    }

    println!("Wrote {}", config_path.display());
    Ok(())
}

/// Serve the HTTP API described by `config_path`
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(&config.log_filter);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(serve_async(config))
}

async fn serve_async(config: Config) -> CliResult<()> {
    let database = Database::open(&config.store)
        .map_err(|e| CliError::serve_failed(format!("Failed to open database: {}", e)))?;
    let store = BookStore::open(&database)
        .map_err(|e| CliError::serve_failed(format!("Failed to open collection: {}", e)))?;

    let server = HttpServer::new(config.server.clone(), store);
    let result = server.start(shutdown_signal()).await;

    database.close();

    result.map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
}

/// Install the fmt subscriber. RUST_LOG takes precedence over `log_filter`.
fn init_tracing(log_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter));

    // Already installed when called twice in one process
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "failed to listen for ctrl-c, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/books.json");

        init(&path).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server, Config::default().server);
        assert_eq!(config.store.data_dir, dir.path().join("conf/data"));
        assert!(config.store.data_dir.is_dir());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "{}").unwrap();

        let err = init(&path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_serve_without_config_fails() {
        let dir = TempDir::new().unwrap();
        let err = serve(&dir.path().join("missing.json"), None).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
