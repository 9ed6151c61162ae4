//! sessiongate - command-line front end for the session guard.
//!
//! Stands in for the routing layer and login form of a single-page app:
//! it logs in against the backend, keeps the token cookie in the cache
//! directory and runs the navigation guard for requested routes.

mod app;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use sessiongate_core::Config;

const USAGE: &str = "\
Usage: sessiongate <command>

Commands:
  login [email]     Log in against the configured backend
  logout            Clear the session and its cookie
  navigate <path>   Run the navigation guard for a route
  status            Show the current session";

/// Log file name, rotated daily in the cache directory
const LOG_FILE: &str = "sessiongate.log";

/// Initialize the tracing subscriber for logging
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load()?;
    config.apply_env();

    let _log_guard = init_tracing(&config);
    info!(backend = %config.backend_url, "sessiongate starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut app = App::new(config)?;

    match args.first().map(String::as_str) {
        Some("login") => app.login(args.get(1).cloned()).await?,
        Some("logout") => app.logout(),
        Some("navigate") => match args.get(1) {
            Some(path) => app.navigate(path.clone()),
            None => eprintln!("{}", USAGE),
        },
        Some("status") => app.status(),
        _ => eprintln!("{}", USAGE),
    }

    Ok(())
}
