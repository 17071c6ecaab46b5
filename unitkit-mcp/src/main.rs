//! unitkit MCP Server
//!
//! Line-delimited JSON-RPC over stdio. Logs go to stderr; stdout carries
//! only protocol frames.
//!
//! Tools:
//! - convert: Convert a value between two units
//! - list_categories / list_units: Discover category ids and unit codes
//! - history / clear_history: Recent successful conversions
//! - favorites / add_favorite / remove_favorite: Saved unit pairs
//! - help: Function documentation

mod config;
mod server;

use std::io::{self, BufRead, IsTerminal, Write};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use unitkit_history::{ConverterSession, FileStore};

use crate::config::Config;
use crate::server::{Server, PROTOCOL_VERSION};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let config = Config::from_env();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        protocol = PROTOCOL_VERSION,
        data_path = %config.data_path.display(),
        history_limit = config.history_limit,
        decimals = config.decimals,
        "unitkit MCP server started"
    );

    let store = FileStore::new(config.data_path.clone());
    let session = ConverterSession::load(store, config.history_limit).with_decimals(config.decimals);
    let mut server = Server::new(session);

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    info!("server ready, waiting for requests");

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("client disconnected (EOF)");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!(bytes = line.len(), "received");

                let Some(response) = server.handle_line(line) else {
                    continue;
                };

                let mut stdout = io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{}", response) {
                    error!(error = %e, "failed to write response");
                    break;
                }
                if let Err(e) = stdout.flush() {
                    error!(error = %e, "failed to flush stdout");
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    info!("server shutting down");
}
