//! Parley - a chat server in front of the Gemini API.
//!
//! The server keeps per-session conversation history in memory and sends
//! the last few turns along with every new message.
//!
//! Architecture:
//! - `parley serve` runs the HTTP server and the bundled browser UI
//! - The other subcommands are thin clients that talk to the server via HTTP
//! - History lives only as long as the server process

mod chat;
mod cli;
mod config;
mod error;
mod gemini;
mod logging;
mod models;
mod server;
mod session;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    execute(cli).await
}
