//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default address of a locally running server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Parley - a small chat server in front of the Gemini API
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat server
    Serve {
        /// Config file (defaults to ~/.parley/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },

    /// Send a message and print the reply
    Send {
        #[command(flatten)]
        target: Target,

        /// Message to send
        #[arg(trailing_var_arg = true, required = true)]
        message: Vec<String>,
    },

    /// Show the conversation history
    History {
        #[command(flatten)]
        target: Target,
    },

    /// Clear the conversation history
    Reset {
        #[command(flatten)]
        target: Target,
    },

    /// Ask the server for a new session and use it from now on
    NewSession {
        /// Server base URL
        #[arg(long, env = "PARLEY_URL", default_value = DEFAULT_SERVER_URL)]
        url: String,
    },
}

/// Which server and session a client command talks to.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Server base URL
    #[arg(long, env = "PARLEY_URL", default_value = DEFAULT_SERVER_URL)]
    pub url: String,

    /// Session ID (defaults to the one stored in ~/.parley/session)
    #[arg(short, long)]
    pub session: Option<String>,
}
