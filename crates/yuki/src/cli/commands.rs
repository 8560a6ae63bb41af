//! CLI command definitions.

use clap::{Parser, Subcommand};

/// System instructions used when `--system` is not given.
pub const DEFAULT_SYSTEM: &str = "You are Yuki, a warm and attentive companion. \
Keep replies short and readable, and answer in plain text.";

/// Yuki - conversational gateway for a local inference server
#[derive(Parser, Debug)]
#[command(name = "yuki")]
#[command(about = "Conversational gateway for a local inference server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the inference server is reachable
    Health,

    /// Send one message and record the exchange
    Chat {
        /// Session id (a new one is generated when omitted)
        #[arg(long)]
        session: Option<String>,

        /// Print the reply as it streams in
        #[arg(long)]
        stream: bool,

        /// System instructions for the model
        #[arg(long, default_value = DEFAULT_SYSTEM)]
        system: String,

        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show a session's stored messages
    History {
        /// Session id
        #[arg(long)]
        session: String,

        /// Maximum number of messages to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show a session's state
    State {
        /// Session id
        #[arg(long)]
        session: String,
    },
}
