//! Yuki CLI binary.
//!
//! This binary drives the gateway from the command line:
//! - Probe the inference server
//! - Run a chat turn against a session, optionally streaming
//! - Inspect stored session history and state

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_chat, handle_health, handle_history, handle_state, session_or_new};
    use yuki::{Yuki, YukiConfig, init_telemetry};

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = YukiConfig::load()?;
    init_telemetry(&config.logging, cli.verbose)?;

    let yuki = Yuki::from_config(config)?;

    match cli.command {
        Commands::Health => {
            if !handle_health(&yuki).await? {
                std::process::exit(1);
            }
        }

        Commands::Chat {
            session,
            stream,
            system,
            text,
        } => {
            let session_id = session_or_new(session);
            if !handle_chat(&yuki, &session_id, &system, &text.join(" "), stream).await? {
                std::process::exit(2);
            }
        }

        Commands::History { session, limit } => {
            handle_history(&yuki, &session, limit).await?;
        }

        Commands::State { session } => {
            handle_state(&yuki, &session).await?;
        }
    }

    Ok(())
}
