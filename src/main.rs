use clap::{Parser, Subcommand};

mod backend;
mod commands;
mod config;
mod conversation;
mod ui;

use config::Config;

#[derive(Parser)]
#[command(name = "superchat")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat for the SuperAgent backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file and SUPERAGENT_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the agent's reply
    Ask {
        /// The prompt to send
        prompt: Vec<String>,
    },
    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_overrides(std::env::var(config::BACKEND_URL_ENV).ok(), cli.backend_url);

    match cli.command {
        None => ui::app::run(config).await,
        Some(Commands::Ask { prompt }) => commands::ask(&config, &prompt.join(" ")).await,
        Some(Commands::Health) => commands::health(&config).await,
    }
}
