//! relay CLI: run the bots or check a config file.

use anyhow::Result;
use assistant_client::mask_token;
use clap::Parser;
use relay_bot::cli::{Cli, Commands};
use relay_bot::{run, RelayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, log_file } => run(&config, &log_file).await,
        Commands::Check { config } => {
            let loaded = RelayConfig::load(&config)?;
            println!("Config OK: {}", config.display());
            println!("Assistant: {}", loaded.assistant_id);
            println!("Manager token: {}", mask_token(&loaded.manager_bot_token));
            for bot in &loaded.bot_tokens {
                println!("- {} ({})", bot.name, mask_token(&bot.token));
            }
            Ok(())
        }
    }
}
