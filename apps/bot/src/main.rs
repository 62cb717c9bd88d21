//! Link catalog bot: send a link in chat, pick a category, and the link is
//! prepended to a JSON catalog kept in a GitHub repository.

mod commands;
mod dispatch;
mod health;
mod shutdown;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
