//! `storedesk`: terminal front end for the users console.

mod cli;
mod commands;
mod context;
mod output;
mod timing;

use anyhow::Result;
use clap::Parser as _;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::context::{build_state_ctx, resolve_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    timing::init_tracing(cli.verbose, cli.timing);

    match cli.command {
        Commands::Completions { shell } => {
            commands::generate_completions(shell);
            Ok(())
        }
        Commands::Users(command) => {
            let config = resolve_config(cli.api_url, cli.token)?;
            let mut ctx = build_state_ctx(config);
            let result = commands::run_users(&mut ctx, command).await;
            ctx.shutdown().await;
            debug!("Shut down state context");
            result
        }
    }
}
