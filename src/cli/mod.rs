//! CLI module for Conductor
//!
//! Provides commands:
//! - `serve`: Start the HTTP server
//! - `run`: Submit one task to an in-process engine and print the result
//! - `skills`: List the skill catalog

use clap::{Parser, Subcommand};

pub mod run;
pub mod skills;

/// Conductor orchestration engine CLI
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(about = "Task orchestration engine with routing, fallback and approval gates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Run a single task in-process and print the result as JSON
    Run(run::RunArgs),
    /// List the skill catalog
    Skills,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Run(args)) => run::run(args).await,
        Some(Commands::Skills) => skills::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
