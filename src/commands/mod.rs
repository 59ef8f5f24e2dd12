//! Command line interface.
//!
//! Each subcommand lives in its own module with a clap `Args` struct and a
//! `cmd` entry point.

pub mod init;
pub mod render;
pub mod sync;
pub mod task;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Create, list and edit tasks")]
    Task(task::TaskArgs),
    #[command(about = "Write the agenda file from the database")]
    Render(render::RenderArgs),
    #[command(about = "Reconcile the edited agenda file back into the database")]
    Sync(sync::SyncArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> anyhow::Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Task(args) => task::cmd(args).await,
            Commands::Render(args) => render::cmd(args).await,
            Commands::Sync(args) => sync::cmd(args).await,
        }
    }
}
