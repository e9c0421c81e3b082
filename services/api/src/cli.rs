use crate::server;
use clap::{Args, Parser, Subcommand};
use staycheck::error::ApiError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "StayCheck",
    about = "Run the StayCheck rental inspection service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured directory for uploaded photos
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
    }
}
