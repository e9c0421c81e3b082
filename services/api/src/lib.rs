mod cli;
mod infra;
mod routes;
mod server;

use staycheck::error::ApiError;

pub async fn run() -> Result<(), ApiError> {
    cli::run().await
}
