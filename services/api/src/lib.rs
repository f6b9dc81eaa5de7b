mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use faculty_roles::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
