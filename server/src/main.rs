use std::error::Error;

use sweeper_server::{build_rocket, config::Settings};
use tracing::info;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    info!("Starting Minesweeper session server");

    let settings = Settings::from_env();
    info!("Loaded settings: {:?}", settings);

    let rocket = build_rocket(settings)?;
    info!("Endpoints: GET /start, GET /board, POST /action, GET /scores");

    rocket.launch().await?;
    Ok(())
}
