//! Minesweeper game sessions over HTTP.
//!
//! The engine lives in [`data`] and [`logic`]; [`session`] and [`registry`]
//! track games from start to outcome and hand finished games to a
//! [`scores::ScoreRecorder`]. Everything else is the rocket server around it.

use std::sync::Arc;

use rocket::{Build, Rocket, catchers, routes};
use tracing::info;

pub mod cleanup;
pub mod config;
pub mod cors;
pub mod data;
pub mod error;
pub mod logic;
pub mod rate_limit;
pub mod registry;
pub mod routes;
pub mod scores;
pub mod session;

use crate::{
    cleanup::CleanupFairing, config::Settings, cors::create_cors, rate_limit::RateLimiter,
    registry::SessionRegistry,
};

/// Assembles the server: shared registry, rate limiter, CORS, cleanup task
/// and routes.
pub fn build_rocket(settings: Settings) -> Result<Rocket<Build>, rocket_cors::Error> {
    let registry = Arc::new(SessionRegistry::from_settings(&settings));
    let rate_limiter = RateLimiter::new(settings.games_per_minute);
    let cors = create_cors(&settings.cors_allowed_origins)?;

    info!("Initialized session registry and rate limiter");

    Ok(rocket::build()
        .attach(cors)
        .attach(CleanupFairing {
            interval: settings.cleanup_interval,
            inactive_timeout: settings.inactive_timeout,
            finished_timeout: settings.finished_timeout,
        })
        .manage(registry)
        .manage(rate_limiter)
        .mount(
            "/",
            routes![
                routes::start_game,
                routes::get_board,
                routes::action,
                routes::scores
            ],
        )
        .register("/", catchers![routes::default_catcher]))
}
