use std::{env, path::PathBuf, str::FromStr, time::Duration};

use tracing::warn;

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}", name, value);
            default
        }),
        Err(_) => default,
    }
}

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` keeps scores in memory only.
    pub scores_file: Option<PathBuf>,
    pub cors_allowed_origins: Vec<String>,
    pub games_per_minute: u32,
    pub cleanup_interval: Duration,
    pub inactive_timeout: Duration,
    pub finished_timeout: Duration,
    pub max_board_cells: usize,
    pub score_write_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scores_file: Some(PathBuf::from("scores.json")),
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            games_per_minute: 10,
            cleanup_interval: Duration::from_secs(60),
            inactive_timeout: Duration::from_secs(600),
            finished_timeout: Duration::from_secs(120),
            max_board_cells: 10_000,
            score_write_attempts: 3,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let scores_file = match env::var("SCORES_FILE") {
            Ok(path) if path.is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => defaults.scores_file,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allowed_origins);

        Self {
            scores_file,
            cors_allowed_origins,
            games_per_minute: env_or("RATE_LIMIT_GAMES_PER_MINUTE", defaults.games_per_minute),
            cleanup_interval: Duration::from_secs(env_or(
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval.as_secs(),
            )),
            inactive_timeout: Duration::from_secs(env_or(
                "INACTIVE_GAME_TIMEOUT_SECONDS",
                defaults.inactive_timeout.as_secs(),
            )),
            finished_timeout: Duration::from_secs(env_or(
                "FINISHED_GAME_TIMEOUT_SECONDS",
                defaults.finished_timeout.as_secs(),
            )),
            max_board_cells: env_or("MAX_BOARD_CELLS", defaults.max_board_cells),
            score_write_attempts: env_or("SCORE_WRITE_ATTEMPTS", defaults.score_write_attempts)
                .max(1),
        }
    }
}
