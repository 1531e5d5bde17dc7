use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Game not found")]
    NotFound,
    #[error("Invalid coordinates ({x}, {y})")]
    InvalidCoordinates { x: i64, y: i64 },
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Invalid board {width}x{height} with {mines} mines: {reason}")]
    InvalidBoard {
        width: usize,
        height: usize,
        mines: usize,
        reason: &'static str,
    },
    #[error("Invalid board {name}: {value:?} is not a non-negative integer")]
    InvalidBoardParameter { name: &'static str, value: String },
    #[error("Game already over, no new moves are accepted")]
    GameOver,
    #[error("Score store failed: {0}")]
    ScorePersistence(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("score file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("score file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("score store lock poisoned")]
    Poisoned,
    #[error("score store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, GameError>;
