use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CellView, Outcome};

/// A move on a live session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Open,
    Flag,
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "flag" => Ok(Self::Flag),
            "exit" => Ok(Self::Exit),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Body of `POST /action`. Kept loose so bad coordinates and unknown
/// actions are reported as such instead of as a malformed body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionRequest {
    pub x: i64,
    pub y: i64,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub game_id: Option<String>,
    pub message: String,
    pub board: Vec<Vec<CellView>>,
    pub game_over: bool,
    pub is_won: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!("open".parse::<Action>(), Ok(Action::Open));
        assert_eq!("flag".parse::<Action>(), Ok(Action::Flag));
        assert_eq!("exit".parse::<Action>(), Ok(Action::Exit));
    }

    #[test]
    fn rejects_unknown_action_with_its_text() {
        assert_eq!(
            "dig".parse::<Action>(),
            Err(ParseActionError("dig".to_string()))
        );
        assert!("Open".parse::<Action>().is_err());
    }

    #[test]
    fn state_response_omits_missing_game_id() {
        let response = StateResponse {
            game_id: None,
            message: "Board updated.".to_string(),
            board: vec![vec![CellView::Hidden]],
            game_over: false,
            is_won: false,
            outcome: Outcome::InProgress,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("game_id").is_none());
        assert_eq!(value["board"][0][0], "#");
        assert_eq!(value["outcome"], "in_progress");
    }
}
