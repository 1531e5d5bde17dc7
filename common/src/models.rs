use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a client is allowed to see of a single cell.
///
/// Serialized as a one-character glyph: `F` flagged, `#` hidden, `*` a
/// revealed mine, `1`..`8` a revealed cell with that many adjacent mines and
/// a space for a revealed cell with none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum CellView {
    Flagged,
    Hidden,
    Mine,
    Revealed { adjacent: u8 },
}

impl CellView {
    pub fn glyph(self) -> char {
        match self {
            Self::Flagged => 'F',
            Self::Hidden => '#',
            Self::Mine => '*',
            Self::Revealed { adjacent: 0 } => ' ',
            Self::Revealed { adjacent } => char::from(b'0' + adjacent.min(8)),
        }
    }
}

impl From<CellView> for char {
    fn from(value: CellView) -> Self {
        value.glyph()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown cell glyph {0:?}")]
pub struct UnknownGlyph(pub char);

impl TryFrom<char> for CellView {
    type Error = UnknownGlyph;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'F' => Ok(Self::Flagged),
            '#' => Ok(Self::Hidden),
            '*' => Ok(Self::Mine),
            ' ' => Ok(Self::Revealed { adjacent: 0 }),
            '1'..='8' => Ok(Self::Revealed {
                adjacent: value as u8 - b'0',
            }),
            other => Err(UnknownGlyph(other)),
        }
    }
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Board coordinate: `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameParams {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            mines: 4,
        }
    }
}

/// Lifecycle status of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
    Exited,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// How a finished session is scored. `None` while still in progress.
    pub fn score(self) -> Option<ScoreOutcome> {
        match self {
            Self::InProgress => None,
            Self::Won => Some(ScoreOutcome::Win),
            Self::Lost | Self::Exited => Some(ScoreOutcome::Lose),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOutcome {
    Win,
    Lose,
}

/// Durable summary of one finished session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "username")]
    pub player_name: String,
    #[serde(rename = "status")]
    pub outcome: ScoreOutcome,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    pub board_size: String,
}
