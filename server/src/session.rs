use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use sweeper_common::{
    models::{Outcome, Pos, ScoreRecord},
    protocol::{Action, StateResponse},
};

use crate::{
    data::Board,
    error::{GameError, Result},
};

pub type SessionId = String;

/// One game: a board owned by a single player, from start to outcome.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    board: Board,
    player_name: String,
    started_at: Instant,
    last_activity: Instant,
    outcome: Outcome,
    pending_score: Option<ScoreRecord>,
    retired: bool,
}

impl GameSession {
    /// Wraps a generated board.
    #[instrument(level = "trace", skip(board))]
    pub fn new(id: SessionId, player_name: String, board: Board) -> Self {
        info!(
            "Starting session {} for {}: {}x{} with {} mines",
            id,
            player_name,
            board.width(),
            board.height(),
            board.mine_count()
        );
        let now = Instant::now();
        Self {
            id,
            board,
            player_name,
            started_at: now,
            last_activity: now,
            outcome: Outcome::InProgress,
            pending_score: None,
            retired: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Maps request coordinates onto the board.
    pub fn position(&self, x: i64, y: i64) -> Result<Pos> {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) if self.board.contains(Pos { x, y }) => Ok(Pos { x, y }),
            _ => Err(GameError::InvalidCoordinates { x, y }),
        }
    }

    /// Applies a validated move. When the move ends the game, the outcome is
    /// fixed and a score record is queued for [`GameSession::take_pending_score`].
    ///
    /// Coordinates are checked for every action, including `Exit`.
    #[instrument(level = "trace", skip(self), fields(session_id = %self.id))]
    pub fn apply(&mut self, x: i64, y: i64, action: Action) -> Result<()> {
        let pos = self.position(x, y)?;

        if self.outcome.is_terminal() {
            debug!("Ignoring {:?} on finished session {}", action, self.id);
            return Err(GameError::GameOver);
        }

        self.last_activity = Instant::now();

        match action {
            Action::Open => {
                self.board.reveal(pos)?;
            }
            Action::Flag => {
                self.board.toggle_flag(pos)?;
            }
            Action::Exit => {
                info!("Player {} left session {}", self.player_name, self.id);
                self.board.abandon();
            }
        }

        if self.board.is_over() {
            self.finish(action);
        }

        Ok(())
    }

    fn finish(&mut self, action: Action) {
        self.outcome = if self.board.is_won() {
            Outcome::Won
        } else if action == Action::Exit {
            Outcome::Exited
        } else {
            Outcome::Lost
        };

        let Some(outcome) = self.outcome.score() else {
            return;
        };

        let duration = self.elapsed();
        info!(
            "Session {} finished as {:?} after {:.1}s",
            self.id,
            self.outcome,
            duration.as_secs_f64()
        );

        self.pending_score = Some(ScoreRecord {
            player_name: self.player_name.clone(),
            outcome,
            duration_seconds: duration.as_secs_f64(),
            board_size: self.board.board_size(),
        });
    }

    pub fn has_pending_score(&self) -> bool {
        self.pending_score.is_some()
    }

    pub fn pending_score(&self) -> Option<&ScoreRecord> {
        self.pending_score.as_ref()
    }

    /// Clears the queued record once it has been persisted.
    pub fn take_pending_score(&mut self) -> Option<ScoreRecord> {
        self.pending_score.take()
    }

    /// Marks a session as dropped from the registry. A request that fetched
    /// it just before eviction must not keep playing on it.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Idle sessions go after `inactive_timeout`, finished ones sooner.
    /// A session still holding an unrecorded score is always kept.
    pub fn should_cleanup(&self, inactive_timeout: Duration, finished_timeout: Duration) -> bool {
        if self.has_pending_score() {
            return false;
        }

        let timeout = if self.outcome.is_terminal() {
            finished_timeout
        } else {
            inactive_timeout
        };

        self.idle_for() >= timeout
    }

    pub fn state(&self, message: impl Into<String>) -> StateResponse {
        StateResponse {
            game_id: None,
            message: message.into(),
            board: self.board.render(),
            game_over: self.board.is_over(),
            is_won: self.board.is_won(),
            outcome: self.outcome,
        }
    }
}
