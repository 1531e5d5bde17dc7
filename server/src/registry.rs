use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, Entry};
use nanoid::nanoid;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task,
};
use tracing::{debug, error, info, instrument, warn};

use sweeper_common::{
    models::{GameParams, ScoreRecord},
    protocol::{Action, ParseActionError, StateResponse},
};

use crate::{
    config::Settings,
    data::Board,
    error::{GameError, Result, StoreError},
    scores::{JsonScoreStore, MemoryScoreStore, ScoreRecorder},
    session::{GameSession, SessionId},
};

pub type Sessions = DashMap<SessionId, Arc<Mutex<GameSession>>>;

fn action_message(action: Action) -> &'static str {
    match action {
        Action::Open => "Cell revealed.",
        Action::Flag => "Flag toggled.",
        Action::Exit => "Game exited.",
    }
}

/// Every live session of the process, keyed by id, plus the score log their
/// outcomes go to. Each session sits behind its own lock so moves on one
/// game serialize without blocking the others.
pub struct SessionRegistry {
    sessions: Sessions,
    scores: Arc<dyn ScoreRecorder>,
    max_board_cells: usize,
    score_write_attempts: u32,
}

impl SessionRegistry {
    pub fn new(scores: Arc<dyn ScoreRecorder>) -> Self {
        let defaults = Settings::default();
        Self {
            sessions: DashMap::new(),
            scores,
            max_board_cells: defaults.max_board_cells,
            score_write_attempts: defaults.score_write_attempts,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let scores: Arc<dyn ScoreRecorder> = match &settings.scores_file {
            Some(path) => Arc::new(JsonScoreStore::new(path)),
            None => {
                warn!("No score file configured, scores are kept in memory");
                Arc::new(MemoryScoreStore::default())
            }
        };

        Self::new(scores)
            .with_max_board_cells(settings.max_board_cells)
            .with_score_write_attempts(settings.score_write_attempts)
    }

    pub fn with_max_board_cells(mut self, max_board_cells: usize) -> Self {
        self.max_board_cells = max_board_cells;
        self
    }

    pub fn with_score_write_attempts(mut self, attempts: u32) -> Self {
        self.score_write_attempts = attempts.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Creates and registers a freshly generated game.
    #[instrument(level = "trace", skip(self))]
    pub fn start(&self, player_name: &str, params: GameParams) -> Result<StateResponse> {
        if params.width.saturating_mul(params.height) > self.max_board_cells {
            return Err(GameError::InvalidBoard {
                width: params.width,
                height: params.height,
                mines: params.mines,
                reason: "board exceeds the cell limit",
            });
        }

        let mut board = Board::new(params.width, params.height, params.mines)?;
        board.generate();

        let (id, mut state) = self.add_session(player_name, board);
        state.game_id = Some(id);
        Ok(state)
    }

    /// Registers a prepared board under a fresh id.
    pub fn start_with_board(&self, player_name: &str, board: Board) -> (SessionId, StateResponse) {
        self.add_session(player_name, board)
    }

    fn add_session(&self, player_name: &str, board: Board) -> (SessionId, StateResponse) {
        let mut id_length = 5;
        let max_attempts_per_length = 10;

        loop {
            for _ in 0..max_attempts_per_length {
                let id = nanoid!(id_length);
                match self.sessions.entry(id.clone()) {
                    Entry::Occupied(_) => {
                        debug!("Session ID collision, trying another: {}", id);
                        continue;
                    }
                    Entry::Vacant(entry) => {
                        let session = GameSession::new(id.clone(), player_name.to_string(), board);
                        let state = session.state("Game started.");
                        entry.insert(Arc::new(Mutex::new(session)));
                        info!("Registered session {}", id);
                        return (id, state);
                    }
                }
            }

            warn!(
                "Exhausted ID attempts at length {}, increasing to {}",
                id_length,
                id_length + 1
            );
            id_length += 1;
        }
    }

    fn get(&self, id: &str) -> Result<Arc<Mutex<GameSession>>> {
        match self.sessions.get(id) {
            Some(entry) => Ok(entry.value().clone()),
            None => {
                debug!("Unknown session {}", id);
                Err(GameError::NotFound)
            }
        }
    }

    /// Locks a live session. One evicted while we waited is gone.
    async fn lock(&self, id: &str) -> Result<OwnedMutexGuard<GameSession>> {
        let session = self.get(id)?.lock_owned().await;
        if session.is_retired() {
            debug!("Session {} was evicted before the lock was acquired", id);
            return Err(GameError::NotFound);
        }
        Ok(session)
    }

    /// Current render of a session. A score left over from an earlier failed
    /// write is retried, but a second failure does not hide the board.
    #[instrument(level = "trace", skip(self))]
    pub async fn state(&self, id: &str) -> Result<StateResponse> {
        let mut session = self.lock(id).await?;
        session.touch();

        if let Err(e) = self.flush_pending(&mut session).await {
            warn!("Score for session {} still unrecorded: {}", id, e);
        }

        Ok(session.state("Board updated."))
    }

    /// Applies one move and records the score if the move ended the game.
    ///
    /// Failures are reported in request order: unknown session, then
    /// coordinates off the board, then an unknown action.
    #[instrument(level = "trace", skip(self))]
    pub async fn apply_action(&self, id: &str, x: i64, y: i64, action: &str) -> Result<StateResponse> {
        let mut session = self.lock(id).await?;
        session.position(x, y)?;

        let action: Action = action.parse().map_err(|e: ParseActionError| {
            warn!("Rejected action {:?} for session {}", e.0, id);
            GameError::InvalidAction(e.0)
        })?;

        let applied = session.apply(x, y, action);
        self.flush_pending(&mut session).await?;
        applied?;

        Ok(session.state(action_message(action)))
    }

    async fn flush_pending(&self, session: &mut GameSession) -> Result<()> {
        let Some(record) = session.pending_score().cloned() else {
            return Ok(());
        };

        let mut attempt = 1;
        loop {
            match self.record_score(record.clone()).await {
                Ok(()) => {
                    session.take_pending_score();
                    info!(
                        "Recorded {:?} for {} in session {}",
                        record.outcome,
                        record.player_name,
                        session.id()
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.score_write_attempts => {
                    warn!(
                        "Score write attempt {}/{} failed for session {}: {}",
                        attempt,
                        self.score_write_attempts,
                        session.id(),
                        e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "Giving up on score for session {} after {} attempts: {}",
                        session.id(),
                        attempt,
                        e
                    );
                    return Err(e.into());
                }
            }
        }
    }

    // Score stores do blocking file I/O, so they run off the async workers.
    async fn record_score(&self, record: ScoreRecord) -> std::result::Result<(), StoreError> {
        let scores = self.scores.clone();
        task::spawn_blocking(move || scores.record(&record)).await?
    }

    pub async fn scores(&self, player_name: Option<&str>) -> Result<Vec<ScoreRecord>> {
        let scores = self.scores.clone();
        let player_name = player_name.map(str::to_string);
        let records = task::spawn_blocking(move || scores.query(player_name.as_deref()))
            .await
            .map_err(StoreError::from)??;
        Ok(records)
    }

    /// Drops sessions that [`GameSession::should_cleanup`] marks as stale.
    /// Sessions busy with a request are skipped until the next sweep. The
    /// check and the removal happen under the session lock, so nothing can
    /// queue a score in between.
    pub fn evict_stale(&self, inactive_timeout: Duration, finished_timeout: Duration) -> usize {
        let mut removed = 0;

        self.sessions.retain(|id, session| {
            let Ok(mut session) = session.try_lock() else {
                return true;
            };
            if !session.should_cleanup(inactive_timeout, finished_timeout) {
                return true;
            }

            session.retire();
            removed += 1;
            debug!("Cleaned up session: {}", id);
            false
        });

        removed
    }
}
