use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use sweeper_common::models::{CellView, Pos};

use crate::{
    data::{Board, Cell, RevealedState},
    error::{GameError, Result},
};

/// In-bounds positions around `pos`, diagonals included.
fn neighbors(pos: Pos, width: usize, height: usize) -> impl Iterator<Item = Pos> {
    (-1i64..=1)
        .flat_map(|dy| (-1i64..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let x = pos.x as i64 + dx;
            let y = pos.y as i64 + dy;

            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                Some(Pos {
                    x: x as usize,
                    y: y as usize,
                })
            } else {
                None
            }
        })
}

fn invalid_board(width: usize, height: usize, mines: usize, reason: &'static str) -> GameError {
    GameError::InvalidBoard {
        width,
        height,
        mines,
        reason,
    }
}

impl From<&Cell> for CellView {
    fn from(value: &Cell) -> Self {
        match value.revealed {
            RevealedState::Flagged => Self::Flagged,
            RevealedState::Hidden => Self::Hidden,
            RevealedState::Revealed if value.mine => Self::Mine,
            RevealedState::Revealed => Self::Revealed {
                adjacent: value.adjacent,
            },
        }
    }
}

impl Board {
    /// Allocates an empty, unmined board. Call [`Board::generate`] before play.
    ///
    /// Fails when a dimension is zero or `mines` would leave no safe cell,
    /// since random placement could then never finish.
    pub fn new(width: usize, height: usize, mines: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid_board(width, height, mines, "dimensions must be positive"));
        }

        let area = width
            .checked_mul(height)
            .ok_or_else(|| invalid_board(width, height, mines, "board is too large"))?;

        if mines >= area {
            return Err(invalid_board(
                width,
                height,
                mines,
                "mine count must be below the number of cells",
            ));
        }

        Ok(Self {
            width,
            height,
            mines,
            generated: false,
            over: false,
            cells: vec![Cell::default(); area],
        })
    }

    /// Builds a ready-to-play board with mines at exactly `mines`.
    pub fn with_mines(width: usize, height: usize, mines: &[Pos]) -> Result<Self> {
        let mut board = Self::new(width, height, mines.len())?;

        let mut seen = HashSet::with_capacity(mines.len());
        for &pos in mines {
            let index = board
                .index(pos)
                .ok_or_else(|| invalid_board(width, height, mines.len(), "mine outside the board"))?;
            if !seen.insert(pos) {
                return Err(invalid_board(width, height, mines.len(), "duplicate mine position"));
            }
            board.cells[index].mine = true;
        }

        board.compute_neighbor_counts();
        board.generated = true;
        Ok(board)
    }

    pub fn generate(&mut self) {
        self.generate_with(&mut rand::rng());
    }

    /// Places mines and fills in neighbor counts. Only the first call has an
    /// effect; counts are never recomputed afterwards.
    pub fn generate_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.generated {
            debug!("Board already generated, ignoring");
            return;
        }

        self.place_mines(rng);
        self.compute_neighbor_counts();
        self.generated = true;
    }

    fn place_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut placed = 0;

        while placed < self.mines {
            let x = rng.random_range(0..self.width);
            let y = rng.random_range(0..self.height);

            let cell = &mut self.cells[x + y * self.width];
            if !cell.mine {
                cell.mine = true;
                placed += 1;
            }
        }
    }

    fn compute_neighbor_counts(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let index = x + y * self.width;
                if self.cells[index].mine {
                    continue;
                }

                let count = neighbors(Pos { x, y }, self.width, self.height)
                    .filter(|adj| self.cells[adj.x + adj.y * self.width].mine)
                    .count();
                self.cells[index].adjacent = count as u8;
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.x + pos.y * self.width)
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn cells(&self) -> impl Iterator<Item = (Pos, &Cell)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            (
                Pos {
                    x: i % width,
                    y: i / width,
                },
                cell,
            )
        })
    }

    /// Reveals `pos` and flood-fills outward through zero-count cells.
    ///
    /// Out-of-bounds, visible and flagged cells are skipped. Hitting a mine
    /// ends the game without cascading; uncovering the last safe cell ends it
    /// as a win. Returns the number of cells newly revealed.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub fn reveal(&mut self, pos: Pos) -> Result<usize> {
        if self.over {
            return Err(GameError::GameOver);
        }

        let mut pending = vec![pos];
        let mut revealed = 0;

        while let Some(pos) = pending.pop() {
            let Some(index) = self.index(pos) else {
                continue;
            };

            let cell = &mut self.cells[index];
            if cell.is_visible() || cell.is_flagged() {
                continue;
            }

            cell.reveal();
            revealed += 1;

            if cell.mine {
                warn!("Mine hit at ({}, {}) - game over", pos.x, pos.y);
                self.over = true;
                return Ok(revealed);
            }

            if cell.adjacent == 0 {
                let width = self.width;
                pending.extend(
                    neighbors(pos, width, self.height)
                        .filter(|adj| !self.cells[adj.x + adj.y * width].is_visible()),
                );
            }
        }

        if revealed > 0 && self.is_won() {
            info!("All safe cells revealed");
            self.over = true;
        } else {
            debug!("Revealed {} cells", revealed);
        }

        Ok(revealed)
    }

    /// Flags or unflags a hidden cell. Returns whether anything changed;
    /// revealed cells are left alone.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub fn toggle_flag(&mut self, pos: Pos) -> Result<bool> {
        if self.over {
            return Err(GameError::GameOver);
        }

        let Some(index) = self.index(pos) else {
            warn!("Invalid flag position: ({}, {})", pos.x, pos.y);
            return Err(GameError::InvalidCoordinates {
                x: pos.x as i64,
                y: pos.y as i64,
            });
        };

        let cell = &mut self.cells[index];
        if cell.is_visible() {
            debug!("Ignoring flag on revealed cell ({}, {})", pos.x, pos.y);
            return Ok(false);
        }

        cell.toggle_flag();
        debug!(
            "Cell ({}, {}) {}",
            pos.x,
            pos.y,
            if cell.is_flagged() { "flagged" } else { "unflagged" }
        );
        Ok(true)
    }

    /// Ends the game without revealing anything.
    pub fn abandon(&mut self) {
        self.over = true;
    }

    /// Every safe cell is visible. Flags play no part.
    pub fn is_won(&self) -> bool {
        self.cells.iter().all(|cell| cell.mine || cell.is_visible())
    }

    pub fn render(&self) -> Vec<Vec<CellView>> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(CellView::from).collect())
            .collect()
    }

    pub fn board_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
