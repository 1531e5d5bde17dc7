#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevealedState {
    #[default]
    Hidden,
    Flagged,
    Revealed,
}

/// One square of the board. Created hidden, unflagged and mine-free; only
/// the owning [`Board`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub(crate) mine: bool,
    pub(crate) adjacent: u8,
    pub(crate) revealed: RevealedState,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.mine
    }

    pub fn is_visible(&self) -> bool {
        self.revealed == RevealedState::Revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.revealed == RevealedState::Flagged
    }

    /// Mines among the up to eight surrounding cells. Meaningless on a mine.
    pub fn neighbor_mine_count(&self) -> u8 {
        self.adjacent
    }

    /// Unconditional; the board checks eligibility first.
    pub fn reveal(&mut self) {
        self.revealed = RevealedState::Revealed;
    }

    /// Swaps hidden and flagged. A revealed cell has no flag to toggle.
    pub fn toggle_flag(&mut self) {
        self.revealed = match self.revealed {
            RevealedState::Hidden => RevealedState::Flagged,
            RevealedState::Flagged => RevealedState::Hidden,
            RevealedState::Revealed => RevealedState::Revealed,
        };
    }
}

/// Row-major grid of `height` rows by `width` columns.
#[derive(Debug)]
pub struct Board {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) mines: usize,
    pub(crate) generated: bool,
    pub(crate) over: bool,
    pub(crate) cells: Vec<Cell>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_is_hidden_safe_and_unflagged() {
        let cell = Cell::default();
        assert!(!cell.is_mine());
        assert!(!cell.is_visible());
        assert!(!cell.is_flagged());
        assert_eq!(cell.neighbor_mine_count(), 0);
    }

    #[test]
    fn toggle_flag_flips_back_and_forth() {
        let mut cell = Cell::default();
        cell.toggle_flag();
        assert!(cell.is_flagged());
        cell.toggle_flag();
        assert!(!cell.is_flagged());
        assert!(!cell.is_visible());
    }

    #[test]
    fn reveal_makes_cell_visible() {
        let mut cell = Cell::default();
        cell.reveal();
        assert!(cell.is_visible());
        cell.toggle_flag();
        assert!(!cell.is_flagged());
    }
}
