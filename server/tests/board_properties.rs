// Property tests for board generation, flood-fill reveal and win detection.

use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use sweeper_common::models::Pos;
use sweeper_server::data::Board;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/// Width, height, mine count (always below the area) and an rng seed.
fn arb_layout() -> impl Strategy<Value = (usize, usize, usize, u64)> {
    (1usize..=12, 1usize..=12)
        .prop_flat_map(|(w, h)| (Just(w), Just(h), 0..w * h, any::<u64>()))
}

fn generated((width, height, mines, seed): (usize, usize, usize, u64)) -> Board {
    let mut board = Board::new(width, height, mines).unwrap();
    board.generate_with(&mut StdRng::seed_from_u64(seed));
    board
}

fn mine_at(board: &Board, x: i64, y: i64) -> bool {
    x >= 0
        && y >= 0
        && board
            .cell(Pos {
                x: x as usize,
                y: y as usize,
            })
            .is_some_and(|cell| cell.is_mine())
}

#[derive(Debug, Clone, Copy)]
enum Move {
    Reveal(usize, usize),
    Flag(usize, usize),
}

fn arb_move() -> impl Strategy<Value = Move> {
    prop_oneof![
        3 => (0usize..14, 0usize..14).prop_map(|(x, y)| Move::Reveal(x, y)),
        1 => (0usize..14, 0usize..14).prop_map(|(x, y)| Move::Flag(x, y)),
    ]
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn generation_places_exactly_the_requested_mines(layout in arb_layout()) {
        let board = generated(layout);
        let mines = board.cells().filter(|(_, cell)| cell.is_mine()).count();
        prop_assert_eq!(mines, layout.2);
        prop_assert_eq!(board.mine_count(), layout.2);
    }

    #[test]
    fn neighbor_counts_match_surrounding_mines(layout in arb_layout()) {
        let board = generated(layout);

        for (pos, cell) in board.cells().filter(|(_, cell)| !cell.is_mine()) {
            let (x, y) = (pos.x as i64, pos.y as i64);
            let mut expected = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx, dy) != (0, 0) && mine_at(&board, x + dx, y + dy) {
                        expected += 1;
                    }
                }
            }
            prop_assert_eq!(cell.neighbor_mine_count(), expected);
        }
    }

    #[test]
    fn open_board_cascades_everywhere(
        (width, height) in (1usize..=40, 1usize..=40),
        start in (0usize..40, 0usize..40),
    ) {
        let mut board = Board::new(width, height, 0).unwrap();
        board.generate();
        let pos = Pos { x: start.0 % width, y: start.1 % height };

        prop_assert_eq!(board.reveal(pos).unwrap(), width * height);
        prop_assert!(board.is_won());
        prop_assert!(board.is_over());
    }

    #[test]
    fn win_tracks_visible_safe_cells_only(layout in arb_layout(), moves in prop::collection::vec(arb_move(), 1..40)) {
        let mut board = generated(layout);

        for step in moves {
            if board.is_over() {
                break;
            }
            let _ = match step {
                Move::Reveal(x, y) => board.reveal(Pos { x, y }).map(|_| ()),
                Move::Flag(x, y) => board.toggle_flag(Pos { x, y }).map(|_| ()),
            };

            let all_safe_visible = board
                .cells()
                .all(|(_, cell)| cell.is_mine() || cell.is_visible());
            prop_assert_eq!(board.is_won(), all_safe_visible);
            prop_assert!(board.cells().all(|(_, cell)| !(cell.is_visible() && cell.is_flagged())));
        }
    }

    #[test]
    fn reveal_skips_flagged_and_visible_cells(layout in arb_layout(), target in (0usize..12, 0usize..12)) {
        let mut board = generated(layout);
        let pos = Pos { x: target.0 % board.width(), y: target.1 % board.height() };

        board.toggle_flag(pos).unwrap();
        let before = board.render();
        prop_assert_eq!(board.reveal(pos).unwrap(), 0);
        prop_assert_eq!(board.render(), before);

        board.toggle_flag(pos).unwrap();
        board.reveal(pos).unwrap();
        if !board.is_over() {
            let before = board.render();
            prop_assert_eq!(board.reveal(pos).unwrap(), 0);
            prop_assert_eq!(board.render(), before);
        }
    }

    #[test]
    fn revealing_a_mine_ends_the_game_alone(layout in arb_layout().prop_filter("needs a mine", |l| l.2 > 0)) {
        let mut board = generated(layout);
        let mine = board
            .cells()
            .find(|(_, cell)| cell.is_mine())
            .map(|(pos, _)| pos)
            .unwrap();

        prop_assert_eq!(board.reveal(mine).unwrap(), 1);
        prop_assert!(board.is_over());
        prop_assert!(!board.is_won());
        prop_assert_eq!(board.cells().filter(|(_, cell)| cell.is_visible()).count(), 1);
    }
}
