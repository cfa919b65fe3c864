use cadtris_core::{Cell, GameAction, GameRules, Snapshot, Voxel};
use std::collections::BTreeMap;

const PIECE_COLOR: Voxel = Voxel {
    r: 220,
    g: 60,
    b: 40,
    opacity: 255,
};
const LANDED_COLOR: Voxel = Voxel {
    r: 120,
    g: 120,
    b: 140,
    opacity: 255,
};

/// Minimal falling-domino game for driving the add-in without a real game.
///
/// Full rows are cleared. A new piece that does not fit ends the game.
pub struct DemoBoard {
    width: i32,
    height: i32,
    piece: Cell,
    vertical: bool,
    landed: BTreeMap<Cell, Voxel>,
    paused: bool,
    game_over: bool,
    rows_cleared: u32,
}

impl DemoBoard {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(2) as i32;
        let height = height.max(2) as i32;
        Self {
            width,
            height,
            piece: Cell::new(width / 2 - 1, 0),
            vertical: false,
            landed: BTreeMap::new(),
            paused: false,
            game_over: false,
            rows_cleared: 0,
        }
    }

    pub fn rows_cleared(&self) -> u32 {
        self.rows_cleared
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn piece_cells(origin: Cell, vertical: bool) -> [Cell; 2] {
        if vertical {
            [origin, Cell::new(origin.x, origin.y + 1)]
        } else {
            [origin, Cell::new(origin.x + 1, origin.y)]
        }
    }

    fn fits(&self, origin: Cell, vertical: bool) -> bool {
        Self::piece_cells(origin, vertical).iter().all(|c| {
            c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
                && !self.landed.contains_key(c)
        })
    }

    fn try_move(&mut self, dx: i32, dy: i32, vertical: bool) -> bool {
        let target = Cell::new(self.piece.x + dx, self.piece.y + dy);
        if self.fits(target, vertical) {
            self.piece = target;
            self.vertical = vertical;
            true
        } else {
            false
        }
    }

    fn lock(&mut self) {
        for cell in Self::piece_cells(self.piece, self.vertical) {
            self.landed.insert(cell, LANDED_COLOR);
        }
        self.clear_full_rows();
        self.spawn();
    }

    fn clear_full_rows(&mut self) {
        let full: Vec<i32> = (0..self.height)
            .filter(|&y| (0..self.width).all(|x| self.landed.contains_key(&Cell::new(x, y))))
            .collect();
        if full.is_empty() {
            return;
        }

        self.landed = std::mem::take(&mut self.landed)
            .into_iter()
            .filter(|(cell, _)| !full.contains(&cell.y))
            .map(|(cell, voxel)| {
                let shift = full.iter().filter(|&&row| row > cell.y).count() as i32;
                (Cell::new(cell.x, cell.y + shift), voxel)
            })
            .collect();
        self.rows_cleared += full.len() as u32;
        log::info!("Cleared {} row(s), {} total", full.len(), self.rows_cleared);
    }

    fn spawn(&mut self) {
        self.piece = Cell::new(self.width / 2 - 1, 0);
        self.vertical = false;
        if !self.fits(self.piece, self.vertical) {
            self.game_over = true;
            log::info!("Game over after {} cleared rows", self.rows_cleared);
        }
    }
}

impl GameRules for DemoBoard {
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(self.width as u32, self.height as u32);
        for (cell, voxel) in &self.landed {
            snapshot.set(*cell, *voxel);
        }
        if !self.game_over {
            for cell in Self::piece_cells(self.piece, self.vertical) {
                snapshot.set(cell, PIECE_COLOR);
            }
        }
        snapshot
    }

    fn apply(&mut self, action: GameAction) -> bool {
        if self.game_over {
            return false;
        }
        if action == GameAction::Pause {
            self.paused = !self.paused;
            log::info!("Game {}", if self.paused { "paused" } else { "resumed" });
            return false;
        }
        if self.paused {
            return false;
        }

        match action {
            GameAction::MoveLeft => self.try_move(-1, 0, self.vertical),
            GameAction::MoveRight => self.try_move(1, 0, self.vertical),
            GameAction::RotateLeft | GameAction::RotateRight => self.try_move(0, 0, !self.vertical),
            GameAction::SoftDrop => {
                if !self.try_move(0, 1, self.vertical) {
                    self.lock();
                }
                true
            }
            GameAction::HardDrop => {
                while self.try_move(0, 1, self.vertical) {}
                self.lock();
                true
            }
            GameAction::Pause => false,
        }
    }

    fn tick(&mut self) -> bool {
        if self.paused || self.game_over {
            return false;
        }
        if !self.try_move(0, 1, self.vertical) {
            self.lock();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_stays_on_board() {
        let mut board = DemoBoard::new(4, 4);
        assert!(board.apply(GameAction::MoveLeft));
        assert!(!board.apply(GameAction::MoveLeft));
        assert!(board.apply(GameAction::MoveRight));
        assert!(board.apply(GameAction::MoveRight));
        assert!(!board.apply(GameAction::MoveRight));
    }

    #[test]
    fn test_hard_drop_lands_and_respawns() {
        let mut board = DemoBoard::new(4, 4);
        assert!(board.apply(GameAction::HardDrop));
        let snapshot = board.snapshot();
        assert_eq!(snapshot.get(Cell::new(1, 3)), Some(&LANDED_COLOR));
        assert_eq!(snapshot.get(Cell::new(2, 3)), Some(&LANDED_COLOR));
        assert_eq!(snapshot.get(Cell::new(1, 0)), Some(&PIECE_COLOR));
    }

    #[test]
    fn test_full_row_is_cleared() {
        let mut board = DemoBoard::new(4, 4);
        board.apply(GameAction::MoveLeft);
        board.apply(GameAction::HardDrop);
        board.apply(GameAction::MoveRight);
        board.apply(GameAction::HardDrop);

        assert_eq!(board.rows_cleared(), 1);
        // only the fresh piece is left
        assert_eq!(board.snapshot().len(), 2);
    }

    #[test]
    fn test_pause_blocks_moves_and_ticks() {
        let mut board = DemoBoard::new(4, 4);
        assert!(!board.apply(GameAction::Pause));
        assert!(!board.tick());
        assert!(!board.apply(GameAction::MoveLeft));
        board.apply(GameAction::Pause);
        assert!(board.tick());
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut board = DemoBoard::new(2, 2);
        board.apply(GameAction::RotateRight);
        // vertical domino fills column 0, the next horizontal piece cannot fit
        board.apply(GameAction::HardDrop);
        assert!(board.is_game_over());
        assert!(!board.tick());
        assert_eq!(board.snapshot().len(), 2);
    }
}
