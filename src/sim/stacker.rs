//! Stack board for Feature Forge
//!
//! A well of settled cells plus one falling piece. The board
//! knows nothing about score or phases; it reports what happened (rows
//! dropped, rows cleared, topped out) and the loop turns that into points.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;

/// The seven tetromino shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    pub fn random(rng: &mut Pcg32) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Spawn orientation, rows top to bottom
    pub fn shape(self) -> Vec<Vec<bool>> {
        let rows: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
            PieceKind::J => &[&[1, 0, 0], &[1, 1, 1]],
            PieceKind::L => &[&[0, 0, 1], &[1, 1, 1]],
        };
        rows.iter()
            .map(|row| row.iter().map(|&c| c == 1).collect())
            .collect()
    }

    /// HSB hue
    pub fn hue(self) -> f32 {
        match self {
            PieceKind::I => 180.0,
            PieceKind::O => 60.0,
            PieceKind::T => 300.0,
            PieceKind::S => 120.0,
            PieceKind::Z => 0.0,
            PieceKind::J => 240.0,
            PieceKind::L => 30.0,
        }
    }

    /// Feature-engineering word stamped on the piece
    pub fn word(self) -> &'static str {
        match self {
            PieceKind::I => "NORMALIZE",
            PieceKind::O => "ONE-HOT",
            PieceKind::T => "OUTER",
            PieceKind::S => "LEFT",
            PieceKind::Z => "RIGHT",
            PieceKind::J => "INNER",
            PieceKind::L => "JOIN",
        }
    }
}

/// The falling piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Vec<Vec<bool>>,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn width(&self) -> i32 {
        self.shape.first().map_or(0, |row| row.len() as i32)
    }

    pub fn height(&self) -> i32 {
        self.shape.len() as i32
    }

    /// Occupied board coordinates at the current position
    pub fn cells(&self) -> Vec<(i32, i32)> {
        self.cells_at(self.x, self.y)
    }

    /// Occupied board coordinates if the piece sat at `(x, y)`
    pub fn cells_at(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        shape_cells(&self.shape, x, y)
    }
}

fn shape_cells(shape: &[Vec<bool>], x: i32, y: i32) -> Vec<(i32, i32)> {
    shape
        .iter()
        .enumerate()
        .flat_map(|(row, cols)| {
            cols.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(col, _)| (x + col as i32, y + row as i32))
        })
        .collect()
}

/// Quarter turn clockwise
fn rotate_cw(shape: &[Vec<bool>]) -> Vec<Vec<bool>> {
    let h = shape.len();
    let w = shape.first().map_or(0, Vec::len);
    (0..w)
        .map(|col| (0..h).map(|row| shape[h - 1 - row][col]).collect())
        .collect()
}

/// Result of writing the falling piece into the grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockOutcome {
    /// Indices (before shifting) of the rows that were cleared
    pub cleared_rows: Vec<usize>,
    /// Part of the piece was above the grid when it locked
    pub topped_out: bool,
}

impl LockOutcome {
    pub fn cleared(&self) -> u32 {
        self.cleared_rows.len() as u32
    }
}

/// What a soft drop did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftDrop {
    Moved,
    Locked(LockOutcome),
}

/// Pixel placement of the board inside the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin: Vec2,
    pub cell: f32,
}

impl BoardLayout {
    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        self.origin + Vec2::new((x as f32 + 0.5) * self.cell, (y as f32 + 0.5) * self.cell)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackBoard {
    pub cols: usize,
    pub rows: usize,
    /// Row-major settled cells
    grid: Vec<Option<PieceKind>>,
    pub current: Option<Piece>,
    pub next: PieceKind,
    /// Total rows cleared this run
    pub lines: u32,
    /// Rows removed by the most recent lock that cleared any
    #[serde(default)]
    pub last_clear: u32,
    /// Tractor beam intensity in [0, 1]
    pub beam: f32,
    /// Wall-clock time of the last automatic fall
    pub last_fall_ms: Option<f64>,
}

impl StackBoard {
    pub fn new(cols: usize, rows: usize, rng: &mut Pcg32) -> Self {
        Self {
            cols,
            rows,
            grid: vec![None; cols * rows],
            current: None,
            next: PieceKind::random(rng),
            lines: 0,
            last_clear: 0,
            beam: 0.0,
            last_fall_ms: None,
        }
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<PieceKind> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        self.grid[y as usize * self.cols + x as usize]
    }

    /// Write a settled cell; out-of-range coordinates are ignored
    pub fn set_cell(&mut self, x: i32, y: i32, kind: Option<PieceKind>) {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return;
        }
        self.grid[y as usize * self.cols + x as usize] = kind;
    }

    /// Every settled cell as `(x, y, kind)`
    pub fn settled_cells(&self) -> impl Iterator<Item = (i32, i32, PieceKind)> + '_ {
        self.grid.iter().enumerate().filter_map(|(i, cell)| {
            cell.map(|kind| ((i % self.cols) as i32, (i / self.cols) as i32, kind))
        })
    }

    /// Cells above the top row are allowed; sides and floor are not
    fn fits(&self, shape: &[Vec<bool>], x: i32, y: i32) -> bool {
        shape_cells(shape, x, y).into_iter().all(|(cx, cy)| {
            cx >= 0
                && (cx as usize) < self.cols
                && cy < self.rows as i32
                && (cy < 0 || self.cell(cx, cy).is_none())
        })
    }

    /// Promote `next` to the falling piece. Returns false if it is blocked.
    pub fn spawn_next(&mut self, rng: &mut Pcg32) -> bool {
        let kind = self.next;
        self.next = PieceKind::random(rng);
        let shape = kind.shape();
        let width = shape.first().map_or(0, Vec::len) as i32;
        let x = (self.cols / 2) as i32 - width / 2;
        if !self.fits(&shape, x, 0) {
            log::info!("Spawn blocked for {:?}", kind);
            self.current = None;
            return false;
        }
        self.current = Some(Piece {
            kind,
            shape,
            x,
            y: 0,
        });
        true
    }

    /// Move the piece sideways if the target is free
    pub fn shift(&mut self, dx: i32) -> bool {
        let Some(piece) = &self.current else {
            return false;
        };
        if !self.fits(&piece.shape, piece.x + dx, piece.y) {
            return false;
        }
        if let Some(piece) = self.current.as_mut() {
            piece.x += dx;
        }
        true
    }

    /// Rotate clockwise, kicking one column right then left if needed
    pub fn rotate(&mut self) -> bool {
        let Some(piece) = &self.current else {
            return false;
        };
        let rotated = rotate_cw(&piece.shape);
        let kick = [0, 1, -1]
            .into_iter()
            .find(|dx| self.fits(&rotated, piece.x + dx, piece.y));
        match (kick, self.current.as_mut()) {
            (Some(dx), Some(piece)) => {
                piece.shape = rotated;
                piece.x += dx;
                true
            }
            _ => false,
        }
    }

    /// Rows the piece can still fall
    pub fn drop_distance(&self) -> i32 {
        let Some(piece) = &self.current else {
            return 0;
        };
        let mut dy = 0;
        while self.fits(&piece.shape, piece.x, piece.y + dy + 1) {
            dy += 1;
        }
        dy
    }

    /// One row down, or lock if the piece is resting
    pub fn soft_drop(&mut self) -> Option<SoftDrop> {
        self.current.as_ref()?;
        if self.drop_distance() > 0 {
            if let Some(piece) = self.current.as_mut() {
                piece.y += 1;
            }
            Some(SoftDrop::Moved)
        } else {
            Some(SoftDrop::Locked(self.lock()))
        }
    }

    /// Drop to the floor and lock. Returns rows dropped and the lock result.
    pub fn hard_drop(&mut self) -> Option<(u32, LockOutcome)> {
        self.current.as_ref()?;
        let dy = self.drop_distance();
        if let Some(piece) = self.current.as_mut() {
            piece.y += dy;
        }
        Some((dy as u32, self.lock()))
    }

    /// Write the falling piece into the grid and clear full rows
    pub fn lock(&mut self) -> LockOutcome {
        let Some(piece) = self.current.take() else {
            return LockOutcome::default();
        };
        let mut topped_out = false;
        for (x, y) in piece.cells() {
            if y < 0 {
                topped_out = true;
            } else {
                self.set_cell(x, y, Some(piece.kind));
            }
        }
        let cleared_rows = self.clear_lines();
        self.lines += cleared_rows.len() as u32;
        if !cleared_rows.is_empty() {
            self.last_clear = cleared_rows.len() as u32;
        }
        LockOutcome {
            cleared_rows,
            topped_out,
        }
    }

    /// Remove full rows bottom-up, shifting everything above down
    fn clear_lines(&mut self) -> Vec<usize> {
        let cols = self.cols;
        let full: Vec<usize> = (0..self.rows)
            .rev()
            .filter(|&y| self.grid[y * cols..(y + 1) * cols].iter().all(Option::is_some))
            .collect();
        if full.is_empty() {
            return full;
        }

        let mut kept: Vec<Option<PieceKind>> = Vec::with_capacity(self.grid.len());
        kept.resize(full.len() * cols, None);
        for y in 0..self.rows {
            if !full.contains(&y) {
                kept.extend_from_slice(&self.grid[y * cols..(y + 1) * cols]);
            }
        }
        self.grid = kept;
        full
    }

    /// True when the automatic fall step is due; restarts the timer when it is
    pub fn fall_due(&mut self, now_ms: f64, interval_ms: f64) -> bool {
        let Some(last) = self.last_fall_ms else {
            self.last_fall_ms = Some(now_ms);
            return false;
        };
        if now_ms - last > interval_ms {
            self.last_fall_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Ramp the tractor beam toward on/off by 0.1 per tick
    pub fn update_beam(&mut self, active: bool) {
        let delta = if active { 0.1 } else { -0.1 };
        self.beam = (self.beam + delta).clamp(0.0, 1.0);
    }

    /// Board centered horizontally, filling the arena height
    pub fn layout(&self, arena: &ArenaConfig) -> BoardLayout {
        let cell = (arena.height / self.rows.max(1) as f32)
            .min(arena.width / self.cols.max(1) as f32);
        let origin = Vec2::new(
            (arena.width - cell * self.cols as f32) / 2.0,
            (arena.height - cell * self.rows as f32) / 2.0,
        );
        BoardLayout { origin, cell }
    }

    /// Reject out-of-range restored state
    pub fn check(&self) -> Result<(), String> {
        if self.grid.len() != self.cols * self.rows {
            return Err(format!(
                "board grid has {} cells, expected {}x{}",
                self.grid.len(),
                self.cols,
                self.rows
            ));
        }
        if !(0.0..=1.0).contains(&self.beam) {
            return Err(format!("beam intensity {} out of range", self.beam));
        }
        if let Some(piece) = &self.current {
            let width = piece.shape.first().map_or(0, Vec::len);
            if width == 0 || piece.shape.iter().any(|row| row.len() != width) {
                return Err(format!("{:?} piece shape is empty or ragged", piece.kind));
            }
            if !piece.shape.iter().flatten().any(|&filled| filled) {
                return Err(format!("{:?} piece shape has no cells", piece.kind));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn board() -> (StackBoard, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(9);
        let board = StackBoard::new(10, 20, &mut rng);
        (board, rng)
    }

    fn with_piece(board: &mut StackBoard, kind: PieceKind, x: i32, y: i32) {
        board.current = Some(Piece {
            kind,
            shape: kind.shape(),
            x,
            y,
        });
    }

    fn fill_row_except(board: &mut StackBoard, y: i32, gap: i32) {
        for x in 0..board.cols as i32 {
            if x != gap {
                board.set_cell(x, y, Some(PieceKind::O));
            }
        }
    }

    #[test]
    fn test_spawn_is_centered() {
        let (mut board, mut rng) = board();
        board.next = PieceKind::I;
        assert!(board.spawn_next(&mut rng));
        let piece = board.current.as_ref().unwrap();
        assert_eq!((piece.x, piece.y), (3, 0));

        board.next = PieceKind::T;
        assert!(board.spawn_next(&mut rng));
        assert_eq!(board.current.as_ref().unwrap().x, 4);
    }

    #[test]
    fn test_blocked_spawn_reports_failure() {
        let (mut board, mut rng) = board();
        for x in 0..10 {
            board.set_cell(x, 0, Some(PieceKind::Z));
        }
        assert!(!board.spawn_next(&mut rng));
        assert!(board.current.is_none());
    }

    #[test]
    fn test_shift_stops_at_walls() {
        let (mut board, _) = board();
        with_piece(&mut board, PieceKind::O, 0, 5);
        assert!(!board.shift(-1));
        assert!(board.shift(1));
        with_piece(&mut board, PieceKind::O, 8, 5);
        assert!(!board.shift(1));
    }

    #[test]
    fn test_rotate_kicks_off_the_wall() {
        let (mut board, _) = board();
        // Vertical I against the right wall: rotating flat needs kicks
        let mut piece = Piece {
            kind: PieceKind::I,
            shape: rotate_cw(&PieceKind::I.shape()),
            x: 9,
            y: 5,
        };
        assert_eq!(piece.width(), 1);
        board.current = Some(piece.clone());
        // Flat I would span x 9..13: both kicks fail
        assert!(!board.rotate());

        piece.x = 6;
        board.current = Some(piece);
        assert!(board.rotate());
        let rotated = board.current.as_ref().unwrap();
        assert_eq!(rotated.width(), 4);
        assert_eq!(rotated.x, 6);
    }

    #[test]
    fn test_rotate_uses_left_kick() {
        let (mut board, _) = board();
        // Flat I from x = 7 would poke through the right wall
        board.current = Some(Piece {
            kind: PieceKind::I,
            shape: rotate_cw(&PieceKind::I.shape()),
            x: 7,
            y: 5,
        });
        assert!(board.rotate());
        assert_eq!(board.current.as_ref().unwrap().x, 6);
    }

    #[test]
    fn test_rotate_uses_right_kick() {
        let (mut board, _) = board();
        // T pointing down; the next orientation is blocked at home
        let down = rotate_cw(&rotate_cw(&PieceKind::T.shape()));
        assert_eq!(down, vec![vec![true, true, true], vec![false, true, false]]);
        board.current = Some(Piece {
            kind: PieceKind::T,
            shape: down,
            x: 4,
            y: 5,
        });
        board.set_cell(4, 6, Some(PieceKind::O));
        assert!(board.rotate());
        assert_eq!(board.current.as_ref().unwrap().x, 5);
    }

    #[test]
    fn test_soft_drop_moves_then_locks() {
        let (mut board, _) = board();
        with_piece(&mut board, PieceKind::O, 4, 17);
        assert_eq!(board.soft_drop(), Some(SoftDrop::Moved));
        assert_eq!(board.current.as_ref().unwrap().y, 18);
        assert!(matches!(board.soft_drop(), Some(SoftDrop::Locked(_))));
        assert!(board.current.is_none());
        assert_eq!(board.cell(4, 19), Some(PieceKind::O));
    }

    #[test]
    fn test_hard_drop_reports_rows() {
        let (mut board, _) = board();
        with_piece(&mut board, PieceKind::O, 0, 0);
        let (rows, outcome) = board.hard_drop().unwrap();
        assert_eq!(rows, 18);
        assert_eq!(outcome.cleared(), 0);
        assert_eq!(board.cell(0, 18), Some(PieceKind::O));
    }

    #[test]
    fn test_four_line_clear() {
        let (mut board, _) = board();
        for y in 16..20 {
            fill_row_except(&mut board, y, 9);
        }
        board.set_cell(0, 15, Some(PieceKind::S));
        let vertical = rotate_cw(&PieceKind::I.shape());
        board.current = Some(Piece {
            kind: PieceKind::I,
            shape: vertical,
            x: 9,
            y: 16,
        });
        let outcome = board.lock();
        assert_eq!(outcome.cleared(), 4);
        assert_eq!(outcome.cleared_rows, vec![19, 18, 17, 16]);
        assert!(!outcome.topped_out);
        assert_eq!(board.lines, 4);
        // The lone cell above fell four rows
        assert_eq!(board.cell(0, 19), Some(PieceKind::S));
        assert_eq!(board.settled_cells().count(), 1);
    }

    #[test]
    fn test_partial_rows_survive_clear() {
        let (mut board, _) = board();
        fill_row_except(&mut board, 19, 0);
        fill_row_except(&mut board, 18, 5);
        fill_row_except(&mut board, 17, 0);
        board.current = Some(Piece {
            kind: PieceKind::I,
            shape: rotate_cw(&PieceKind::I.shape()),
            x: 0,
            y: 16,
        });
        let outcome = board.lock();
        // Rows 19 and 17 complete; 18 keeps its gap and drops to the floor
        assert_eq!(outcome.cleared_rows, vec![19, 17]);
        assert_eq!(board.cell(5, 19), None);
        assert_eq!(board.cell(4, 19), Some(PieceKind::O));
        assert_eq!(board.cell(0, 19), Some(PieceKind::I));
    }

    #[test]
    fn test_lock_above_grid_tops_out() {
        let (mut board, _) = board();
        with_piece(&mut board, PieceKind::T, 4, -1);
        assert!(board.lock().topped_out);
    }

    #[test]
    fn test_fall_gate_uses_wall_clock() {
        let (mut board, _) = board();
        assert!(!board.fall_due(1000.0, 500.0));
        assert!(!board.fall_due(1500.0, 500.0));
        assert!(board.fall_due(1500.1, 500.0));
        assert!(!board.fall_due(1600.0, 500.0));
    }

    #[test]
    fn test_last_clear_survives_plain_locks() {
        let (mut board, _) = board();
        fill_row_except(&mut board, 19, 9);
        board.current = Some(Piece {
            kind: PieceKind::I,
            shape: rotate_cw(&PieceKind::I.shape()),
            x: 9,
            y: 16,
        });
        assert_eq!(board.lock().cleared(), 1);
        assert_eq!(board.last_clear, 1);

        with_piece(&mut board, PieceKind::O, 0, 0);
        assert_eq!(board.lock().cleared(), 0);
        assert_eq!(board.last_clear, 1);
    }

    #[test]
    fn test_check_rejects_malformed_piece() {
        let (mut board, _) = board();
        with_piece(&mut board, PieceKind::T, 4, 0);
        assert!(board.check().is_ok());

        let malformed = [
            vec![],
            vec![vec![]],
            vec![vec![true, true, true], vec![true]],
            vec![vec![false, false], vec![false, false]],
        ];
        for shape in malformed {
            if let Some(piece) = board.current.as_mut() {
                piece.shape = shape.clone();
            }
            assert!(board.check().is_err(), "accepted {:?}", shape);
        }
    }

    #[test]
    fn test_beam_ramps_and_clamps() {
        let (mut board, _) = board();
        for _ in 0..15 {
            board.update_beam(true);
        }
        assert_eq!(board.beam, 1.0);
        board.update_beam(false);
        assert!((board.beam - 0.9).abs() < 1e-6);
        for _ in 0..15 {
            board.update_beam(false);
        }
        assert_eq!(board.beam, 0.0);
    }

    #[test]
    fn test_layout_fits_arena() {
        let (board, _) = board();
        let arena = ArenaConfig {
            width: 1280.0,
            height: 720.0,
        };
        let layout = board.layout(&arena);
        assert_eq!(layout.cell, 36.0);
        assert_eq!(layout.origin, Vec2::new(460.0, 0.0));
        assert_eq!(layout.cell_center(0, 0), Vec2::new(478.0, 18.0));
    }
}
