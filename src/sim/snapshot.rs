//! Per-frame render snapshot
//!
//! The simulation never draws. Each tick produces a `RenderSnapshot` that a
//! `Renderer` turns into pixels however it likes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{GamePhase, GameSession};
use super::stacker::StackBoard;
use super::entity::Simulated;

/// Draw layer; snapshots list drawables in this order (back to front)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Board,
    Hazard,
    Pickup,
    Projectile,
    Player,
    Particle,
}

/// Hue/saturation/brightness/alpha, HSB ranges (360, 100, 100, 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsba {
    pub h: f32,
    pub s: f32,
    pub b: f32,
    pub a: f32,
}

impl Hsba {
    pub const fn new(h: f32, s: f32, b: f32, a: f32) -> Self {
        Self { h, s, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Outline ring (area effect)
    Ring { radius: f32 },
    /// Closed polygon, points relative to `pos` before rotation
    Polygon { points: Vec<Vec2> },
    /// Image asset drawn centered at `pos`
    Sprite { name: String, size: f32 },
    Text { size: f32 },
    /// Square board cell with the given side length
    Cell { size: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub category: EntityCategory,
    pub shape: Shape,
    pub pos: Vec2,
    pub rotation: f32,
    pub color: Hsba,
    pub text: Option<String>,
}

/// Heads-up display values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    /// Score zero-padded to 8 digits
    pub score_text: String,
    pub lives: u32,
    pub level: u32,
    pub hero: String,
    pub frenzy: u32,
    pub special_armed: bool,
    /// Stacker only: total cleared rows
    pub lines: Option<u32>,
    /// Stacker only: next piece word
    pub next_piece: Option<String>,
    /// Stacker only: tractor beam intensity in [0, 1]
    pub beam: Option<f32>,
}

/// Full-screen text for non-playing phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub game_id: String,
    pub phase: GamePhase,
    pub tick: u64,
    pub drawables: Vec<Drawable>,
    pub hud: Hud,
    pub overlay: Option<Overlay>,
}

impl RenderSnapshot {
    pub fn count(&self, category: EntityCategory) -> usize {
        self.drawables.iter().filter(|d| d.category == category).count()
    }
}

/// Capture the current session for rendering
pub fn capture(session: &GameSession) -> RenderSnapshot {
    let entities = &session.entities;
    let mut drawables = Vec::with_capacity(
        entities.hazards.len()
            + entities.projectiles.len()
            + entities.particles.len()
            + entities.pickups.len()
            + 1,
    );

    if let Some(board) = &session.board {
        board_drawables(board, session, &mut drawables);
    }
    drawables.extend(entities.hazards.iter().map(Simulated::drawable));
    drawables.extend(entities.pickups.iter().map(Simulated::drawable));
    drawables.extend(entities.projectiles.iter().map(Simulated::drawable));
    if let Some(player) = &entities.player {
        let sprite = session
            .hero_profile()
            .map(|h| h.sprite.as_str())
            .unwrap_or("player");
        drawables.push(player.drawable(sprite));
    }
    drawables.extend(entities.particles.iter().map(Simulated::drawable));
    // Stable: keeps spawn order inside a category
    drawables.sort_by_key(|d| d.category);

    let board = session.board.as_ref();
    let hud = Hud {
        score: session.score,
        score_text: format!("{:08}", session.score),
        lives: session.lives,
        level: session.level,
        hero: session
            .hero_profile()
            .map(|h| h.name.clone())
            .unwrap_or_default(),
        frenzy: session.frenzy,
        special_armed: session.special_armed,
        lines: board.map(|b| b.lines),
        next_piece: board.map(|b| b.next.word().to_string()),
        beam: board.map(|b| b.beam),
    };

    RenderSnapshot {
        game_id: session.game_id().to_string(),
        phase: session.phase,
        tick: session.tick,
        drawables,
        hud,
        overlay: overlay(session),
    }
}

fn board_drawables(board: &StackBoard, session: &GameSession, out: &mut Vec<Drawable>) {
    let layout = board.layout(&session.config.arena);
    let cell = |x: i32, y: i32, hue: f32, alpha: f32, word: Option<&str>| Drawable {
        category: EntityCategory::Board,
        shape: Shape::Cell { size: layout.cell },
        pos: layout.cell_center(x, y),
        rotation: 0.0,
        color: Hsba::new(hue, 80.0, 90.0, alpha),
        text: word.map(str::to_string),
    };

    for (x, y, kind) in board.settled_cells() {
        out.push(cell(x, y, kind.hue(), 1.0, None));
    }
    if let Some(piece) = &board.current {
        let ghost_y = board.drop_distance() + piece.y;
        for (x, y) in piece.cells_at(piece.x, ghost_y) {
            if y >= 0 {
                out.push(cell(x, y, piece.kind.hue(), 0.25, None));
            }
        }
        let mut labelled = false;
        for (x, y) in piece.cells() {
            if y >= 0 {
                // Word on the first visible cell only
                let word = (!labelled).then(|| piece.kind.word());
                labelled = true;
                out.push(cell(x, y, piece.kind.hue(), 1.0, word));
            }
        }
    }
}

fn overlay(session: &GameSession) -> Option<Overlay> {
    let flavor = &session.config.flavor;
    let heroes = || {
        session
            .config
            .heroes
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let marker = if i == session.hero { ">" } else { " " };
                format!("{} {}: {}", marker, i + 1, h.name)
            })
            .collect::<Vec<_>>()
    };

    match session.phase {
        GamePhase::Playing => None,
        GamePhase::Intro => Some(Overlay {
            title: flavor.title.clone(),
            lines: vec![
                "Press ENTER to choose your hero".to_string(),
                "Press SPACE to start".to_string(),
            ],
        }),
        GamePhase::HeroSelect => {
            let mut lines = heroes();
            lines.push("Press a number to choose, ENTER to start".to_string());
            Some(Overlay {
                title: "Choose your hero".to_string(),
                lines,
            })
        }
        GamePhase::Paused => Some(Overlay {
            title: "PAUSED".to_string(),
            lines: vec![
                "ENTER: resume".to_string(),
                "H: swap hero".to_string(),
                "R: restart".to_string(),
                "M: main menu".to_string(),
            ],
        }),
        GamePhase::HeroSwap => {
            let mut lines = heroes();
            lines.push("ESC: back".to_string());
            Some(Overlay {
                title: "Swap hero".to_string(),
                lines,
            })
        }
        GamePhase::GameOver => Some(Overlay {
            title: "GAME OVER".to_string(),
            lines: vec![
                format!("Final score: {}", session.score),
                "R: restart  M: main menu".to_string(),
            ],
        }),
        GamePhase::Victory => Some(Overlay {
            title: flavor.victory_text.clone(),
            lines: vec![
                format!("Final score: {}", session.score),
                "R: play again  M: main menu".to_string(),
            ],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameKind;

    #[test]
    fn test_intro_snapshot_has_overlay_and_padded_score() {
        let session = GameSession::for_game(GameKind::DataCleaning, 1);
        let snap = capture(&session);
        assert_eq!(snap.phase, GamePhase::Intro);
        assert_eq!(snap.game_id, "data-cleaning");
        assert_eq!(snap.hud.score_text, "00000000");
        assert_eq!(snap.overlay.map(|o| o.title), Some("Bad Data Matrix".to_string()));
    }

    #[test]
    fn test_drawables_are_ordered_by_category() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 7);
        session.start_run();
        let snap = capture(&session);
        assert!(snap.overlay.is_none());
        assert_eq!(snap.count(EntityCategory::Player), 1);
        assert_eq!(snap.count(EntityCategory::Hazard), session.entities.hazards.len());
        let categories: Vec<_> = snap.drawables.iter().map(|d| d.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[test]
    fn test_stacker_snapshot_includes_board() {
        let mut session = GameSession::for_game(GameKind::FeatureEngineering, 3);
        session.start_run();
        let snap = capture(&session);
        assert!(snap.count(EntityCategory::Board) >= 4);
        assert!(snap.hud.next_piece.is_some());
        assert_eq!(snap.hud.lines, Some(0));
    }
}
