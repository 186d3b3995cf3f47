//! Rendering port
//!
//! The simulation hands out a `RenderSnapshot` every tick; anything that can
//! draw one implements `Renderer`. `LogRenderer` is the headless backend: it
//! tessellates each frame and reports what it would have drawn.

pub mod shapes;

use crate::sim::{GamePhase, RenderSnapshot};

/// Consumer of per-tick snapshots
pub trait Renderer {
    fn draw(&mut self, snapshot: &RenderSnapshot);
}

/// Headless renderer that logs frame summaries
#[derive(Debug, Clone, Default)]
pub struct LogRenderer {
    /// Log a summary every this many frames (0 = only on phase changes)
    pub every: u64,
    pub frames: u64,
    /// Triangles produced for the last frame
    pub triangles: usize,
    last_phase: Option<GamePhase>,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            every,
            ..Default::default()
        }
    }

    pub fn last_phase(&self) -> Option<GamePhase> {
        self.last_phase
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, snapshot: &RenderSnapshot) {
        self.frames += 1;
        self.triangles = snapshot
            .drawables
            .iter()
            .map(|d| shapes::tessellate(d).len() / 3)
            .sum();

        if self.last_phase != Some(snapshot.phase) {
            self.last_phase = Some(snapshot.phase);
            match &snapshot.overlay {
                Some(overlay) => log::info!(
                    "[{}] {:?}: {} {}",
                    snapshot.game_id,
                    snapshot.phase,
                    overlay.title,
                    overlay.lines.join(" / ")
                ),
                None => log::info!("[{}] {:?}", snapshot.game_id, snapshot.phase),
            }
        }

        if self.every > 0 && snapshot.tick % self.every == 0 {
            log::debug!(
                "[{}] tick {} score {} lives {} level {}: {} drawables, {} triangles",
                snapshot.game_id,
                snapshot.tick,
                snapshot.hud.score_text,
                snapshot.hud.lives,
                snapshot.hud.level,
                snapshot.drawables.len(),
                self.triangles
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameKind;
    use crate::sim::{GameSession, TickInput, tick};

    #[test]
    fn test_log_renderer_counts_frames_and_geometry() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 3);
        session.start_run();
        let mut renderer = LogRenderer::new(10);
        for _ in 0..5 {
            let snapshot = tick(&mut session, &TickInput::default());
            renderer.draw(&snapshot);
        }
        assert_eq!(renderer.frames, 5);
        assert!(renderer.triangles > 0);
        assert_eq!(renderer.last_phase(), Some(GamePhase::Playing));
    }

    #[test]
    fn test_intro_frame_has_no_geometry() {
        let mut session = GameSession::for_game(GameKind::FeatureEngineering, 3);
        let mut renderer = LogRenderer::new(0);
        renderer.draw(&tick(&mut session, &TickInput::default()));
        assert_eq!(renderer.triangles, 0);
        assert_eq!(renderer.last_phase(), Some(GamePhase::Intro));
    }
}
