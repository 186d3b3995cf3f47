//! Game session and phase
//!
//! All state that must be persisted for save/restore and determinism lives
//! here, RNG included.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityStore, Player};
use super::progression::level_for_score;
use super::spawner::{self, SpawnContext};
use super::stacker::StackBoard;
use crate::config::{GameConfig, GameKind, HeroProfile};
use crate::hub::CompletionSignal;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen
    Intro,
    /// Choosing a hero before the run
    HeroSelect,
    /// Active gameplay
    Playing,
    Paused,
    /// Choosing a different hero mid-run (from pause)
    HeroSwap,
    /// Run ended in defeat
    GameOver,
    /// Run ended by meeting the game's win condition
    Victory,
}

impl GamePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// One play session of one game (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub kind: GameKind,
    pub config: GameConfig,
    /// Seed the session was created with
    pub seed: u64,
    pub score: u64,
    pub level: u32,
    pub lives: u32,
    pub phase: GamePhase,
    /// Index into `config.heroes`
    pub hero: usize,
    pub entities: EntityStore,
    /// Present only for board games
    pub board: Option<StackBoard>,
    /// Wave size multiplier (1 normally, raised by the pickup)
    pub frenzy: u32,
    /// Next shot fires the area effect
    pub special_armed: bool,
    /// The pickup appears at most once per run
    pub pickup_spawned: bool,
    pub rng: Pcg32,
    /// Ticks since the session was created
    pub tick: u64,
    pub(crate) next_id: EntityId,
    /// Completion signal waiting for the host
    completion: Option<CompletionSignal>,
}

impl GameSession {
    /// Session with explicit tuning; the game comes from `config.kind`
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            kind: config.kind,
            lives: config.player.lives,
            config,
            seed,
            score: 0,
            level: 1,
            phase: GamePhase::Intro,
            hero: 0,
            entities: EntityStore::default(),
            board: None,
            frenzy: 1,
            special_armed: false,
            pickup_spawned: false,
            rng: Pcg32::seed_from_u64(seed),
            tick: 0,
            next_id: 1,
            completion: None,
        }
    }

    /// Session with default tuning for `kind`
    pub fn for_game(kind: GameKind, seed: u64) -> Self {
        Self::new(GameConfig::for_game(kind), seed)
    }

    pub fn game_id(&self) -> &'static str {
        self.kind.game_id()
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// The ID the next spawned entity will get
    pub fn peek_next_id(&self) -> EntityId {
        self.next_id
    }

    pub fn hero_profile(&self) -> Option<&HeroProfile> {
        self.config.hero(self.hero)
    }

    /// Select a hero by index; out-of-range indices are ignored
    pub fn select_hero(&mut self, index: usize) -> bool {
        if index < self.config.heroes.len() {
            self.hero = index;
            true
        } else {
            false
        }
    }

    /// Arena center, where the player (re)spawns
    pub fn player_spawn_point(&self) -> Vec2 {
        Vec2::new(self.config.arena.width / 2.0, self.config.arena.height / 2.0)
    }

    /// Clear everything and begin a fresh run in `Playing`
    pub fn start_run(&mut self) {
        self.entities.clear();
        self.score = 0;
        self.level = 1;
        self.lives = self.config.player.lives;
        self.frenzy = 1;
        self.special_armed = false;
        self.pickup_spawned = false;
        self.completion = None;
        self.board = None;
        self.phase = GamePhase::Playing;

        if self.kind.uses_board() {
            let mut board = StackBoard::new(self.config.stack.cols, self.config.stack.rows, &mut self.rng);
            if !board.spawn_next(&mut self.rng) {
                log::warn!("First piece could not spawn");
            }
            self.board = Some(board);
        } else {
            let spawn = self.player_spawn_point();
            self.entities.player = Some(Player::spawn(spawn, self.config.player.radius));
            self.spawn_wave();
        }

        log::info!(
            "Run started: {} (hero {}, seed {})",
            self.game_id(),
            self.hero,
            self.seed
        );
    }

    /// Drop the run and go back to the title screen
    pub fn return_to_menu(&mut self) {
        self.entities.clear();
        self.board = None;
        self.score = 0;
        self.level = 1;
        self.lives = self.config.player.lives;
        self.frenzy = 1;
        self.special_armed = false;
        self.pickup_spawned = false;
        self.phase = GamePhase::Intro;
    }

    /// Spawn the next wave around the player
    pub fn spawn_wave(&mut self) {
        let avoid = self.entities.player.as_ref().map(|p| p.mover.pos);
        let mut ctx = SpawnContext {
            rng: &mut self.rng,
            config: &self.config,
            next_id: &mut self.next_id,
            avoid,
        };
        let wave = spawner::spawn(&mut ctx, self.level, self.score, self.frenzy);
        self.entities.hazards.extend(wave);
    }

    /// Spawn the special-weapon pickup
    pub fn spawn_pickup(&mut self) {
        let mut ctx = SpawnContext {
            rng: &mut self.rng,
            config: &self.config,
            next_id: &mut self.next_id,
            avoid: None,
        };
        let pickup = spawner::spawn_pickup(&mut ctx);
        log::info!("Pickup {} appeared at {:?}", pickup.id, pickup.mover.pos);
        self.entities.pickups.push(pickup);
        self.pickup_spawned = true;
    }

    /// Add points; score never decreases
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        self.level = level_for_score(self.score, self.config.progression.level_threshold);
    }

    /// Enter `GameOver` or `Victory` and queue the completion signal
    pub fn end_run(&mut self, phase: GamePhase) {
        if self.phase.is_finished() || !phase.is_finished() {
            return;
        }
        self.phase = phase;
        let completed = phase == GamePhase::Victory;
        log::info!(
            "{} finished: {} with score {}",
            self.game_id(),
            if completed { "victory" } else { "game over" },
            self.score
        );
        self.completion = Some(CompletionSignal {
            game_id: self.game_id().to_string(),
            score: self.score,
            completed,
        });
    }

    /// Hand the pending completion signal to the host (at most once)
    pub fn take_completion(&mut self) -> Option<CompletionSignal> {
        self.completion.take()
    }

    /// Check the invariants a restored session must hold
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.kind != self.config.kind {
            return Err(format!(
                "session kind {:?} does not match config kind {:?}",
                self.kind, self.config.kind
            ));
        }
        if self.level < 1 {
            return Err("level must be at least 1".to_string());
        }
        if self.hero >= self.config.heroes.len() {
            return Err(format!("hero index {} out of range", self.hero));
        }
        if self.frenzy == 0 {
            return Err("frenzy multiplier must be at least 1".to_string());
        }
        if self.kind.uses_board() != self.board.is_some() && self.phase != GamePhase::Intro {
            return Err("board presence does not match game kind".to_string());
        }
        if let Some(board) = &self.board {
            board.check()?;
        }
        let max_id = self
            .entities
            .hazards
            .iter()
            .map(|h| h.id)
            .chain(self.entities.projectiles.iter().map(|p| p.id))
            .chain(self.entities.pickups.iter().map(|p| p.id))
            .max();
        if max_id.is_some_and(|id| id >= self.next_id) {
            return Err("entity id at or beyond the id counter".to_string());
        }
        let movers_finite = self.entities.player.iter().all(|p| p.mover.is_finite())
            && self.entities.hazards.iter().all(|h| h.mover.is_finite())
            && self.entities.projectiles.iter().all(|p| p.mover.is_finite());
        if !movers_finite {
            return Err("non-finite entity position".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_intro() {
        let session = GameSession::for_game(GameKind::DataCleaning, 1);
        assert_eq!(session.phase, GamePhase::Intro);
        assert_eq!(session.score, 0);
        assert_eq!(session.level, 1);
        assert_eq!(session.lives, 3);
        assert!(session.entities.hazards.is_empty());
    }

    #[test]
    fn test_start_run_spawns_player_and_wave() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        session.start_run();
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.entities.player.is_some());
        assert_eq!(session.entities.hazards.len(), 8);
        let spawn = session.player_spawn_point();
        let player = session.entities.player.as_ref().unwrap();
        assert_eq!(player.mover.pos, spawn);
        assert!(!player.is_invincible());
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_start_run_for_board_game() {
        let mut session = GameSession::for_game(GameKind::FeatureEngineering, 5);
        session.start_run();
        assert!(session.entities.player.is_none());
        let board = session.board.as_ref().unwrap();
        assert!(board.current.is_some());
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        session.start_run();
        session.add_score(2500);
        session.lives = 1;
        session.frenzy = 3;
        session.start_run();
        assert_eq!(session.score, 0);
        assert_eq!(session.level, 1);
        assert_eq!(session.lives, 3);
        assert_eq!(session.frenzy, 1);
        assert_eq!(session.entities.hazards.len(), 8);
    }

    #[test]
    fn test_add_score_updates_level() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        session.add_score(999);
        assert_eq!(session.level, 1);
        session.add_score(1);
        assert_eq!(session.level, 2);
    }

    #[test]
    fn test_end_run_emits_once() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        session.start_run();
        session.add_score(120);
        session.end_run(GamePhase::GameOver);
        // A second end in the same run is ignored
        session.end_run(GamePhase::Victory);
        assert_eq!(session.phase, GamePhase::GameOver);
        let signal = session.take_completion().unwrap();
        assert_eq!(signal.game_id, "data-cleaning");
        assert_eq!(signal.score, 120);
        assert!(!signal.completed);
        assert!(session.take_completion().is_none());
    }

    #[test]
    fn test_select_hero_ignores_out_of_range() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        assert!(session.select_hero(1));
        assert!(!session.select_hero(9));
        assert_eq!(session.hero, 1);
    }

    #[test]
    fn test_check_invariants_rejects_bad_hero() {
        let mut session = GameSession::for_game(GameKind::DataCleaning, 5);
        session.hero = 42;
        assert!(session.check_invariants().is_err());
    }
}
