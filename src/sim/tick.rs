//! Fixed-step simulation tick
//!
//! Core game loop. One call advances the session by one display frame and
//! returns what to draw.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{self, CollisionEvent, HitCause};
use super::entity::{AreaEffect, EntityId, Mover, PLAYER_ID, Projectile, ProjectileKind};
use super::progression::{
    fall_interval, hard_drop_reward, hazard_reward, line_clear_reward, soft_drop_reward,
};
use super::snapshot::{RenderSnapshot, capture};
use super::spawner;
use super::stacker::{LockOutcome, SoftDrop};
use super::state::{GamePhase, GameSession};
use crate::config::{GameKind, WinCondition};

/// Abstract game actions, independent of the physical key that produced them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intents {
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub rotate: bool,
    pub shoot: bool,
    pub hard_drop: bool,
    pub pause: bool,
    pub restart: bool,
    pub confirm: bool,
    pub back: bool,
    pub menu: bool,
    pub swap_hero: bool,
}

impl Intents {
    /// -1 for left, 1 for right, 0 for neither or both
    pub fn turn_direction(&self) -> f32 {
        (self.move_right as i32 - self.move_left as i32) as f32
    }

    /// Any piece-moving intent (drives the tractor beam)
    pub fn any_movement(&self) -> bool {
        self.move_left || self.move_right || self.move_down || self.rotate || self.hard_drop
    }

    /// Set every intent that is set in `other`
    pub fn merge(&mut self, other: Intents) {
        self.move_left |= other.move_left;
        self.move_right |= other.move_right;
        self.move_up |= other.move_up;
        self.move_down |= other.move_down;
        self.rotate |= other.rotate;
        self.shoot |= other.shoot;
        self.hard_drop |= other.hard_drop;
        self.pause |= other.pause;
        self.restart |= other.restart;
        self.confirm |= other.confirm;
        self.back |= other.back;
        self.menu |= other.menu;
        self.swap_hero |= other.swap_hero;
    }
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Intents whose key is currently down
    pub held: Intents,
    /// Intents whose key went down since the previous tick
    pub pressed: Intents,
    /// Hero chosen this tick (digit keys), zero-based
    pub hero: Option<usize>,
    /// Host wall clock in milliseconds (only the stack fall step reads it)
    pub now_ms: f64,
}

/// Advance the session by one frame
pub fn tick(session: &mut GameSession, input: &TickInput) -> RenderSnapshot {
    session.tick = session.tick.wrapping_add(1);

    let was_playing = session.phase == GamePhase::Playing;
    apply_phase_input(session, input);

    match session.phase {
        // A tick that changes phase does not also simulate
        GamePhase::Playing if was_playing => {
            match session.kind {
                GameKind::DataCleaning => tick_drifter(session, input),
                GameKind::FeatureEngineering => tick_stacker(session, input),
            }
            finish_tick(session);
        }
        GamePhase::Victory => victory_fireworks(session),
        _ => {}
    }

    capture(session)
}

/// Edge-triggered phase transitions
fn apply_phase_input(session: &mut GameSession, input: &TickInput) {
    let pressed = &input.pressed;
    let from = session.phase;

    match session.phase {
        GamePhase::Intro => {
            if pressed.confirm {
                session.phase = GamePhase::HeroSelect;
            } else if pressed.shoot || pressed.hard_drop {
                // Quick start with the current hero
                session.start_run();
            }
        }
        GamePhase::HeroSelect => {
            if let Some(hero) = input.hero {
                session.select_hero(hero);
            }
            if pressed.confirm {
                session.start_run();
            } else if pressed.back {
                session.phase = GamePhase::Intro;
            }
        }
        GamePhase::Playing => {
            if pressed.pause || pressed.back {
                session.phase = GamePhase::Paused;
            }
        }
        GamePhase::Paused => {
            if pressed.confirm || pressed.pause {
                resume(session);
            } else if pressed.swap_hero {
                session.phase = GamePhase::HeroSwap;
            } else if pressed.restart {
                session.start_run();
            } else if pressed.menu {
                session.return_to_menu();
            }
        }
        GamePhase::HeroSwap => match input.hero {
            Some(hero) if session.select_hero(hero) => resume(session),
            _ => {
                if pressed.back {
                    session.phase = GamePhase::Paused;
                }
            }
        },
        GamePhase::GameOver | GamePhase::Victory => {
            if pressed.restart {
                session.start_run();
            } else if pressed.menu {
                session.return_to_menu();
            }
        }
    }

    if from != session.phase {
        log::info!("Phase {:?} -> {:?}", from, session.phase);
    }
}

fn resume(session: &mut GameSession) {
    session.phase = GamePhase::Playing;
    // Time spent paused must not count toward the next fall step
    if let Some(board) = session.board.as_mut() {
        board.last_fall_ms = None;
    }
}

/// Drifter/shooter frame: input, kinematics, wrap, collisions, cleanup, waves
fn tick_drifter(session: &mut GameSession, input: &TickInput) {
    steer_player(session, input);
    if input.pressed.shoot {
        fire(session);
    }
    integrate_player(session);

    if session.entities.update_all() {
        // The ring replaces every other shot
        session.entities.projectiles.retain(|p| !p.is_standard());
    }

    let arena = session.config.arena;
    if let Some(player) = session.entities.player.as_mut() {
        player.mover.wrap(&arena);
    }
    for hazard in &mut session.entities.hazards {
        hazard.mover.wrap(&arena);
    }

    let events = collision::resolve(session);
    apply_events(session, &events);

    session.entities.remove_expired(&arena);
    finish_area_effects(session);

    if session.phase != GamePhase::Playing {
        return;
    }
    if session.entities.live_hazards() == 0 && !session.entities.area_effect_in_progress() {
        session.spawn_wave();
    }
    if !session.pickup_spawned && session.score >= session.config.special.pickup_score {
        session.spawn_pickup();
    }
}

fn steer_player(session: &mut GameSession, input: &TickInput) {
    let tuning = session.config.player;
    let Some(player) = session.entities.player.as_mut() else {
        return;
    };
    player.turn(input.held.turn_direction(), tuning.turn_rate);
    if input.held.move_up {
        player.thrust(tuning.thrust);
    }
    if input.held.move_down {
        player.thrust(-tuning.thrust * tuning.reverse_factor);
    }
}

fn integrate_player(session: &mut GameSession) {
    let tuning = session.config.player;
    let spawn = session.player_spawn_point();
    let Some(player) = session.entities.player.as_mut() else {
        return;
    };
    player.integrate(tuning.friction, tuning.max_speed);
    if !player.mover.is_finite() || !player.heading.is_finite() {
        log::warn!("Player state went non-finite; respawning");
        player.reset(spawn, tuning.invincibility_ticks);
    }
}

/// Fire a shot from the player's muzzle; the armed special goes first
fn fire(session: &mut GameSession) {
    let Some(player) = session.entities.player.as_ref() else {
        return;
    };
    let muzzle = player.muzzle(session.config.player.muzzle_offset);
    let vel = player.forward() * session.config.projectile.speed;
    let radius = session.config.projectile.radius;
    let id = session.next_entity_id();

    let projectile = if session.special_armed {
        session.special_armed = false;
        session.frenzy = 1;
        let special = session.config.special;
        log::info!("Area effect {} fired", id);
        Projectile {
            id,
            mover: Mover::new(muzzle, vel, radius),
            owner: PLAYER_ID,
            kind: ProjectileKind::AreaEffect(AreaEffect::new(
                special.arm_ticks,
                special.growth,
                session.config.area_effect_max_radius(),
            )),
            label: session.config.flavor.burst_word.clone(),
            spent: false,
        }
    } else {
        let words = &session.config.flavor.projectile_words;
        let label = if words.is_empty() {
            String::new()
        } else {
            words[session.rng.random_range(0..words.len())].clone()
        };
        Projectile {
            id,
            mover: Mover::new(muzzle, vel, radius).with_ttl(session.config.projectile.ttl),
            owner: PLAYER_ID,
            kind: ProjectileKind::Standard,
            label,
            spent: false,
        }
    };
    session.entities.projectiles.push(projectile);
}

/// Score destroyed hazards and add sweep particles
fn apply_events(session: &mut GameSession, events: &[CollisionEvent]) {
    let special = session.config.special;
    for event in events {
        if let CollisionEvent::HazardDestroyed {
            by, pos, hue, reward, ..
        } = event
        {
            session.add_score(*reward as u64);
            if let HitCause::AreaEffect(_) = by {
                emit_burst(session, *pos, *hue, special.sweep_sparks, special.sweep_words);
            }
        }
    }
}

fn emit_burst(session: &mut GameSession, pos: Vec2, hue: f32, sparks: u32, words: u32) {
    let particles = spawner::burst(
        &mut session.rng,
        pos,
        hue,
        sparks,
        words,
        &session.config.flavor.burst_word,
    );
    for particle in particles {
        session.entities.push_particle(particle);
    }
}

/// Area effects at full size clear whatever is left, then retire
fn finish_area_effects(session: &mut GameSession) {
    let finished: Vec<EntityId> = session
        .entities
        .projectiles
        .iter()
        .filter(|p| !p.spent && p.area_effect().is_some_and(AreaEffect::is_complete))
        .map(|p| p.id)
        .collect();
    if finished.is_empty() {
        return;
    }

    let special = session.config.special;
    let remaining: Vec<(Vec2, f32, f32)> = session
        .entities
        .hazards
        .iter()
        .filter(|h| h.is_alive())
        .map(|h| (h.mover.pos, h.hue, h.mover.radius))
        .collect();
    for &(pos, hue, radius) in &remaining {
        let reward = hazard_reward(radius, &session.config.hazards);
        session.add_score(reward as u64);
        emit_burst(session, pos, hue, special.finale_sparks, special.finale_words);
    }
    session.entities.hazards.clear();
    session
        .entities
        .projectiles
        .retain(|p| !finished.contains(&p.id));

    log::info!(
        "Area effect complete; cleared {} remaining hazards",
        remaining.len()
    );
    if session.config.flavor.win == WinCondition::AreaEffectComplete {
        session.end_run(GamePhase::Victory);
    }
}

/// Stack-board frame: moves, drops, timed fall, lock, line clears
fn tick_stacker(session: &mut GameSession, input: &TickInput) {
    let level = session.level;
    let stack = session.config.stack;
    let arena = session.config.arena;
    let Some(board) = session.board.as_mut() else {
        return;
    };

    let mut blocked = false;
    if board.current.is_none() {
        blocked = !board.spawn_next(&mut session.rng);
        board.last_fall_ms = Some(input.now_ms);
    }
    let mut points = 0u64;
    let mut lock: Option<LockOutcome> = None;
    let pressed = &input.pressed;

    if pressed.move_left {
        board.shift(-1);
    }
    if pressed.move_right {
        board.shift(1);
    }
    if pressed.rotate {
        board.rotate();
    }
    if pressed.move_down {
        match board.soft_drop() {
            Some(SoftDrop::Moved) => {
                points += soft_drop_reward(level);
                // A manual step counts as this interval's fall
                board.last_fall_ms = Some(input.now_ms);
            }
            Some(SoftDrop::Locked(outcome)) => lock = Some(outcome),
            None => {}
        }
    }
    if pressed.hard_drop {
        if let Some((rows, outcome)) = board.hard_drop() {
            points += hard_drop_reward(rows, level);
            lock = Some(outcome);
        }
    }
    board.update_beam(input.held.any_movement());

    let interval = fall_interval(level, board.last_clear, &stack);
    if board.fall_due(input.now_ms, interval) {
        if let Some(SoftDrop::Locked(outcome)) = board.soft_drop() {
            lock = Some(outcome);
        }
    }

    let mut topped_out = false;
    let mut cleared_at = Vec::new();
    if let Some(outcome) = &lock {
        points += line_clear_reward(outcome.cleared(), level);
        topped_out = outcome.topped_out;
        let layout = board.layout(&arena);
        let mid = layout.origin.x + layout.cell * board.cols as f32 / 2.0;
        cleared_at = outcome
            .cleared_rows
            .iter()
            .map(|&y| Vec2::new(mid, layout.cell_center(0, y as i32).y))
            .collect();
        if outcome.cleared() > 0 {
            log::debug!("Cleared {} rows at level {}", outcome.cleared(), level);
        }
        if !topped_out {
            blocked |= !board.spawn_next(&mut session.rng);
            board.last_fall_ms = Some(input.now_ms);
        }
    }

    session.add_score(points);
    for pos in cleared_at {
        let hue = session.rng.random_range(0.0f32..360.0);
        emit_burst(session, pos, hue, 8, 1);
    }
    if topped_out || blocked {
        session.end_run(GamePhase::GameOver);
    }
}

/// Shared end of a playing frame: timers, level, lose/win checks
fn finish_tick(session: &mut GameSession) {
    if let Some(player) = session.entities.player.as_mut() {
        player.invincible_ticks = player.invincible_ticks.saturating_sub(1);
    }
    if session.phase != GamePhase::Playing {
        return;
    }
    if session.lives == 0 {
        session.end_run(GamePhase::GameOver);
    } else if let WinCondition::ScoreReached(target) = session.config.flavor.win {
        if session.score >= target {
            session.end_run(GamePhase::Victory);
        }
    }
}

/// Celebration bursts keep going on the victory screen
fn victory_fireworks(session: &mut GameSession) {
    let arena = session.config.arena;
    if session.tick % 30 == 0 {
        let pos = Vec2::new(
            session.rng.random_range(0.1f32..0.9) * arena.width,
            session.rng.random_range(0.1f32..0.6) * arena.height,
        );
        let hue = session.rng.random_range(0.0f32..360.0);
        let sparks = session.config.special.sweep_sparks;
        emit_burst(session, pos, hue, sparks, 0);
    }
    session.entities.update_particles(&arena);
}
