//! ML Ops Arcade - simulation core for the workflow mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, waves, game loop)
//! - `renderer`: Render port consuming per-frame snapshots
//! - `platform`: Input port and key-to-intent routing
//! - `persistence`: Save/restore of a running session
//! - `config`: Data-driven tuning and per-game flavor
//! - `hub`: Cross-game completion ledger

pub mod config;
pub mod error;
pub mod hub;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use config::{GameConfig, GameKind};
pub use error::{ConfigError, PersistError};
pub use hub::{CompletionSignal, HubLedger};

use glam::Vec2;

/// Game configuration constants (defaults for `GameConfig`)
pub mod consts {
    /// Default playfield size (pixels)
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;

    /// Player sprite footprint; collision radius is half of this
    pub const PLAYER_SIZE: f32 = 100.0;
    pub const PLAYER_TURN_RATE: f32 = 0.08;
    pub const PLAYER_THRUST: f32 = 0.15;
    /// Reverse thrust is weaker than forward thrust
    pub const PLAYER_REVERSE_FACTOR: f32 = 0.7;
    /// Closer to 1 means less friction
    pub const PLAYER_FRICTION: f32 = 0.99;
    pub const PLAYER_MAX_SPEED: f32 = 6.0;
    /// Frames (2 seconds at 60fps)
    pub const PLAYER_INVINCIBILITY_TICKS: u32 = 120;
    pub const PLAYER_LIVES: u32 = 3;

    /// Collision envelope (half the sprite width, full sprite height)
    pub const ENVELOPE_WIDTH: f32 = 62.0;
    pub const ENVELOPE_HEIGHT: f32 = 164.0;
    pub const ENVELOPE_OFFSET_X: f32 = 31.0;
    pub const ENVELOPE_TILT_DEGREES: f32 = 15.0;
    /// Fraction of a hazard's radius that inflates the envelope
    pub const ENVELOPE_HAZARD_FACTOR: f32 = 0.75;

    pub const BULLET_SPEED: f32 = 8.0;
    pub const BULLET_RADIUS: f32 = 15.0;
    pub const BULLET_TTL: u32 = 80;

    pub const HAZARD_INIT_NUM: u32 = 8;
    /// Radius of the largest hazards
    pub const HAZARD_INIT_RADIUS: f32 = 70.0;
    /// Radius at which the reward peaks
    pub const HAZARD_MIN_RADIUS: f32 = 20.0;
    pub const HAZARD_SPEED_MAX: f32 = 1.2;
    pub const HAZARD_SPLIT_FACTOR: f32 = 0.65;
    pub const HAZARD_MIN_REWARD: u32 = 10;
    pub const HAZARD_MAX_REWARD: u32 = 50;

    /// Extra hazards per this many points
    pub const WAVE_SCORE_STEP: u64 = 300;
    pub const PLACEMENT_ATTEMPTS: u32 = 100;
    pub const FRENZY_MULTIPLIER: u32 = 3;

    pub const PICKUP_SCORE: u64 = 500;
    pub const PICKUP_RADIUS: f32 = 30.0;

    pub const LEVEL_THRESHOLD: u64 = 1000;

    /// Stack board
    pub const STACK_COLS: usize = 10;
    pub const STACK_ROWS: usize = 20;
    pub const FALL_INTERVAL_MS: f64 = 1000.0;
    pub const MIN_FALL_INTERVAL_MS: f64 = 100.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Re-map a value from one range to another (no clamping)
#[inline]
pub fn map_range(value: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> f32 {
    let span = from_hi - from_lo;
    if span == 0.0 {
        return to_lo;
    }
    to_lo + (value - from_lo) / span * (to_hi - to_lo)
}

/// Wrap a position toroidally around a `width` x `height` field.
///
/// A mover reappears on the opposite edge once its whole body has left the
/// field. The far edge is inclusive: `x == width + radius` wraps to `-radius`.
#[inline]
pub fn wrap_toroidal(pos: Vec2, radius: f32, width: f32, height: f32) -> Vec2 {
    let mut out = pos;
    if out.x >= width + radius {
        out.x = -radius;
    } else if out.x < -radius {
        out.x = width + radius;
    }
    if out.y >= height + radius {
        out.y = -radius;
    } else if out.y < -radius {
        out.y = height + radius;
    }
    out
}

/// True if `pos` lies outside the field grown by `margin` on every side
#[inline]
pub fn out_of_bounds(pos: Vec2, margin: f32, width: f32, height: f32) -> bool {
    pos.x < -margin || pos.x > width + margin || pos.y < -margin || pos.y > height + margin
}
