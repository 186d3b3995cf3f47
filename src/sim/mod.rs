//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one `tick` per display frame)
//! - Seeded RNG only, carried inside the session
//! - Stable iteration order (creation order within each category)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod progression;
pub mod snapshot;
pub mod spawner;
pub mod stacker;
pub mod state;
pub mod tick;

pub use collision::{CollisionEvent, HitCause};
pub use entity::{
    AreaEffect, EntityId, EntityStore, Hazard, MAX_PARTICLES, Mover, Particle, Pickup, Player,
    Projectile, ProjectileKind, Simulated, SizeClass,
};
pub use snapshot::{Drawable, EntityCategory, Hsba, Hud, Overlay, RenderSnapshot, Shape};
pub use stacker::{PieceKind, StackBoard};
pub use state::{GamePhase, GameSession};
pub use tick::{Intents, TickInput, tick};
